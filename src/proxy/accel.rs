//! Reference-counted accelerator installation.

use std::collections::HashMap;

use super::AcceleratorInstaller;
use crate::action::Action;

/// Wraps an [`AcceleratorInstaller`] so that N connects of one path need N
/// disconnects before the binding goes away.
#[derive(Debug)]
pub struct AccelRefs<I> {
    installer: I,
    counts: HashMap<String, usize>,
}

impl<I: AcceleratorInstaller> AccelRefs<I> {
    pub fn new(installer: I) -> Self {
        Self {
            installer,
            counts: HashMap::new(),
        }
    }

    pub fn connect(&mut self, action: &Action) {
        let path = action.accel_path();
        if action.accel().is_none() {
            tracing::warn!(
                action = action.name(),
                %path,
                "accelerator requested for action without a key"
            );
        }
        let count = self.counts.entry(path.clone()).or_insert(0);
        if *count == 0 {
            self.installer.connect(action, &path);
        }
        *count += 1;
    }

    /// Release one use of `action`'s path. Extra releases are ignored.
    pub fn disconnect(&mut self, action: &Action) {
        let path = action.accel_path();
        match self.counts.get_mut(&path) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.counts.remove(&path);
                self.installer.disconnect(action, &path);
            }
            None => {
                tracing::warn!(
                    action = action.name(),
                    %path,
                    "accelerator disconnected more often than connected"
                );
            }
        }
    }

    /// Current use count of `path`.
    pub fn count(&self, path: &str) -> usize {
        self.counts.get(path).copied().unwrap_or(0)
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    pub fn installer_mut(&mut self) -> &mut I {
        &mut self.installer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionGroup;
    use tracing_test::traced_test;

    #[derive(Debug, Default)]
    struct Calls {
        log: Vec<String>,
    }

    impl AcceleratorInstaller for Calls {
        fn connect(&mut self, _action: &Action, path: &str) {
            self.log.push(format!("+{path}"));
        }
        fn disconnect(&mut self, _action: &Action, path: &str) {
            self.log.push(format!("-{path}"));
        }
    }

    fn quit() -> Action {
        let mut group = ActionGroup::new("app");
        let handle = group.add(Action::new("Quit").with_accel("<Control>q"));
        (*handle).clone()
    }

    #[test]
    fn n_connects_need_n_disconnects() {
        let action = quit();
        let mut refs = AccelRefs::new(Calls::default());
        refs.connect(&action);
        refs.connect(&action);
        assert_eq!(refs.count("<Actions>/app/Quit"), 2);
        assert_eq!(refs.installer().log, vec!["+<Actions>/app/Quit"]);

        refs.disconnect(&action);
        assert_eq!(refs.installer().log.len(), 1);
        refs.disconnect(&action);
        assert_eq!(
            refs.installer().log,
            vec!["+<Actions>/app/Quit", "-<Actions>/app/Quit"]
        );
        assert_eq!(refs.count("<Actions>/app/Quit"), 0);
    }

    #[traced_test]
    #[test]
    fn underflow_is_clamped() {
        let action = quit();
        let mut refs = AccelRefs::new(Calls::default());
        refs.disconnect(&action);
        assert!(refs.installer().log.is_empty());
        assert_eq!(refs.count("<Actions>/app/Quit"), 0);
        assert!(logs_contain("disconnected more often than connected"));

        refs.connect(&action);
        assert_eq!(refs.installer().log, vec!["+<Actions>/app/Quit"]);
    }

    #[traced_test]
    #[test]
    fn missing_key_is_logged_but_connected() {
        let mut group = ActionGroup::new("app");
        let action = group.add(Action::new("About"));
        let mut refs = AccelRefs::new(Calls::default());
        refs.connect(&action);
        assert!(logs_contain("without a key"));
        assert_eq!(refs.installer_mut().log.len(), 1);
    }
}
