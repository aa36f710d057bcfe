//! Recording accelerator installer.

use crate::action::Action;
use crate::proxy::AcceleratorInstaller;

/// One call received by a [`MockAccels`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccelCall {
    Connect(String),
    Disconnect(String),
}

/// Headless [`AcceleratorInstaller`] that records every call in order.
#[derive(Debug, Default)]
pub struct MockAccels {
    pub calls: Vec<AccelCall>,
}

impl MockAccels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` is connected after replaying all calls.
    pub fn is_connected(&self, path: &str) -> bool {
        let mut connected = false;
        for call in &self.calls {
            match call {
                AccelCall::Connect(p) if p == path => connected = true,
                AccelCall::Disconnect(p) if p == path => connected = false,
                _ => {}
            }
        }
        connected
    }
}

impl AcceleratorInstaller for MockAccels {
    fn connect(&mut self, _action: &Action, path: &str) {
        self.calls.push(AccelCall::Connect(path.to_owned()));
    }

    fn disconnect(&mut self, _action: &Action, path: &str) {
        self.calls.push(AccelCall::Disconnect(path.to_owned()));
    }
}
