//! Action groups and the ordered resolver over them.

use std::rc::Rc;

use super::value::{Action, ActionHandle};

/// Looks up actions by name for the materializer.
pub trait ActionResolver {
    /// First action called `name`, if any is registered.
    fn resolve(&self, name: &str) -> Option<ActionHandle>;
}

// ---------------------------------------------------------------------------
// ActionGroup
// ---------------------------------------------------------------------------

/// A named set of actions, registered with a manager as a unit.
#[derive(Debug, Clone, Default)]
pub struct ActionGroup {
    name: String,
    actions: Vec<ActionHandle>,
}

impl ActionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Add an action, replacing any action of the same name (builder).
    pub fn with_action(mut self, action: Action) -> Self {
        self.add(action);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an action, replacing any action of the same name.
    ///
    /// The stored action is stamped with this group's name.
    pub fn add(&mut self, mut action: Action) -> ActionHandle {
        action.set_group(&self.name);
        let handle = Rc::new(action);
        match self.actions.iter_mut().find(|a| a.name() == handle.name()) {
            Some(slot) => *slot = handle.clone(),
            None => self.actions.push(handle.clone()),
        }
        handle
    }

    /// Remove the action called `name`.
    pub fn remove(&mut self, name: &str) -> Option<ActionHandle> {
        let index = self.actions.iter().position(|a| a.name() == name)?;
        Some(self.actions.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&ActionHandle> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionHandle> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionResolver for ActionGroup {
    fn resolve(&self, name: &str) -> Option<ActionHandle> {
        self.get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// ActionGroups
// ---------------------------------------------------------------------------

/// Ordered list of groups; earlier groups shadow later ones.
#[derive(Debug, Clone, Default)]
pub struct ActionGroups {
    groups: Vec<ActionGroup>,
}

impl ActionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `group` at `pos` (clamped to the end).
    ///
    /// Returns the group back if one with the same name is already present.
    pub fn insert(&mut self, group: ActionGroup, pos: usize) -> Result<(), ActionGroup> {
        if self.get(group.name()).is_some() {
            return Err(group);
        }
        let pos = pos.min(self.groups.len());
        self.groups.insert(pos, group);
        Ok(())
    }

    /// Remove the group called `name`.
    pub fn remove(&mut self, name: &str) -> Option<ActionGroup> {
        let index = self.groups.iter().position(|g| g.name() == name)?;
        Some(self.groups.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&ActionGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ActionGroup> {
        self.groups.iter_mut().find(|g| g.name() == name)
    }

    pub fn as_slice(&self) -> &[ActionGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl ActionResolver for ActionGroups {
    fn resolve(&self, name: &str) -> Option<ActionHandle> {
        self.groups.iter().find_map(|g| g.resolve(name))
    }
}
