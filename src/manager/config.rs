//! UiManagerConfig: construction-time settings for a [`UiManager`](super::UiManager).

use crate::tree::arena::DEFAULT_ROOT_ALIAS;

/// Configuration for a UI manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiManagerConfig {
    /// Show a detach affordance at the top of synthesized menus.
    /// Never applied inside popups.
    pub add_tearoffs: bool,
    /// Leading path segment that names the root. `None` disables stripping.
    pub root_alias: Option<String>,
}

impl Default for UiManagerConfig {
    fn default() -> Self {
        Self {
            add_tearoffs: false,
            root_alias: Some(DEFAULT_ROOT_ALIAS.to_owned()),
        }
    }
}

impl UiManagerConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable tearoffs (builder).
    pub fn with_tearoffs(mut self, add_tearoffs: bool) -> Self {
        self.add_tearoffs = add_tearoffs;
        self
    }

    /// Set the root alias (builder).
    pub fn with_root_alias(mut self, alias: impl Into<String>) -> Self {
        self.root_alias = Some(alias.into());
        self
    }

    /// Turn off root alias stripping (builder).
    pub fn without_root_alias(mut self) -> Self {
        self.root_alias = None;
        self
    }
}
