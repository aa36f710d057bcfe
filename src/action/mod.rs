//! Actions: value objects, groups, and name resolution.
//!
//! - [`Action`]: name, label, icon, accelerator, sensitivity, visibility.
//! - [`ActionGroup`]: a named set of actions registered as a unit.
//! - [`ActionGroups`]: ordered groups; the first match wins.

pub mod group;
pub mod value;

pub use group::{ActionGroup, ActionGroups, ActionResolver};
pub use value::{Action, ActionHandle, Presentation};
