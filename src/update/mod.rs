//! Deferred recomputation: the per-tree update scheduler.
//!
//! Marking a node dirty queues at most one pending pass. The host either runs
//! it from its idle loop via [`UiManager::dispatch_idle`](crate::manager::UiManager::dispatch_idle)
//! or forces it with [`UiManager::ensure_update`](crate::manager::UiManager::ensure_update).

pub mod scheduler;

pub use scheduler::{IdleHook, UpdateScheduler, UpdateToken};
