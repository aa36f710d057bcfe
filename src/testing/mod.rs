//! Headless test doubles: an in-memory proxy factory and a recording
//! accelerator installer.
//!
//! Plug a [`MockFactory`] and [`MockAccels`] into a
//! [`UiManager`](crate::manager::UiManager) to drive merges without a
//! toolkit, then assert on [`MockFactory::outline`] for snapshot-style checks.

pub mod accels;
pub mod factory;

pub use accels::{AccelCall, MockAccels};
pub use factory::{MockFactory, MockProxy};
