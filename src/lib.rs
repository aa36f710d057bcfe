//! # gilt-uimanager
//!
//! A toolkit-independent UI merge engine: declarative menu and toolbar
//! fragments are merged into one ordered tree, addressable by path, and kept
//! in sync with host-owned visual proxies.
//!
//! Fragments can be added and removed incrementally by merge id. Mutations
//! only mark nodes dirty; a coalesced update pass resolves actions, creates,
//! reuses or destroys proxies through the host's factory, and computes smart
//! separator visibility.
//!
//! ## Core Systems
//!
//! - **[`markup`]**: Logos tokenizer and reader for the fragment markup
//! - **[`tree`]**: Slotmap-backed merge tree: reference stacks, dirty propagation, paths, serialization
//! - **[`update`]**: Coalescing update scheduler with idle-hook dispatch
//! - **[`action`]**: Action values, action groups, and the ordered resolver
//! - **[`proxy`]**: Proxy factory and accelerator installer contracts
//! - **[`manager`]**: `UiManager`: fragment merging, materialization, queries
//! - **[`testing`]**: Headless doubles: `MockFactory` and `MockAccels`

// Foundation
pub mod action;
pub mod markup;

// Core systems
pub mod tree;
pub mod update;

// Host contracts
pub mod proxy;

// Engine
pub mod manager;

// Test doubles
pub mod testing;

pub use manager::{ItemKind, UiError, UiManager, UiManagerConfig};
