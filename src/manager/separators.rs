//! Smart separator visibility.
//!
//! After a container's children are materialized, one walk over its proxies
//! decides which separators show. Leading and trailing separators hide, a run
//! of separators collapses to its last member, and a separator only shows when
//! visible content comes after it.

use std::collections::HashMap;

use crate::proxy::{ProxyFactory, ProxyId};

/// How a separator proxy decides its visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorMode {
    /// Always shown. Used for expanding toolbar gaps.
    Visible,
    /// Never shown. Used for placeholder markers.
    Hidden,
    /// Shown only between visible content.
    Smart,
}

/// What the manager created a proxy as, for proxies the smart pass treats
/// specially. Plain items are not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProxyRole {
    Separator(SeparatorMode),
    Tearoff,
    Filler,
}

/// Outcome of one smart pass over a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SmartPass {
    /// No visible content besides separators, tearoff and filler.
    pub empty: bool,
    /// The synthesized "empty" filler, if the container has one.
    pub filler: Option<ProxyId>,
}

/// Run the smart separator walk over the children of `container`.
pub(crate) fn update_smart_separators<F: ProxyFactory + ?Sized>(
    factory: &mut F,
    roles: &HashMap<ProxyId, ProxyRole>,
    container: ProxyId,
) -> SmartPass {
    let mut pending: Option<ProxyId> = None;
    let mut after_content = false;
    let mut empty = true;
    let mut filler = None;

    for child in factory.children(container) {
        match roles.get(&child) {
            Some(ProxyRole::Filler) => filler = Some(child),
            Some(ProxyRole::Separator(SeparatorMode::Visible)) => {
                factory.set_visible(child, true);
                pending = None;
                after_content = false;
            }
            Some(ProxyRole::Separator(SeparatorMode::Hidden)) => {
                factory.set_visible(child, false);
            }
            Some(ProxyRole::Separator(SeparatorMode::Smart)) => {
                factory.set_visible(child, false);
                if after_content {
                    pending = Some(child);
                }
            }
            Some(ProxyRole::Tearoff) => {}
            None if factory.is_visible(child) => {
                if let Some(separator) = pending.take() {
                    factory.set_visible(separator, true);
                }
                after_content = true;
                empty = false;
            }
            None => {}
        }
    }

    SmartPass { empty, filler }
}
