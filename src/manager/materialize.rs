//! Update pass: bring host proxies in line with the merge tree.
//!
//! Nodes are visited depth first. A dirty, referenced node is materialized
//! before its children; after the children return, menu-like containers get
//! their smart separator pass, and nodes left without references or children
//! are swept.

use std::rc::Rc;

use super::separators::{update_smart_separators, ProxyRole, SeparatorMode};
use super::UiManager;
use crate::action::{ActionHandle, ActionResolver};
use crate::proxy::{AcceleratorInstaller, ProxyFactory, ProxyId, ProxyKind, ProxyRequest};
use crate::tree::{NodeData, NodeId, NodeKind};

/// Whether a node of `kind` bound to `action` holds an accelerator.
fn uses_accel(kind: NodeKind, action: &ActionHandle) -> bool {
    match kind {
        NodeKind::Accelerator => true,
        NodeKind::MenuItem => action.accel().is_some(),
        _ => false,
    }
}

fn same_action(a: Option<&ActionHandle>, b: Option<&ActionHandle>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl<F: ProxyFactory, A: AcceleratorInstaller> UiManager<F, A> {
    /// Run one full pass from the root and count it.
    pub(super) fn run_update_pass(&mut self) {
        let root = self.tree.root();
        self.update_node(root);
        let pass = self.tree.scheduler_mut().record_pass();
        tracing::debug!(pass, nodes = self.tree.len(), "update pass finished");
    }

    fn update_node(&mut self, id: NodeId) {
        let Some(data) = self.tree.get(id) else {
            return;
        };
        let dirty = data.dirty;
        let kind = data.kind();

        if dirty && !data.references.is_empty() {
            self.materialize(id);
        }

        for child in self.tree.children(id).to_vec() {
            self.update_node(child);
        }

        if dirty {
            if matches!(kind, NodeKind::Menu | NodeKind::Toolbar | NodeKind::Popup) {
                self.finish_container(id);
            }
            if let Some(data) = self.tree.get_mut(id) {
                data.dirty = false;
            }
        }

        let dead = self
            .tree
            .get(id)
            .is_some_and(|data| data.references.is_empty());
        if dead && id != self.tree.root() && self.tree.children(id).is_empty() {
            self.release(id);
            self.tree.remove(id);
        }
    }

    fn materialize(&mut self, id: NodeId) {
        let Some(data) = self.tree.get(id) else {
            return;
        };
        let kind = data.kind();
        let action_name = data.bound_action_name().map(str::to_owned);
        let action = action_name.as_deref().and_then(|name| self.groups.resolve(name));
        tracing::trace!(
            node = %self.tree.path_of(id),
            ?kind,
            action = ?action_name,
            "materializing"
        );

        match (kind, action) {
            (NodeKind::Root, _) => {}
            (NodeKind::Undecided, _) => {
                tracing::warn!(node = %self.tree.path_of(id), "node kind was never declared");
            }
            (NodeKind::MenuBar | NodeKind::Toolbar | NodeKind::Popup, action) => {
                self.materialize_toplevel(id, kind, action);
            }
            (NodeKind::MenuPlaceholder | NodeKind::ToolbarPlaceholder, _) => {
                self.materialize_placeholder(id, kind);
            }
            (NodeKind::Separator, _) => self.materialize_separator(id),
            (NodeKind::Menu, Some(action)) => self.materialize_menu(id, action),
            (NodeKind::MenuItem | NodeKind::ToolItem, Some(action)) => {
                self.materialize_item(id, kind, action);
            }
            (NodeKind::Accelerator, Some(action)) => self.materialize_accelerator(id, action),
            (_, None) => {
                tracing::warn!(
                    node = %self.tree.path_of(id),
                    action = ?action_name,
                    "action not found, node left unmaterialized"
                );
            }
        }
    }

    // ── Per-kind materialization ─────────────────────────────────────

    fn materialize_toplevel(&mut self, id: NodeId, kind: NodeKind, action: Option<ActionHandle>) {
        if self.tree.get(id).is_some_and(|d| d.proxy.is_some()) {
            return;
        }
        let proxy_kind = match kind {
            NodeKind::MenuBar => ProxyKind::MenuBar,
            NodeKind::Toolbar => ProxyKind::Toolbar,
            _ => ProxyKind::Popup,
        };
        let proxy = self
            .factory
            .create(&ProxyRequest::new(proxy_kind).with_action(action.clone()));
        if let Some(data) = self.tree.get_mut(id) {
            data.proxy = Some(proxy);
            data.action = action;
        }
    }

    fn materialize_item(&mut self, id: NodeId, kind: NodeKind, action: ActionHandle) {
        let Some(data) = self.tree.get(id) else {
            return;
        };
        let presentation = action.presentation();
        let old_proxy = data.proxy;
        let old_action = data.action.clone();
        let reusable = data.presentation == Some(presentation);
        let always_show_image = data.always_show_image;

        let proxy = match old_proxy {
            Some(proxy) if reusable => {
                if !same_action(old_action.as_ref(), Some(&action)) {
                    self.factory.set_action(proxy, Some(&action));
                }
                proxy
            }
            _ => {
                if self.insertion_point(id, &[]).is_none() {
                    tracing::trace!(node = %self.tree.path_of(id), "no container yet");
                    return;
                }
                if let Some(stale) = old_proxy {
                    self.destroy_proxy(stale);
                }
                let proxy_kind = if kind == NodeKind::MenuItem {
                    ProxyKind::MenuItem
                } else {
                    ProxyKind::ToolItem
                };
                let request = ProxyRequest::new(proxy_kind)
                    .with_action(Some(action.clone()))
                    .always_show_image(always_show_image)
                    .show_accel(self.shows_accels(id));
                self.factory.create(&request)
            }
        };

        self.rebind_accel(kind, old_action.as_ref(), Some(&action));
        self.place(id, proxy);
        self.factory.set_visible(proxy, action.is_visible());
        if let Some(data) = self.tree.get_mut(id) {
            data.proxy = Some(proxy);
            data.action = Some(action);
            data.presentation = Some(presentation);
        }
    }

    fn materialize_menu(&mut self, id: NodeId, action: ActionHandle) {
        let Some(data) = self.tree.get(id) else {
            return;
        };
        let presentation = action.presentation();
        let old_proxy = data.proxy;
        let old_action = data.action.clone();
        let reusable = data.presentation == Some(presentation);
        let in_popup = self.enclosing_popup(id).is_some();

        let item = match old_proxy {
            Some(item) if reusable => {
                if !same_action(old_action.as_ref(), Some(&action)) {
                    self.factory.set_action(item, Some(&action));
                }
                if let Some(menu) = self.factory.submenu(item) {
                    self.refresh_tearoff(menu, in_popup);
                }
                item
            }
            _ => {
                if self.insertion_point(id, &[]).is_none() {
                    tracing::trace!(node = %self.tree.path_of(id), "no container yet");
                    return;
                }
                let request = ProxyRequest::new(ProxyKind::MenuItem)
                    .with_action(Some(action.clone()))
                    .show_accel(self.shows_accels(id));
                let item = self.factory.create(&request);
                let provided = action.is_providing_menu() && self.factory.submenu(item).is_some();
                let kept = old_proxy.and_then(|old| self.factory.submenu(old));
                match (provided, kept) {
                    (true, _) => {
                        // The old submenu goes away with the old item, so
                        // everything below has to be built again.
                        if old_proxy.is_some() {
                            self.forget_descendants(id);
                        }
                    }
                    (false, Some(menu)) => self.factory.attach_submenu(item, menu),
                    (false, None) => {
                        let menu = self.synthesize_menu(in_popup);
                        self.factory.attach_submenu(item, menu);
                    }
                }
                if let Some(stale) = old_proxy {
                    self.destroy_proxy(stale);
                }
                item
            }
        };

        self.place(id, item);
        self.factory.set_visible(item, action.is_visible());
        if let Some(data) = self.tree.get_mut(id) {
            data.proxy = Some(item);
            data.action = Some(action);
            data.presentation = Some(presentation);
        }
    }

    fn materialize_separator(&mut self, id: NodeId) {
        let Some(data) = self.tree.get(id) else {
            return;
        };
        let in_toolbar = self.in_toolbar(id);
        let expand = data.expand && in_toolbar;
        let mode = if expand {
            SeparatorMode::Visible
        } else {
            SeparatorMode::Smart
        };
        let role = ProxyRole::Separator(mode);
        let old_proxy = data.proxy;

        let proxy = match old_proxy {
            Some(proxy) if self.roles.get(&proxy) == Some(&role) => proxy,
            _ => {
                if self.insertion_point(id, &[]).is_none() {
                    return;
                }
                if let Some(stale) = old_proxy {
                    self.destroy_proxy(stale);
                }
                let kind = if in_toolbar {
                    ProxyKind::ToolSeparator
                } else {
                    ProxyKind::Separator
                };
                let proxy = self.factory.create(&ProxyRequest::new(kind).expand(expand));
                self.roles.insert(proxy, role);
                proxy
            }
        };

        self.place(id, proxy);
        if let Some(data) = self.tree.get_mut(id) {
            data.proxy = Some(proxy);
        }
    }

    /// Placeholders materialize as a pair of hidden markers in the enclosing
    /// container. Their children are inserted between the two.
    fn materialize_placeholder(&mut self, id: NodeId, kind: NodeKind) {
        let Some(data) = self.tree.get(id) else {
            return;
        };
        let (top, bottom) = (data.proxy, data.secondary_proxy);
        let Some(container) = self.tree.parent(id).and_then(|p| self.container_of(p)) else {
            return;
        };

        if let (Some(top), Some(bottom)) = (top, bottom) {
            let children = self.factory.children(container);
            let top_index = children.iter().position(|&c| c == top);
            let bottom_index = children.iter().position(|&c| c == bottom);
            if let (Some(t), Some(b)) = (top_index, bottom_index) {
                if t < b {
                    self.place_block(id, &children[t..=b]);
                    return;
                }
            }
        }

        for stale in [top, bottom].into_iter().flatten() {
            self.destroy_proxy(stale);
        }
        let Some((container, index)) = self.insertion_point(id, &[]) else {
            return;
        };
        let proxy_kind = if kind == NodeKind::ToolbarPlaceholder {
            ProxyKind::ToolSeparator
        } else {
            ProxyKind::Separator
        };
        let mut markers = [None, None];
        for (offset, slot) in markers.iter_mut().enumerate() {
            let marker = self.factory.create(&ProxyRequest::new(proxy_kind));
            self.roles
                .insert(marker, ProxyRole::Separator(SeparatorMode::Hidden));
            self.factory.set_visible(marker, false);
            self.factory.insert_at(container, marker, index + offset);
            *slot = Some(marker);
        }
        if let Some(data) = self.tree.get_mut(id) {
            data.proxy = markers[0];
            data.secondary_proxy = markers[1];
        }
    }

    fn materialize_accelerator(&mut self, id: NodeId, action: ActionHandle) {
        let old_action = self.tree.get(id).and_then(|d| d.action.clone());
        self.rebind_accel(NodeKind::Accelerator, old_action.as_ref(), Some(&action));
        if let Some(data) = self.tree.get_mut(id) {
            data.action = Some(action);
        }
    }

    // ── After children ───────────────────────────────────────────────

    /// Smart separators, the empty filler, and hide-if-empty.
    fn finish_container(&mut self, id: NodeId) {
        let Some(container) = self.container_of(id) else {
            return;
        };
        let pass = update_smart_separators(&mut self.factory, &self.roles, container);
        if let Some(filler) = pass.filler {
            self.factory.set_visible(filler, pass.empty);
        }

        let Some(data) = self.tree.get(id) else {
            return;
        };
        if data.kind() != NodeKind::Menu {
            return;
        }
        let (Some(item), Some(action)) = (data.proxy, data.action.as_ref()) else {
            return;
        };
        let visible = action.is_visible() && !(pass.empty && action.is_hide_if_empty());
        self.factory.set_visible(item, visible);
    }

    // ── Placement ────────────────────────────────────────────────────

    /// Container that children of `id` go into.
    fn container_of(&self, id: NodeId) -> Option<ProxyId> {
        let data = self.tree.get(id)?;
        match data.kind() {
            NodeKind::MenuBar | NodeKind::Toolbar | NodeKind::Popup => data.proxy,
            NodeKind::Menu => self.factory.submenu(data.proxy?),
            NodeKind::MenuPlaceholder | NodeKind::ToolbarPlaceholder => {
                self.factory.parent(data.proxy?)
            }
            _ => None,
        }
    }

    /// Where the proxy of `id` belongs: after the nearest previous sibling
    /// that has a proxy in the container, else at the start of the parent's
    /// slot. Proxies in `exclude` are left out of the index count.
    fn insertion_point(&self, id: NodeId, exclude: &[ProxyId]) -> Option<(ProxyId, usize)> {
        let parent = self.tree.parent(id)?;
        let container = self.container_of(parent)?;
        let children: Vec<ProxyId> = self
            .factory
            .children(container)
            .into_iter()
            .filter(|c| !exclude.contains(c))
            .collect();

        let siblings = self.tree.children(parent);
        let position = siblings.iter().position(|&s| s == id)?;
        let anchor = siblings[..position].iter().rev().find_map(|&sibling| {
            let data = self.tree.get(sibling)?;
            let proxy = if data.kind().is_placeholder() {
                data.secondary_proxy
            } else {
                data.proxy
            };
            proxy.filter(|p| children.contains(p))
        });

        let index = match anchor {
            Some(anchor) => children.iter().position(|&c| c == anchor)? + 1,
            None => self.first_index(parent, &children)?,
        };
        Some((container, index))
    }

    /// Index of the first child slot of `parent` within its container.
    fn first_index(&self, parent: NodeId, children: &[ProxyId]) -> Option<usize> {
        let data = self.tree.get(parent)?;
        if data.kind().is_placeholder() {
            let top = data.proxy?;
            return children.iter().position(|&c| c == top).map(|i| i + 1);
        }
        let tearoff = children
            .first()
            .is_some_and(|c| self.roles.get(c) == Some(&ProxyRole::Tearoff));
        Some(usize::from(tearoff))
    }

    /// Move `proxy` to where `id` belongs, if it is not there already.
    fn place(&mut self, id: NodeId, proxy: ProxyId) -> bool {
        let Some((container, index)) = self.insertion_point(id, &[proxy]) else {
            return false;
        };
        let in_place = self.factory.parent(proxy) == Some(container)
            && self.factory.index_of(container, proxy) == Some(index);
        if !in_place {
            self.factory.insert_at(container, proxy, index);
        }
        true
    }

    /// Move a contiguous run of proxies, such as a placeholder's markers and
    /// everything between them, to where `id` belongs.
    fn place_block(&mut self, id: NodeId, block: &[ProxyId]) {
        let Some((container, index)) = self.insertion_point(id, block) else {
            return;
        };
        let mut wanted: Vec<ProxyId> = self
            .factory
            .children(container)
            .into_iter()
            .filter(|c| !block.contains(c))
            .collect();
        let index = index.min(wanted.len());
        wanted.splice(index..index, block.iter().copied());
        // Fixing positions front to back never disturbs the settled prefix.
        for (position, &proxy) in wanted.iter().enumerate() {
            if self.factory.index_of(container, proxy) != Some(position) {
                self.factory.insert_at(container, proxy, position);
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn enclosing_popup(&self, id: NodeId) -> Option<&NodeData> {
        self.tree
            .ancestors(id)
            .into_iter()
            .filter_map(|a| self.tree.get(a))
            .find(|d| d.kind() == NodeKind::Popup)
    }

    /// Items show accelerators except inside popups that did not ask for them.
    fn shows_accels(&self, id: NodeId) -> bool {
        self.enclosing_popup(id)
            .is_none_or(|popup| popup.popup_accels)
    }

    /// Whether the nearest non-placeholder ancestor is a toolbar.
    fn in_toolbar(&self, id: NodeId) -> bool {
        self.tree
            .ancestors(id)
            .into_iter()
            .filter_map(|a| self.tree.get(a))
            .find(|d| !d.kind().is_placeholder())
            .is_some_and(|d| d.kind().is_toolbar_shell())
    }

    /// An empty submenu with a tearoff and the "empty" filler.
    fn synthesize_menu(&mut self, in_popup: bool) -> ProxyId {
        let menu = self.factory.create(&ProxyRequest::new(ProxyKind::Menu));
        let tearoff = self.factory.create(&ProxyRequest::new(ProxyKind::Tearoff));
        self.roles.insert(tearoff, ProxyRole::Tearoff);
        self.factory.insert_at(menu, tearoff, 0);
        self.factory
            .set_visible(tearoff, self.config.add_tearoffs && !in_popup);
        let filler = self.factory.create(&ProxyRequest::new(ProxyKind::Filler));
        self.roles.insert(filler, ProxyRole::Filler);
        self.factory.insert_at(menu, filler, 1);
        menu
    }

    fn refresh_tearoff(&mut self, menu: ProxyId, in_popup: bool) {
        let visible = self.config.add_tearoffs && !in_popup;
        for child in self.factory.children(menu) {
            if self.roles.get(&child) == Some(&ProxyRole::Tearoff) {
                self.factory.set_visible(child, visible);
            }
        }
    }

    /// Swap the accelerator held for `kind` from `old` to `new`.
    fn rebind_accel(
        &mut self,
        kind: NodeKind,
        old: Option<&ActionHandle>,
        new: Option<&ActionHandle>,
    ) {
        if same_action(old, new) {
            return;
        }
        if let Some(old) = old.filter(|a| uses_accel(kind, a)) {
            self.accels.disconnect(old);
        }
        if let Some(new) = new.filter(|a| uses_accel(kind, a)) {
            self.accels.connect(new);
        }
    }

    /// Destroy `proxy` and drop the roles of everything inside it.
    fn destroy_proxy(&mut self, proxy: ProxyId) {
        self.forget_roles(proxy);
        self.factory.destroy(proxy);
    }

    fn forget_roles(&mut self, proxy: ProxyId) {
        self.roles.remove(&proxy);
        for child in self.factory.children(proxy) {
            self.forget_roles(child);
        }
        if let Some(menu) = self.factory.submenu(proxy) {
            self.forget_roles(menu);
        }
    }

    /// Release the proxies and accelerators held by `id`.
    fn release(&mut self, id: NodeId) {
        tracing::trace!(node = %self.tree.path_of(id), "sweeping node");
        let Some(data) = self.tree.get_mut(id) else {
            return;
        };
        let kind = data.kind();
        let proxies = [data.proxy.take(), data.secondary_proxy.take()];
        let action = data.action.take();
        data.presentation = None;
        self.rebind_accel(kind, action.as_ref(), None);
        for proxy in proxies.into_iter().flatten() {
            self.destroy_proxy(proxy);
        }
    }

    /// Release everything below `id` and mark it for rebuilding.
    fn forget_descendants(&mut self, id: NodeId) {
        for descendant in self.tree.walk_post_order(id) {
            if descendant == id {
                continue;
            }
            self.release(descendant);
            if let Some(data) = self.tree.get_mut(descendant) {
                data.dirty = true;
            }
        }
    }
}
