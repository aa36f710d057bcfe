//! In-memory proxy factory.
//!
//! [`MockFactory`] keeps a plain proxy tree and renders the visible part of it
//! as indented text with [`MockFactory::outline`], so tests can assert on what
//! a user would see without a toolkit.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::action::{ActionHandle, Presentation};
use crate::proxy::{ProxyFactory, ProxyId, ProxyKind, ProxyRequest};

const INDENT: &str = "  ";

/// One proxy held by a [`MockFactory`].
#[derive(Debug, Clone)]
pub struct MockProxy {
    pub kind: ProxyKind,
    pub action: Option<ActionHandle>,
    pub visible: bool,
    pub show_accel: bool,
    pub always_show_image: bool,
    pub expand: bool,
    pub parent: Option<ProxyId>,
    pub children: Vec<ProxyId>,
    pub submenu: Option<ProxyId>,
    /// Item this proxy hangs off, when it is a submenu.
    pub attached_to: Option<ProxyId>,
}

impl MockProxy {
    /// Text shown for this proxy in an outline.
    pub fn label(&self) -> String {
        let text = match self.kind {
            ProxyKind::MenuBar => "menubar".to_owned(),
            ProxyKind::Toolbar => "toolbar".to_owned(),
            ProxyKind::Popup => "popup".to_owned(),
            ProxyKind::Menu => "menu".to_owned(),
            ProxyKind::Separator => "---".to_owned(),
            ProxyKind::ToolSeparator if self.expand => "<->".to_owned(),
            ProxyKind::ToolSeparator => "|".to_owned(),
            ProxyKind::Tearoff => "- - -".to_owned(),
            ProxyKind::Filler => "(empty)".to_owned(),
            ProxyKind::MenuItem | ProxyKind::ToolItem => self
                .action
                .as_ref()
                .map_or_else(|| "?".to_owned(), |a| a.label().to_owned()),
        };
        let Some(action) = &self.action else {
            return text;
        };
        let mut text = match action.presentation() {
            Presentation::Plain => text,
            Presentation::Toggle => format!("[ ] {text}"),
            Presentation::Radio => format!("( ) {text}"),
        };
        if !action.is_sensitive() {
            text.push_str(" (insensitive)");
        }
        if self.kind == ProxyKind::MenuItem && self.show_accel {
            if let Some(accel) = action.accel() {
                let _ = write!(text, "  {accel}");
            }
        }
        text
    }
}

/// Headless [`ProxyFactory`] backed by a map of [`MockProxy`] values.
#[derive(Debug, Default)]
pub struct MockFactory {
    proxies: BTreeMap<ProxyId, MockProxy>,
    next_id: u64,
    created: usize,
    destroyed: usize,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ProxyId) -> Option<&MockProxy> {
        self.proxies.get(&id)
    }

    /// Number of proxies currently alive.
    pub fn live(&self) -> usize {
        self.proxies.len()
    }

    /// Total proxies ever created.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Total proxies ever destroyed, children included.
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    /// Label of `id`, or an empty string if it does not exist.
    pub fn label(&self, id: ProxyId) -> String {
        self.get(id).map(MockProxy::label).unwrap_or_default()
    }

    /// Render every visible toplevel and its visible descendants.
    ///
    /// Toplevels are proxies with no container that are not attached as a
    /// submenu, in creation order. Each level is indented by two spaces; a
    /// menu item lists its submenu's children below itself.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for (&id, proxy) in &self.proxies {
            let toplevel = matches!(
                proxy.kind,
                ProxyKind::MenuBar | ProxyKind::Toolbar | ProxyKind::Popup
            );
            if toplevel && proxy.parent.is_none() && proxy.attached_to.is_none() {
                self.outline_node(id, 0, &mut out);
            }
        }
        out
    }

    /// Outline of a single proxy subtree, visible parts only.
    pub fn outline_of(&self, id: ProxyId) -> String {
        let mut out = String::new();
        self.outline_node(id, 0, &mut out);
        out
    }

    fn outline_node(&self, id: ProxyId, depth: usize, out: &mut String) {
        let Some(proxy) = self.proxies.get(&id) else {
            return;
        };
        if !proxy.visible {
            return;
        }
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        out.push_str(&proxy.label());
        out.push('\n');
        let nested = proxy
            .submenu
            .and_then(|menu| self.proxies.get(&menu))
            .map_or(proxy.children.as_slice(), |menu| menu.children.as_slice());
        for &child in nested {
            self.outline_node(child, depth + 1, out);
        }
    }

    fn allocate(&mut self, kind: ProxyKind) -> ProxyId {
        self.next_id += 1;
        self.created += 1;
        let id = ProxyId::new(self.next_id);
        self.proxies.insert(
            id,
            MockProxy {
                kind,
                action: None,
                visible: true,
                show_accel: true,
                always_show_image: false,
                expand: false,
                parent: None,
                children: Vec::new(),
                submenu: None,
                attached_to: None,
            },
        );
        id
    }

    fn detach(&mut self, id: ProxyId) {
        let Some(parent) = self.proxies.get_mut(&id).and_then(|p| p.parent.take()) else {
            return;
        };
        if let Some(parent) = self.proxies.get_mut(&parent) {
            parent.children.retain(|&c| c != id);
        }
    }
}

impl ProxyFactory for MockFactory {
    fn create(&mut self, request: &ProxyRequest) -> ProxyId {
        let id = self.allocate(request.kind);
        if let Some(proxy) = self.proxies.get_mut(&id) {
            proxy.action = request.action.clone();
            proxy.show_accel = request.show_accel;
            proxy.always_show_image = request.always_show_image;
            proxy.expand = request.expand;
        }
        // Actions that provide their own menu come with it attached.
        let provides_menu = request
            .action
            .as_ref()
            .is_some_and(|a| a.is_providing_menu());
        if request.kind == ProxyKind::MenuItem && provides_menu {
            let menu = self.allocate(ProxyKind::Menu);
            self.attach_submenu(id, menu);
        }
        id
    }

    fn destroy(&mut self, proxy: ProxyId) {
        self.detach(proxy);
        let Some(removed) = self.proxies.remove(&proxy) else {
            return;
        };
        self.destroyed += 1;
        if let Some(item) = removed.attached_to {
            if let Some(item) = self.proxies.get_mut(&item) {
                item.submenu = None;
            }
        }
        for child in removed.children {
            if let Some(child) = self.proxies.get_mut(&child) {
                child.parent = None;
            }
            self.destroy(child);
        }
        if let Some(menu) = removed.submenu {
            if let Some(menu) = self.proxies.get_mut(&menu) {
                menu.attached_to = None;
            }
            self.destroy(menu);
        }
    }

    fn set_visible(&mut self, proxy: ProxyId, visible: bool) {
        if let Some(proxy) = self.proxies.get_mut(&proxy) {
            proxy.visible = visible;
        }
    }

    fn is_visible(&self, proxy: ProxyId) -> bool {
        self.proxies.get(&proxy).is_some_and(|p| p.visible)
    }

    fn insert_at(&mut self, container: ProxyId, proxy: ProxyId, index: usize) {
        if !self.proxies.contains_key(&container) || !self.proxies.contains_key(&proxy) {
            return;
        }
        self.detach(proxy);
        if let Some(parent) = self.proxies.get_mut(&container) {
            let index = index.min(parent.children.len());
            parent.children.insert(index, proxy);
        }
        if let Some(proxy) = self.proxies.get_mut(&proxy) {
            proxy.parent = Some(container);
        }
    }

    fn parent(&self, proxy: ProxyId) -> Option<ProxyId> {
        self.proxies.get(&proxy).and_then(|p| p.parent)
    }

    fn children(&self, container: ProxyId) -> Vec<ProxyId> {
        self.proxies
            .get(&container)
            .map(|p| p.children.clone())
            .unwrap_or_default()
    }

    fn attach_submenu(&mut self, item: ProxyId, submenu: ProxyId) {
        if !self.proxies.contains_key(&item) || !self.proxies.contains_key(&submenu) {
            return;
        }
        let previous = self.proxies.get_mut(&submenu).and_then(|m| m.attached_to.take());
        if let Some(previous) = previous.and_then(|p| self.proxies.get_mut(&p)) {
            previous.submenu = None;
        }
        if let Some(item) = self.proxies.get_mut(&item) {
            item.submenu = Some(submenu);
        }
        if let Some(menu) = self.proxies.get_mut(&submenu) {
            menu.attached_to = Some(item);
        }
    }

    fn submenu(&self, item: ProxyId) -> Option<ProxyId> {
        self.proxies.get(&item).and_then(|p| p.submenu)
    }

    fn set_action(&mut self, proxy: ProxyId, action: Option<&ActionHandle>) {
        if let Some(proxy) = self.proxies.get_mut(&proxy) {
            proxy.action = action.cloned();
        }
    }
}
