//! Contracts with the host toolkit: proxy factory and accelerator installer.
//!
//! The manager never renders anything. It asks a [`ProxyFactory`] to create,
//! place, show/hide and destroy opaque [`ProxyId`] handles, and only reads
//! structural facts back (parent, children, attached submenu, visibility).

pub mod accel;

use std::fmt;

use crate::action::{Action, ActionHandle};

pub use accel::AccelRefs;

/// Opaque handle to a host-owned visual element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(u64);

impl ProxyId {
    /// Wrap a host-chosen raw handle.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the factory is asked to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    MenuBar,
    /// A menu container, attached to an item as its submenu.
    Menu,
    Popup,
    Toolbar,
    MenuItem,
    ToolItem,
    Separator,
    ToolSeparator,
    /// Detach affordance at the top of a synthesized menu.
    Tearoff,
    /// Disabled placeholder item shown while a synthesized menu is empty.
    Filler,
}

/// Parameters for [`ProxyFactory::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequest {
    pub kind: ProxyKind,
    pub action: Option<ActionHandle>,
    pub always_show_image: bool,
    /// Whether a menu item displays its accelerator.
    pub show_accel: bool,
    /// Tool separators only: take up the remaining toolbar space.
    pub expand: bool,
}

impl ProxyRequest {
    pub fn new(kind: ProxyKind) -> Self {
        Self {
            kind,
            action: None,
            always_show_image: false,
            show_accel: true,
            expand: false,
        }
    }

    /// Bind the proxy to `action` (builder).
    pub fn with_action(mut self, action: Option<ActionHandle>) -> Self {
        self.action = action;
        self
    }

    pub fn always_show_image(mut self, always: bool) -> Self {
        self.always_show_image = always;
        self
    }

    pub fn show_accel(mut self, show: bool) -> Self {
        self.show_accel = show;
        self
    }

    pub fn expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }
}

/// Host-side builder and owner of proxies.
///
/// Handles stay valid until passed to [`destroy`](Self::destroy); the
/// manager only borrows them.
pub trait ProxyFactory {
    /// Build a new, unparented proxy.
    fn create(&mut self, request: &ProxyRequest) -> ProxyId;

    /// Destroy `proxy`, its children, and its attached submenu.
    fn destroy(&mut self, proxy: ProxyId);

    fn set_visible(&mut self, proxy: ProxyId, visible: bool);

    fn is_visible(&self, proxy: ProxyId) -> bool;

    /// Move `proxy` into `container` at `index`, detaching it from any
    /// previous container first. `index` counts the container's children
    /// without `proxy` and is clamped to the end.
    fn insert_at(&mut self, container: ProxyId, proxy: ProxyId, index: usize);

    /// Container currently holding `proxy`.
    fn parent(&self, proxy: ProxyId) -> Option<ProxyId>;

    /// Children of `container` in display order.
    fn children(&self, container: ProxyId) -> Vec<ProxyId>;

    /// Position of `proxy` among the children of `container`.
    fn index_of(&self, container: ProxyId, proxy: ProxyId) -> Option<usize> {
        self.children(container).iter().position(|&c| c == proxy)
    }

    /// Hang `submenu` off `item`, detaching it from any previous item.
    fn attach_submenu(&mut self, item: ProxyId, submenu: ProxyId);

    /// Submenu attached to `item`, including one the action supplied itself.
    fn submenu(&self, item: ProxyId) -> Option<ProxyId>;

    /// Rebind an existing proxy to another action of the same presentation.
    fn set_action(&mut self, proxy: ProxyId, action: Option<&ActionHandle>);
}

/// Host-side keyboard accelerator map.
///
/// Calls arrive already reference counted by [`AccelRefs`]: `connect` on the
/// first use of a path, `disconnect` when the last user goes away.
pub trait AcceleratorInstaller {
    fn connect(&mut self, action: &Action, path: &str);
    fn disconnect(&mut self, action: &Action, path: &str);
}
