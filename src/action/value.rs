//! Action value objects.

use std::rc::Rc;

/// Shared handle to a registered action. Identity (`Rc::ptr_eq`) tells the
/// materializer whether a proxy still belongs to the same action.
pub type ActionHandle = Rc<Action>;

/// How a proxy presents its action. A change forces the proxy to be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presentation {
    #[default]
    Plain,
    Toggle,
    Radio,
}

/// A named, user-invokable command the tree's proxies stand for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    name: String,
    group: String,
    label: Option<String>,
    icon: Option<String>,
    accel: Option<String>,
    sensitive: bool,
    visible: bool,
    hide_if_empty: bool,
    presentation: Presentation,
    provides_menu: bool,
}

impl Action {
    /// Create a sensitive, visible, plain action.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            label: None,
            icon: None,
            accel: None,
            sensitive: true,
            visible: true,
            hide_if_empty: true,
            presentation: Presentation::Plain,
            provides_menu: false,
        }
    }

    /// Set the display label (builder).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the icon name (builder).
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the accelerator key, e.g. `"<Control>q"` (builder).
    pub fn with_accel(mut self, accel: impl Into<String>) -> Self {
        self.accel = Some(accel.into());
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Whether a menu proxying this action hides when it has no visible
    /// content. Defaults to `true` (builder).
    pub fn hide_if_empty(mut self, hide: bool) -> Self {
        self.hide_if_empty = hide;
        self
    }

    /// The action builds menu items that already carry a submenu (builder).
    pub fn provides_menu(mut self, provides: bool) -> Self {
        self.provides_menu = provides;
        self
    }

    pub(crate) fn set_group(&mut self, group: &str) {
        self.group = group.to_owned();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the group the action was registered in. Empty until added.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Label, falling back to the action name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn accel(&self) -> Option<&str> {
        self.accel.as_deref()
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_hide_if_empty(&self) -> bool {
        self.hide_if_empty
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn is_providing_menu(&self) -> bool {
        self.provides_menu
    }

    /// Accelerator-map path: `<Actions>/{group}/{name}`.
    pub fn accel_path(&self) -> String {
        format!("<Actions>/{}/{}", self.group, self.name)
    }
}
