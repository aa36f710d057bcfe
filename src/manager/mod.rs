//! UiManager: the public face of the merge engine.
//!
//! Owns the merge tree, the registered action groups, the host's proxy
//! factory and the reference-counted accelerator installer. Fragments are
//! merged synchronously; proxies are only touched by update passes, which
//! run from the host's idle loop or on demand through [`UiManager::ensure_update`].

pub mod config;
pub mod fragment;
pub mod materialize;
pub mod separators;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::action::{ActionGroup, ActionGroups, ActionHandle};
use crate::markup::MarkupError;
use crate::proxy::{AccelRefs, AcceleratorInstaller, ProxyFactory, ProxyId};
use crate::tree::{MergeId, MergeTree, NodeKind};
use crate::update::UpdateToken;

pub use config::UiManagerConfig;
pub use separators::SeparatorMode;

use separators::ProxyRole;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by [`UiManager`] operations.
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error("failed to read fragment from '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no node at path '{0}'")]
    PathNotFound(String),
    #[error("node at '{path}' cannot hold {kind:?}")]
    InvalidParent { path: String, kind: ItemKind },
}

// ---------------------------------------------------------------------------
// ItemKind
// ---------------------------------------------------------------------------

/// What [`UiManager::add_at_path`] should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Menu item, tool item or separator, picked from the parent and
    /// whether an action was given.
    Auto,
    MenuBar,
    Menu,
    Toolbar,
    /// Menu or toolbar placeholder, picked from the parent.
    Placeholder,
    Popup,
    MenuItem,
    ToolItem,
    Separator,
    Accelerator,
}

impl ItemKind {
    /// Concrete node kind for a child of `parent`, or `None` when the
    /// combination is not allowed.
    fn resolve(self, parent: NodeKind, has_action: bool) -> Option<NodeKind> {
        let menu = parent.is_menu_shell();
        let toolbar = parent.is_toolbar_shell();
        let root = parent == NodeKind::Root;
        match self {
            Self::Auto if menu && has_action => Some(NodeKind::MenuItem),
            Self::Auto if toolbar && has_action => Some(NodeKind::ToolItem),
            Self::Auto if menu || toolbar => Some(NodeKind::Separator),
            Self::Placeholder if menu => Some(NodeKind::MenuPlaceholder),
            Self::Placeholder if toolbar => Some(NodeKind::ToolbarPlaceholder),
            Self::MenuBar if root => Some(NodeKind::MenuBar),
            Self::Toolbar if root => Some(NodeKind::Toolbar),
            Self::Popup if root => Some(NodeKind::Popup),
            Self::Accelerator if root => Some(NodeKind::Accelerator),
            Self::Menu if menu => Some(NodeKind::Menu),
            Self::MenuItem if menu => Some(NodeKind::MenuItem),
            Self::ToolItem if toolbar => Some(NodeKind::ToolItem),
            Self::Separator if menu || toolbar => Some(NodeKind::Separator),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// UiManager
// ---------------------------------------------------------------------------

/// Merges UI fragments into one tree and keeps host proxies in sync with it.
///
/// `F` builds and owns the visual proxies; `A` installs keyboard
/// accelerators. Both are supplied by the host.
pub struct UiManager<F, A> {
    tree: MergeTree,
    groups: ActionGroups,
    factory: F,
    accels: AccelRefs<A>,
    config: UiManagerConfig,
    /// Separators, tearoffs and fillers the manager created.
    roles: HashMap<ProxyId, ProxyRole>,
}

impl<F: ProxyFactory, A: AcceleratorInstaller> UiManager<F, A> {
    /// Create a manager with the default config.
    pub fn new(factory: F, installer: A) -> Self {
        Self::with_config(factory, installer, UiManagerConfig::default())
    }

    pub fn with_config(factory: F, installer: A, config: UiManagerConfig) -> Self {
        let mut tree = MergeTree::new();
        tree.set_root_alias(config.root_alias.clone());
        Self {
            tree,
            groups: ActionGroups::new(),
            factory,
            accels: AccelRefs::new(installer),
            config,
            roles: HashMap::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn tree(&self) -> &MergeTree {
        &self.tree
    }

    pub fn config(&self) -> &UiManagerConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn installer(&self) -> &A {
        self.accels.installer()
    }

    /// Current use count of an accelerator path.
    pub fn accel_count(&self, path: &str) -> usize {
        self.accels.count(path)
    }

    pub fn add_tearoffs(&self) -> bool {
        self.config.add_tearoffs
    }

    /// Toggle tearoffs on synthesized menus. Every node is recomputed.
    pub fn set_add_tearoffs(&mut self, add_tearoffs: bool) {
        if self.config.add_tearoffs != add_tearoffs {
            self.config.add_tearoffs = add_tearoffs;
            self.tree.mark_all_dirty();
        }
    }

    // ── Action groups ────────────────────────────────────────────────

    pub fn action_groups(&self) -> &ActionGroups {
        &self.groups
    }

    /// Register `group` at `pos` (clamped). A group whose name is already
    /// registered is refused with a warning and `false` is returned.
    pub fn insert_action_group(&mut self, group: ActionGroup, pos: usize) -> bool {
        match self.groups.insert(group, pos) {
            Ok(()) => {
                self.tree.mark_all_dirty();
                true
            }
            Err(group) => {
                tracing::warn!(group = group.name(), "action group already registered");
                false
            }
        }
    }

    pub fn remove_action_group(&mut self, name: &str) -> Option<ActionGroup> {
        let removed = self.groups.remove(name)?;
        self.tree.mark_all_dirty();
        Some(removed)
    }

    /// Edit a registered group in place. Returns `false` if no group is
    /// called `name`.
    pub fn update_action_group(&mut self, name: &str, edit: impl FnOnce(&mut ActionGroup)) -> bool {
        let Some(group) = self.groups.get_mut(name) else {
            return false;
        };
        edit(group);
        self.tree.mark_all_dirty();
        true
    }

    // ── Fragments ────────────────────────────────────────────────────

    /// Allocate a merge id for use with [`add_at_path`](Self::add_at_path).
    pub fn new_merge_id(&mut self) -> MergeId {
        self.tree.new_merge_id()
    }

    /// Parse and merge a fragment. On error nothing from it remains.
    pub fn add_fragment(&mut self, text: &str) -> Result<MergeId, UiError> {
        let merge_id = self.tree.new_merge_id();
        fragment::merge_fragment(&mut self.tree, merge_id, text)?;
        tracing::debug!(%merge_id, "fragment added");
        Ok(merge_id)
    }

    /// Read a fragment from `path` and merge it.
    pub fn add_fragment_from_file(&mut self, path: impl AsRef<Path>) -> Result<MergeId, UiError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| UiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_fragment(&text)
    }

    /// Add a single node under `merge_id`.
    ///
    /// `path` names the parent. When it names a menu item, tool item or
    /// separator, the node goes next to that item instead (before it when
    /// `top`). The node is called `name`, else `action`; separators without
    /// a name are anonymous and never merge with an existing node.
    pub fn add_at_path(
        &mut self,
        merge_id: MergeId,
        path: &str,
        name: Option<&str>,
        action: Option<&str>,
        kind: ItemKind,
        top: bool,
    ) -> Result<(), UiError> {
        let target = self
            .tree
            .resolve_path(path)
            .ok_or_else(|| UiError::PathNotFound(path.to_owned()))?;
        let target_kind = self.tree.get(target).map(|d| d.kind());
        let (parent, sibling) = match target_kind {
            Some(NodeKind::MenuItem | NodeKind::ToolItem | NodeKind::Separator) => {
                let parent = self
                    .tree
                    .parent(target)
                    .ok_or_else(|| UiError::PathNotFound(path.to_owned()))?;
                (parent, Some(target))
            }
            _ => (target, None),
        };
        let parent_kind = self.tree.get(parent).map_or(NodeKind::Undecided, |d| d.kind());
        let node_kind = kind
            .resolve(parent_kind, action.is_some())
            .ok_or_else(|| UiError::InvalidParent {
                path: path.to_owned(),
                kind,
            })?;

        let name = match (name, node_kind) {
            (Some(name), _) => Some(name),
            (None, NodeKind::Separator) => None,
            (None, kind) => action.or(kind.element_name()),
        };
        let Some(node) = self
            .tree
            .get_or_create_child(parent, sibling, name, node_kind, true, top)
        else {
            return Err(UiError::PathNotFound(path.to_owned()));
        };
        self.tree.push_reference(node, merge_id, action);
        tracing::debug!(%merge_id, path, ?name, kind = ?node_kind, "node added at path");
        Ok(())
    }

    /// Undo everything merged under `merge_id`. Unknown ids are a no-op.
    pub fn remove_fragment(&mut self, merge_id: MergeId) {
        self.tree.remove_references(merge_id);
        tracing::debug!(%merge_id, "fragment removed");
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Proxy of the node at `path`. For menus this is the item the submenu
    /// hangs off.
    pub fn get_proxy(&mut self, path: &str) -> Option<ProxyId> {
        self.ensure_update();
        let id = self.tree.resolve_path(path)?;
        self.tree.get(id)?.proxy
    }

    /// Action the node at `path` is currently materialized for.
    pub fn get_action(&mut self, path: &str) -> Option<ActionHandle> {
        self.ensure_update();
        let id = self.tree.resolve_path(path)?;
        self.tree.get(id)?.action.clone()
    }

    /// Proxies of root-level nodes whose kind is in `kinds`, in tree order.
    pub fn toplevels(&mut self, kinds: &[NodeKind]) -> Vec<ProxyId> {
        self.ensure_update();
        let root = self.tree.root();
        self.tree
            .children(root)
            .iter()
            .filter_map(|&id| self.tree.get(id))
            .filter(|data| kinds.contains(&data.kind()))
            .filter_map(|data| data.proxy)
            .collect()
    }

    /// Serialize the merged tree as fragment markup.
    pub fn to_markup(&mut self) -> String {
        self.ensure_update();
        self.tree.to_markup()
    }

    // ── Update scheduling ────────────────────────────────────────────

    /// Install the callback that asks the host to call
    /// [`dispatch_idle`](Self::dispatch_idle) later.
    pub fn set_idle_hook(&mut self, hook: impl FnMut(UpdateToken) + 'static) {
        self.tree.scheduler_mut().set_idle_hook(hook);
    }

    /// Run the deferred pass for `token`. Stale tokens are ignored.
    pub fn dispatch_idle(&mut self, token: UpdateToken) -> bool {
        if !self.tree.scheduler_mut().claim(token) {
            tracing::trace!(?token, "stale update token ignored");
            return false;
        }
        self.run_update_pass();
        true
    }

    /// Run the pending pass now, cancelling its deferred callback.
    pub fn ensure_update(&mut self) {
        if self.tree.scheduler_mut().cancel().is_some() {
            self.run_update_pass();
        }
    }

    /// Whether a pass is pending.
    pub fn needs_update(&self) -> bool {
        self.tree.scheduler().is_pending()
    }

    /// Number of update passes run so far.
    pub fn update_passes(&self) -> u64 {
        self.tree.scheduler().passes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::testing::{MockAccels, MockFactory};
    use pretty_assertions::assert_eq;

    fn manager() -> UiManager<MockFactory, MockAccels> {
        UiManager::new(MockFactory::new(), MockAccels::new())
    }

    #[test]
    fn item_kind_resolution() {
        use NodeKind as K;
        assert_eq!(ItemKind::Auto.resolve(K::Menu, true), Some(K::MenuItem));
        assert_eq!(ItemKind::Auto.resolve(K::Toolbar, true), Some(K::ToolItem));
        assert_eq!(ItemKind::Auto.resolve(K::Popup, false), Some(K::Separator));
        assert_eq!(ItemKind::Auto.resolve(K::Root, true), None);
        assert_eq!(ItemKind::Placeholder.resolve(K::MenuBar, false), Some(K::MenuPlaceholder));
        assert_eq!(
            ItemKind::Placeholder.resolve(K::ToolbarPlaceholder, false),
            Some(K::ToolbarPlaceholder)
        );
        assert_eq!(ItemKind::Popup.resolve(K::Root, false), Some(K::Popup));
        assert_eq!(ItemKind::Popup.resolve(K::Menu, false), None);
        assert_eq!(ItemKind::ToolItem.resolve(K::Menu, true), None);
        assert_eq!(ItemKind::Menu.resolve(K::MenuPlaceholder, true), Some(K::Menu));
    }

    #[test]
    fn add_fragment_returns_increasing_ids() {
        let mut ui = manager();
        let a = ui.add_fragment("<popup/>").unwrap();
        let b = ui.add_fragment("<toolbar/>").unwrap();
        assert!(b > a);
    }

    #[test]
    fn failed_fragment_consumes_its_id() {
        let mut ui = manager();
        let a = ui.add_fragment("<popup/>").unwrap();
        assert!(matches!(ui.add_fragment("<popup>"), Err(UiError::Markup(_))));
        let c = ui.add_fragment("<toolbar/>").unwrap();
        assert_eq!(c.get(), a.get() + 2);
    }

    #[test]
    fn add_at_path_errors() {
        let mut ui = manager();
        ui.add_fragment(r#"<toolbar name="tb"/>"#).unwrap();
        let merge = ui.new_merge_id();
        let missing = ui.add_at_path(merge, "/nope", None, Some("X"), ItemKind::Auto, false);
        assert!(matches!(missing, Err(UiError::PathNotFound(ref p)) if p == "/nope"));
        let invalid = ui.add_at_path(merge, "/tb", None, Some("X"), ItemKind::MenuItem, false);
        assert!(matches!(
            invalid,
            Err(UiError::InvalidParent { kind: ItemKind::MenuItem, .. })
        ));
    }

    #[test]
    fn add_at_path_names_nodes() {
        let mut ui = manager();
        ui.add_fragment(r#"<popup name="p"/>"#).unwrap();
        let merge = ui.new_merge_id();
        ui.add_at_path(merge, "/p", None, Some("Copy"), ItemKind::Auto, false)
            .unwrap();
        ui.add_at_path(merge, "/p", None, None, ItemKind::Auto, false)
            .unwrap();
        ui.add_at_path(merge, "/p", Some("slot"), None, ItemKind::Placeholder, false)
            .unwrap();
        let tree = ui.tree();
        let copy = tree.resolve_path("/p/Copy").unwrap();
        assert_eq!(tree.get(copy).unwrap().kind(), NodeKind::MenuItem);
        let popup = tree.resolve_path("/p").unwrap();
        let separator = tree.children(popup)[1];
        assert_eq!(tree.get(separator).unwrap().kind(), NodeKind::Separator);
        assert!(tree.get(separator).unwrap().name.is_none());
        let slot = tree.resolve_path("/p/slot").unwrap();
        assert_eq!(tree.get(slot).unwrap().kind(), NodeKind::MenuPlaceholder);
    }

    #[test]
    fn duplicate_group_is_refused() {
        let mut ui = manager();
        assert!(ui.insert_action_group(ActionGroup::new("app"), 0));
        assert!(!ui.insert_action_group(ActionGroup::new("app"), 0));
        assert_eq!(ui.action_groups().len(), 1);
    }

    #[test]
    fn group_changes_schedule_an_update() {
        let mut ui = manager();
        ui.ensure_update();
        assert!(!ui.needs_update());
        ui.insert_action_group(ActionGroup::new("app"), 0);
        assert!(ui.needs_update());
        ui.ensure_update();
        assert!(ui.update_action_group("app", |g| {
            g.add(Action::new("Open"));
        }));
        assert!(ui.needs_update());
        ui.ensure_update();
        assert!(!ui.update_action_group("missing", |_| {}));
        assert!(!ui.needs_update());
        assert!(ui.remove_action_group("app").is_some());
        assert!(ui.needs_update());
    }

    #[test]
    fn set_add_tearoffs_only_dirties_on_change() {
        let mut ui = manager();
        ui.ensure_update();
        ui.set_add_tearoffs(false);
        assert!(!ui.needs_update());
        ui.set_add_tearoffs(true);
        assert!(ui.add_tearoffs());
        assert!(ui.needs_update());
    }

    #[test]
    fn config_root_alias_reaches_tree() {
        let ui: UiManager<MockFactory, MockAccels> = UiManager::with_config(
            MockFactory::new(),
            MockAccels::new(),
            UiManagerConfig::new().with_root_alias("top"),
        );
        assert_eq!(ui.tree().root_alias(), Some("top"));
        assert_eq!(ui.tree().resolve_path("/top"), Some(ui.tree().root()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut ui = manager();
        let err = ui
            .add_fragment_from_file("/definitely/not/here.ui")
            .unwrap_err();
        assert!(matches!(err, UiError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.ui"));
    }
}
