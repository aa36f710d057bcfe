//! Node types: NodeId, MergeId, NodeKind, NodeData.

use std::fmt;

use slotmap::new_key_type;

use crate::action::{ActionHandle, Presentation};
use crate::proxy::ProxyId;

new_key_type! {
    /// Unique identifier for a merge-tree node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Token identifying one fragment's contribution to the tree.
///
/// Handed out by [`MergeTree::new_merge_id`](super::MergeTree::new_merge_id),
/// monotonically increasing and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MergeId(pub(crate) u32);

impl MergeId {
    /// The raw counter value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MergeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// Structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Created by a path lookup before any fragment declared what it is.
    Undecided,
    Root,
    MenuBar,
    Menu,
    Toolbar,
    MenuPlaceholder,
    ToolbarPlaceholder,
    Popup,
    MenuItem,
    ToolItem,
    Separator,
    Accelerator,
}

impl NodeKind {
    /// Whether materializing this kind needs a resolved action.
    pub fn requires_action(self) -> bool {
        matches!(
            self,
            Self::MenuItem | Self::ToolItem | Self::Menu | Self::Accelerator
        )
    }

    /// Menu-like containers that menu items, menus and separators go into.
    pub fn is_menu_shell(self) -> bool {
        matches!(
            self,
            Self::MenuBar | Self::Menu | Self::Popup | Self::MenuPlaceholder
        )
    }

    /// Toolbar-like containers that tool items and separators go into.
    pub fn is_toolbar_shell(self) -> bool {
        matches!(self, Self::Toolbar | Self::ToolbarPlaceholder)
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::MenuPlaceholder | Self::ToolbarPlaceholder)
    }

    /// Leaf kinds never have children.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::MenuItem | Self::ToolItem | Self::Separator | Self::Accelerator
        )
    }

    /// Markup element name used when serializing. `None` for `Undecided`.
    pub fn element_name(self) -> Option<&'static str> {
        match self {
            Self::Undecided => None,
            Self::Root => Some("ui"),
            Self::MenuBar => Some("menubar"),
            Self::Menu => Some("menu"),
            Self::Toolbar => Some("toolbar"),
            Self::MenuPlaceholder | Self::ToolbarPlaceholder => Some("placeholder"),
            Self::Popup => Some("popup"),
            Self::MenuItem => Some("menuitem"),
            Self::ToolItem => Some("toolitem"),
            Self::Separator => Some("separator"),
            Self::Accelerator => Some("accelerator"),
        }
    }
}

/// A redeclaration named a different kind than the one already settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("node is {existing:?}, redeclared as {declared:?}")]
pub struct KindMismatch {
    pub existing: NodeKind,
    pub declared: NodeKind,
}

// ---------------------------------------------------------------------------
// NodeReference
// ---------------------------------------------------------------------------

/// One fragment's contribution to a node: which merge added it and the
/// action it asked the node to proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReference {
    pub merge_id: MergeId,
    pub action: Option<String>,
}

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// Data associated with a single merge-tree node.
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    /// Path segment. `None` for anonymous separators.
    pub name: Option<String>,
    /// Contributing merges, most recent first.
    pub references: Vec<NodeReference>,
    /// Needs recomputation on the next update pass.
    pub dirty: bool,
    /// Materialized element. For menus this is the item the submenu hangs off.
    pub proxy: Option<ProxyId>,
    /// Bottom marker of a placeholder pair.
    pub secondary_proxy: Option<ProxyId>,
    /// The action the current proxy was built for.
    pub action: Option<ActionHandle>,
    /// Presentation the current proxy was built with.
    pub presentation: Option<Presentation>,
    pub expand: bool,
    pub popup_accels: bool,
    pub always_show_image: bool,
}

impl NodeData {
    /// Create a fresh, dirty node with no references.
    pub fn new(name: Option<&str>, kind: NodeKind) -> Self {
        Self {
            kind,
            name: name.map(str::to_owned),
            references: Vec::new(),
            dirty: true,
            proxy: None,
            secondary_proxy: None,
            action: None,
            presentation: None,
            expand: false,
            popup_accels: false,
            always_show_image: false,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Fix the kind of an undecided node, or check a redeclaration.
    ///
    /// This is the only place a node's kind changes. A mismatch leaves the
    /// settled kind in place.
    pub fn settle_kind(&mut self, declared: NodeKind) -> Result<(), KindMismatch> {
        match (self.kind, declared) {
            (_, NodeKind::Undecided) => Ok(()),
            (NodeKind::Undecided, kind) => {
                self.kind = kind;
                Ok(())
            }
            (existing, declared) if existing == declared => Ok(()),
            (existing, declared) => Err(KindMismatch { existing, declared }),
        }
    }

    /// The action name requested by the most recent contributing merge.
    pub fn bound_action_name(&self) -> Option<&str> {
        self.references.first().and_then(|r| r.action.as_deref())
    }

    /// Merge id of the head reference.
    pub fn head_merge_id(&self) -> Option<MergeId> {
        self.references.first().map(|r| r.merge_id)
    }

    /// Display label for diagnostics.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_dirty_and_unreferenced() {
        let node = NodeData::new(Some("File"), NodeKind::Menu);
        assert!(node.dirty);
        assert!(node.references.is_empty());
        assert_eq!(node.kind(), NodeKind::Menu);
        assert_eq!(node.name.as_deref(), Some("File"));
        assert!(node.proxy.is_none());
    }

    #[test]
    fn undecided_settles_once() {
        let mut node = NodeData::new(Some("x"), NodeKind::Undecided);
        assert!(node.settle_kind(NodeKind::MenuItem).is_ok());
        assert_eq!(node.kind(), NodeKind::MenuItem);
        assert!(node.settle_kind(NodeKind::MenuItem).is_ok());
    }

    #[test]
    fn mismatch_keeps_existing_kind() {
        let mut node = NodeData::new(Some("x"), NodeKind::MenuItem);
        let err = node.settle_kind(NodeKind::ToolItem).unwrap_err();
        assert_eq!(err.existing, NodeKind::MenuItem);
        assert_eq!(err.declared, NodeKind::ToolItem);
        assert_eq!(node.kind(), NodeKind::MenuItem);
    }

    #[test]
    fn undecided_lookup_never_mismatches() {
        let mut node = NodeData::new(Some("x"), NodeKind::Toolbar);
        assert!(node.settle_kind(NodeKind::Undecided).is_ok());
        assert_eq!(node.kind(), NodeKind::Toolbar);
    }

    #[test]
    fn bound_action_is_head_reference() {
        let mut node = NodeData::new(Some("Item"), NodeKind::MenuItem);
        assert_eq!(node.bound_action_name(), None);
        node.references.push(NodeReference {
            merge_id: MergeId(2),
            action: Some("Y".into()),
        });
        node.references.push(NodeReference {
            merge_id: MergeId(1),
            action: Some("X".into()),
        });
        assert_eq!(node.bound_action_name(), Some("Y"));
        assert_eq!(node.head_merge_id(), Some(MergeId(2)));
    }

    #[test]
    fn requires_action_kinds() {
        assert!(NodeKind::MenuItem.requires_action());
        assert!(NodeKind::Menu.requires_action());
        assert!(NodeKind::Accelerator.requires_action());
        assert!(!NodeKind::Popup.requires_action());
        assert!(!NodeKind::Separator.requires_action());
        assert!(!NodeKind::MenuPlaceholder.requires_action());
    }

    #[test]
    fn placeholders_share_element_name() {
        assert_eq!(NodeKind::MenuPlaceholder.element_name(), Some("placeholder"));
        assert_eq!(NodeKind::ToolbarPlaceholder.element_name(), Some("placeholder"));
        assert_eq!(NodeKind::Undecided.element_name(), None);
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
        assert_copy::<MergeId>();
    }
}
