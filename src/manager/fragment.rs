//! Fragment builder: replays markup events as merge-tree edits.
//!
//! A small state machine over the element stack decides which elements may
//! appear where and what node kind each one declares. Every edit is tagged
//! with the fragment's merge id so a failure can be undone with the normal
//! reference removal path.

use crate::markup::{parse_markup, Element, MarkupError, MarkupEvent};
use crate::tree::{MergeId, MergeTree, NodeId, NodeKind};

/// Attributes accepted on any element.
const KNOWN_ATTRIBUTES: &[&str] = &[
    "name",
    "action",
    "position",
    "accelerators",
    "always-show-image",
    "expand",
];

/// Which child elements the innermost open element accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Root,
    Menu,
    Toolbar,
    /// Items, separators and accelerators take no children.
    Leaf,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    state: State,
    node: NodeId,
}

/// Parse `text` and merge it into `tree` under `merge_id`.
///
/// On error every reference already recorded for `merge_id` is removed again,
/// so the tree ends up as if the fragment had never been added (modulo dead
/// nodes awaiting the next sweep).
pub(crate) fn merge_fragment(
    tree: &mut MergeTree,
    merge_id: MergeId,
    text: &str,
) -> Result<(), MarkupError> {
    let result = parse_markup(text).and_then(|events| {
        let mut builder = FragmentBuilder {
            tree: &mut *tree,
            merge_id,
            stack: Vec::new(),
        };
        events.into_iter().try_for_each(|event| builder.apply(event))
    });
    if let Err(err) = &result {
        tracing::warn!(%merge_id, error = %err, "fragment rejected, rolling back");
        tree.remove_references(merge_id);
    }
    result
}

/// Children accepted below a node of `kind`.
fn child_state(kind: NodeKind) -> State {
    if kind.is_menu_shell() {
        State::Menu
    } else if kind.is_toolbar_shell() {
        State::Toolbar
    } else {
        State::Leaf
    }
}

struct FragmentBuilder<'t> {
    tree: &'t mut MergeTree,
    merge_id: MergeId,
    stack: Vec<Frame>,
}

impl FragmentBuilder<'_> {
    fn state(&self) -> State {
        self.stack.last().map_or(State::Start, |f| f.state)
    }

    fn apply(&mut self, event: MarkupEvent) -> Result<(), MarkupError> {
        match event {
            MarkupEvent::Start(element) => self.start(&element),
            MarkupEvent::End { .. } => {
                self.stack.pop();
                Ok(())
            }
        }
    }

    fn start(&mut self, element: &Element) -> Result<(), MarkupError> {
        if let Some(unknown) = element
            .attributes
            .iter()
            .find(|a| !KNOWN_ATTRIBUTES.contains(&a.name.as_str()))
        {
            return Err(MarkupError::UnknownAttribute {
                attribute: unknown.name.clone(),
                line: unknown.position.line,
                column: unknown.position.column,
            });
        }

        if self.state() == State::Start {
            let root = self.tree.root();
            self.tree.push_reference(root, self.merge_id, None);
            self.stack.push(Frame {
                state: State::Root,
                node: root,
            });
            // Without an explicit <ui> no end tag pops this frame, so the
            // synthesized root stays open for the rest of the fragment.
            if element.name == "ui" {
                return Ok(());
            }
        }

        let kind = match (self.state(), element.name.as_str()) {
            (State::Root, "menubar") => NodeKind::MenuBar,
            (State::Root, "toolbar") => NodeKind::Toolbar,
            (State::Root, "popup") => NodeKind::Popup,
            (State::Root, "accelerator") => NodeKind::Accelerator,
            (State::Menu, "menu") => NodeKind::Menu,
            (State::Menu, "menuitem") => NodeKind::MenuItem,
            (State::Menu, "placeholder") => NodeKind::MenuPlaceholder,
            (State::Toolbar, "toolitem") => NodeKind::ToolItem,
            (State::Toolbar, "placeholder") => NodeKind::ToolbarPlaceholder,
            (State::Menu | State::Toolbar, "separator") => NodeKind::Separator,
            _ => {
                return Err(MarkupError::UnexpectedElement {
                    element: element.name.clone(),
                    line: element.position.line,
                    column: element.position.column,
                })
            }
        };

        let action = element.attribute("action");
        let name = match (element.attribute("name"), kind) {
            (Some(name), _) => Some(name),
            (None, NodeKind::Separator) => None,
            (None, _) => Some(action.unwrap_or(element.name.as_str())),
        };
        let top = element.attribute("position") == Some("top");
        let parent = self.stack.last().map_or(self.tree.root(), |f| f.node);

        let Some(node) = self
            .tree
            .get_or_create_child(parent, None, name, kind, true, top)
        else {
            return Ok(());
        };
        // A redeclaration keeps the kind settled first, and the children
        // must fit that kind.
        let settled = self.tree.get(node).map_or(kind, |d| d.kind());
        self.apply_flags(node, settled, element);
        self.tree.push_reference(node, self.merge_id, action);
        self.stack.push(Frame {
            state: child_state(settled),
            node,
        });
        Ok(())
    }

    /// Copy presentation flags given on the element onto the node.
    fn apply_flags(&mut self, node: NodeId, kind: NodeKind, element: &Element) {
        let flag = match kind {
            NodeKind::Popup => "accelerators",
            NodeKind::Separator => "expand",
            NodeKind::MenuItem => "always-show-image",
            _ => return,
        };
        let Some(value) = element.attribute(flag) else {
            return;
        };
        let value = value == "true";
        let Some(data) = self.tree.get_mut(node) else {
            return;
        };
        let slot = match kind {
            NodeKind::Popup => &mut data.popup_accels,
            NodeKind::Separator => &mut data.expand,
            _ => &mut data.always_show_image,
        };
        if *slot != value {
            *slot = value;
            self.tree.mark_dirty(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merge(tree: &mut MergeTree, text: &str) -> Result<MergeId, MarkupError> {
        let merge_id = tree.new_merge_id();
        merge_fragment(tree, merge_id, text).map(|()| merge_id)
    }

    #[test]
    fn builds_nested_menus() {
        let mut tree = MergeTree::new();
        merge(
            &mut tree,
            r#"<ui>
                 <menubar>
                   <menu action="File">
                     <menuitem action="New"/>
                     <separator/>
                     <menuitem name="Bye" action="Quit"/>
                   </menu>
                 </menubar>
               </ui>"#,
        )
        .unwrap();

        let new = tree.resolve_path("/menubar/File/New").unwrap();
        assert_eq!(tree.get(new).unwrap().kind(), NodeKind::MenuItem);
        assert_eq!(tree.get(new).unwrap().bound_action_name(), Some("New"));
        let bye = tree.resolve_path("/menubar/File/Bye").unwrap();
        assert_eq!(tree.get(bye).unwrap().bound_action_name(), Some("Quit"));
        let file = tree.resolve_path("/menubar/File").unwrap();
        assert_eq!(tree.children(file).len(), 3);
        assert_eq!(tree.get(file).unwrap().kind(), NodeKind::Menu);
    }

    #[test]
    fn root_is_synthesized() {
        let mut tree = MergeTree::new();
        merge(
            &mut tree,
            r#"<popup name="ctx"><menuitem action="Copy"/></popup>
               <toolbar name="tb"><toolitem action="Copy"/></toolbar>"#,
        )
        .unwrap();
        assert!(tree.resolve_path("/ctx/Copy").is_some());
        assert!(tree.resolve_path("/tb/Copy").is_some());
        assert_eq!(tree.children(tree.root()).len(), 2);
    }

    #[test]
    fn separators_are_anonymous() {
        let mut tree = MergeTree::new();
        merge(&mut tree, "<popup><separator/><separator/></popup>").unwrap();
        merge(&mut tree, "<popup><separator/></popup>").unwrap();
        let popup = tree.resolve_path("/popup").unwrap();
        assert_eq!(tree.children(popup).len(), 3);
        assert!(tree
            .children(popup)
            .iter()
            .all(|&c| tree.get(c).unwrap().name.is_none()));
    }

    #[test]
    fn same_path_merges_into_one_node() {
        let mut tree = MergeTree::new();
        let first = merge(
            &mut tree,
            r#"<popup name="p"><menuitem name="Item" action="X"/></popup>"#,
        )
        .unwrap();
        let second = merge(
            &mut tree,
            r#"<popup name="p"><menuitem name="Item" action="Y"/></popup>"#,
        )
        .unwrap();
        let item = tree.resolve_path("/p/Item").unwrap();
        let data = tree.get(item).unwrap();
        assert_eq!(data.references.len(), 2);
        assert_eq!(data.head_merge_id(), Some(second));
        assert_eq!(data.references[1].merge_id, first);
        assert_eq!(data.bound_action_name(), Some("Y"));
    }

    #[test]
    fn position_top_prepends() {
        let mut tree = MergeTree::new();
        merge(&mut tree, r#"<toolbar><toolitem action="A"/></toolbar>"#).unwrap();
        merge(&mut tree, r#"<toolbar><toolitem action="B" position="top"/></toolbar>"#).unwrap();
        let toolbar = tree.resolve_path("/toolbar").unwrap();
        let names: Vec<_> = tree
            .children(toolbar)
            .iter()
            .map(|&c| tree.get(c).unwrap().label().to_owned())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn flags_are_recorded() {
        let mut tree = MergeTree::new();
        merge(
            &mut tree,
            r#"<popup name="p" accelerators="true">
                 <menuitem action="Open" always-show-image="true"/>
               </popup>
               <toolbar name="t"><separator name="gap" expand="true"/></toolbar>"#,
        )
        .unwrap();
        let popup = tree.resolve_path("/p").unwrap();
        assert!(tree.get(popup).unwrap().popup_accels);
        let open = tree.resolve_path("/p/Open").unwrap();
        assert!(tree.get(open).unwrap().always_show_image);
        let gap = tree.resolve_path("/t/gap").unwrap();
        assert!(tree.get(gap).unwrap().expand);
    }

    #[test]
    fn placeholders_nest_by_shell() {
        let mut tree = MergeTree::new();
        merge(
            &mut tree,
            r#"<menubar><placeholder name="Extra"><menu action="Tools"/></placeholder></menubar>
               <toolbar><placeholder name="Slot"><toolitem action="Run"/></placeholder></toolbar>"#,
        )
        .unwrap();
        let extra = tree.resolve_path("/menubar/Extra").unwrap();
        assert_eq!(tree.get(extra).unwrap().kind(), NodeKind::MenuPlaceholder);
        assert!(tree.resolve_path("/menubar/Extra/Tools").is_some());
        let slot = tree.resolve_path("/toolbar/Slot").unwrap();
        assert_eq!(tree.get(slot).unwrap().kind(), NodeKind::ToolbarPlaceholder);
    }

    #[test]
    fn comments_and_declarations_are_ignored() {
        let mut tree = MergeTree::new();
        merge(
            &mut tree,
            r#"<?xml version="1.0"?><!-- main --><ui><accelerator action="Quit"/></ui>"#,
        )
        .unwrap();
        let quit = tree.resolve_path("/Quit").unwrap();
        assert_eq!(tree.get(quit).unwrap().kind(), NodeKind::Accelerator);
    }

    #[test]
    fn misplaced_element_reports_position() {
        let mut tree = MergeTree::new();
        let err = merge(&mut tree, "<ui>\n  <menuitem action=\"X\"/>\n</ui>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::UnexpectedElement {
                element: "menuitem".into(),
                line: 2,
                column: 4,
            }
        );
    }

    #[test]
    fn leaves_take_no_children() {
        let mut tree = MergeTree::new();
        let err = merge(
            &mut tree,
            r#"<popup><menuitem action="X"><menuitem action="Y"/></menuitem></popup>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnexpectedElement { ref element, .. } if element == "menuitem"
        ));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut tree = MergeTree::new();
        let err = merge(&mut tree, r#"<popup colour="red"/>"#).unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnknownAttribute { ref attribute, .. } if attribute == "colour"
        ));
    }

    #[test]
    fn failure_rolls_back_applied_edits() {
        let mut tree = MergeTree::new();
        let keep = merge(
            &mut tree,
            r#"<popup name="p"><menuitem name="Item" action="X"/></popup>"#,
        )
        .unwrap();
        let err = merge(
            &mut tree,
            r#"<popup name="p"><menuitem name="Item" action="Y"/><toolitem action="Z"/></popup>"#,
        );
        assert!(err.is_err());

        let item = tree.resolve_path("/p/Item").unwrap();
        let data = tree.get(item).unwrap();
        assert_eq!(data.references.len(), 1);
        assert_eq!(data.head_merge_id(), Some(keep));
        assert_eq!(data.bound_action_name(), Some("X"));
        let root = tree.get(tree.root()).unwrap();
        assert!(root.references.iter().all(|r| r.merge_id == keep));
    }

    #[test]
    fn children_follow_the_settled_kind() {
        let mut tree = MergeTree::new();
        let keep = merge(&mut tree, r#"<popup name="x"><menuitem action="A"/></popup>"#).unwrap();
        let err = merge(
            &mut tree,
            r#"<toolbar name="x"><toolitem action="B"/></toolbar>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnexpectedElement { ref element, .. } if element == "toolitem"
        ));

        let popup = tree.resolve_path("/x").unwrap();
        assert_eq!(tree.get(popup).unwrap().kind(), NodeKind::Popup);
        assert!(tree.resolve_path("/x/B").is_none());
        let root = tree.get(tree.root()).unwrap();
        assert!(root.references.iter().all(|r| r.merge_id == keep));

        let mut copy = MergeTree::new();
        let markup = tree.to_markup();
        merge(&mut copy, &markup).unwrap();
    }

    #[test]
    fn redeclared_shell_accepts_its_own_children() {
        let mut tree = MergeTree::new();
        merge(&mut tree, r#"<popup name="x"><menuitem action="A"/></popup>"#).unwrap();
        merge(&mut tree, r#"<menubar name="x"><menuitem action="B"/></menubar>"#).unwrap();
        let b = tree.resolve_path("/x/B").unwrap();
        assert_eq!(tree.get(b).unwrap().kind(), NodeKind::MenuItem);
        let popup = tree.resolve_path("/x").unwrap();
        assert_eq!(tree.get(popup).unwrap().kind(), NodeKind::Popup);
    }

    #[test]
    fn syntax_error_applies_nothing() {
        let mut tree = MergeTree::new();
        assert!(merge(&mut tree, "<popup><menuitem action=\"X\"></popup>").is_err());
        assert!(tree.is_empty());
    }
}
