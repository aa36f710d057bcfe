//! Serialize the merged tree back to fragment markup.

use std::fmt::Write;

use super::arena::MergeTree;
use super::node::{NodeId, NodeKind};
use crate::markup::escape_attribute;

const INDENT: &str = "  ";

impl MergeTree {
    /// Dump the whole tree as markup accepted by the fragment parser.
    ///
    /// Each node prints its name and the action of its head reference.
    /// Undecided nodes and their subtrees are skipped.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.print_node(self.root(), 0, &mut out);
        out
    }

    fn print_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };
        let Some(tag) = data.kind().element_name() else {
            return;
        };

        for _ in 0..depth {
            out.push_str(INDENT);
        }
        out.push('<');
        out.push_str(tag);

        if data.kind() != NodeKind::Root {
            if let Some(name) = &data.name {
                let _ = write!(out, " name=\"{}\"", escape_attribute(name));
            }
            if let Some(action) = data.bound_action_name() {
                let _ = write!(out, " action=\"{}\"", escape_attribute(action));
            }
        }
        if data.popup_accels && data.kind() == NodeKind::Popup {
            out.push_str(" accelerators=\"true\"");
        }
        if data.expand && data.kind() == NodeKind::Separator {
            out.push_str(" expand=\"true\"");
        }
        if data.always_show_image && data.kind() == NodeKind::MenuItem {
            out.push_str(" always-show-image=\"true\"");
        }

        if data.kind().is_leaf() {
            out.push_str("/>\n");
            return;
        }

        out.push_str(">\n");
        for &child in self.children(id) {
            self.print_node(child, depth + 1, out);
        }
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        let _ = writeln!(out, "</{tag}>");
    }
}
