//! Path resolution: slash-delimited names to nodes.

use super::arena::MergeTree;
use super::node::NodeId;

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl MergeTree {
    /// Resolve `path` to a node, starting at the root.
    ///
    /// Leading, trailing and doubled slashes are ignored. A first segment
    /// equal to the root alias names the root itself unless the root has a
    /// child of that name. Returns `None` as soon as a segment is missing.
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        let mut parts = segments(path).peekable();
        let mut node = self.root();

        if let (Some(&first), Some(alias)) = (parts.peek(), self.root_alias()) {
            if first == alias && self.find_child(node, alias).is_none() {
                parts.next();
            }
        }

        for part in parts {
            node = self.find_child(node, part)?;
        }
        Some(node)
    }

    /// The slash-delimited path of `id`, without the root.
    ///
    /// Anonymous nodes contribute an empty segment.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .chain(std::iter::once(id))
            .filter(|&n| n != self.root())
            .map(|n| self.get(n).and_then(|d| d.name.as_deref()).unwrap_or(""))
            .collect();
        if names.is_empty() {
            return "/".to_owned();
        }
        names.insert(0, "");
        names.join("/")
    }
}
