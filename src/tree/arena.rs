//! Tree operations: child lookup and creation, reference bookkeeping, dirty
//! propagation, unlink/relink, walk.

use slotmap::{SecondaryMap, SlotMap};

use super::node::{MergeId, NodeData, NodeId, NodeKind, NodeReference};
use crate::update::UpdateScheduler;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// Default leading path segment naming the root.
pub const DEFAULT_ROOT_ALIAS: &str = "ui";

/// The merge tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so nodes can be unlinked and relinked during dead-node
/// recycling without touching any other node's data. The root exists from
/// construction on and is never removed.
pub struct MergeTree {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: NodeId,
    root_alias: Option<String>,
    last_merge_id: u32,
    scheduler: UpdateScheduler,
}

impl MergeTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(Some(DEFAULT_ROOT_ALIAS), NodeKind::Root));
        let mut children = SecondaryMap::new();
        children.insert(root, Vec::new());
        Self {
            nodes,
            children,
            parent: SecondaryMap::new(),
            root,
            root_alias: Some(DEFAULT_ROOT_ALIAS.to_owned()),
            last_merge_id: 0,
            scheduler: UpdateScheduler::new(),
        }
    }

    /// Allocate the next merge id.
    pub fn new_merge_id(&mut self) -> MergeId {
        self.last_merge_id += 1;
        tracing::debug!(merge_id = self.last_merge_id, "allocated merge id");
        MergeId(self.last_merge_id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Leading path segment that may name the root.
    pub fn root_alias(&self) -> Option<&str> {
        self.root_alias.as_deref()
    }

    pub fn set_root_alias(&mut self, alias: Option<String>) {
        self.root_alias = alias;
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut UpdateScheduler {
        &mut self.scheduler
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    ///
    /// Does not mark anything dirty; use [`mark_dirty`](Self::mark_dirty).
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no
    /// children or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// The named child of `parent`. Anonymous children never match.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|&child| {
            self.nodes
                .get(child)
                .and_then(|data| data.name.as_deref())
                .is_some_and(|n| n == name)
        })
    }

    /// A node is dead when neither it nor any descendant is referenced.
    pub fn is_dead(&self, id: NodeId) -> bool {
        match self.nodes.get(id) {
            Some(data) if !data.references.is_empty() => false,
            Some(_) => self.children(id).iter().all(|&child| self.is_dead(child)),
            None => true,
        }
    }

    // ── Structural edits ─────────────────────────────────────────────

    /// Find the child called `name`, creating it when absent and `create` is set.
    ///
    /// A found child of undecided kind takes `kind`; any other mismatch is
    /// logged and the settled kind kept. A found child that is dead is
    /// unlinked and reinserted where a new node would go, keeping its
    /// proxies. New nodes go next to `sibling` when given (before it if
    /// `top`), otherwise at the top or bottom of `parent`.
    pub fn get_or_create_child(
        &mut self,
        parent: NodeId,
        sibling: Option<NodeId>,
        name: Option<&str>,
        kind: NodeKind,
        create: bool,
        top: bool,
    ) -> Option<NodeId> {
        if let Some(child) = name.and_then(|n| self.find_child(parent, n)) {
            if let Some(data) = self.nodes.get_mut(child) {
                if let Err(mismatch) = data.settle_kind(kind) {
                    tracing::warn!(node = data.label(), %mismatch, "node kind mismatch");
                }
            }
            if create && self.is_dead(child) {
                self.unlink(child);
                self.link(parent, sibling, child, top);
                self.mark_dirty(child);
            }
            return Some(child);
        }

        if !create {
            return None;
        }

        let id = self.nodes.insert(NodeData::new(name, kind));
        self.children.insert(id, Vec::new());
        self.link(parent, sibling, id, top);
        self.mark_dirty(id);
        Some(id)
    }

    /// Attach `child` under `parent` relative to `sibling` or at an edge.
    fn link(&mut self, parent: NodeId, sibling: Option<NodeId>, child: NodeId, top: bool) {
        self.parent.insert(child, parent);
        let Some(siblings) = self.children.get_mut(parent) else {
            return;
        };
        let anchor = sibling.and_then(|s| siblings.iter().position(|&c| c == s));
        match (anchor, top) {
            (Some(index), true) => siblings.insert(index, child),
            (Some(index), false) => siblings.insert(index + 1, child),
            (None, true) => siblings.insert(0, child),
            (None, false) => siblings.push(child),
        }
    }

    /// Detach `child` from its parent, leaving its subtree intact.
    fn unlink(&mut self, child: NodeId) {
        if let Some(parent_id) = self.parent.remove(child) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&c| c != child);
            }
        }
    }

    /// Remove a node and all its descendants.
    ///
    /// Returns the `NodeData` for the removed node, or `None` if it didn't
    /// exist or is the root.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if id == self.root || !self.nodes.contains_key(id) {
            return None;
        }
        self.unlink(id);

        let mut to_remove = vec![id];
        let mut removed = None;
        while let Some(current) = to_remove.pop() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed = data;
            }
        }
        removed
    }

    // ── References ───────────────────────────────────────────────────

    /// Record that `merge_id` contributed `node`, binding it to `action`.
    ///
    /// A repeat by the merge already at the head updates that record in
    /// place instead of stacking a duplicate.
    pub fn push_reference(&mut self, node: NodeId, merge_id: MergeId, action: Option<&str>) {
        let Some(data) = self.nodes.get_mut(node) else {
            return;
        };
        let changed = match data.references.first() {
            Some(head) if head.merge_id == merge_id => {
                if head.action.as_deref() == action {
                    false
                } else {
                    tracing::warn!(
                        node = data.label(),
                        %merge_id,
                        previous = ?head.action,
                        action = ?action,
                        "duplicate action attribution within one merge"
                    );
                    data.references[0].action = action.map(str::to_owned);
                    true
                }
            }
            _ => {
                data.references.insert(
                    0,
                    NodeReference {
                        merge_id,
                        action: action.map(str::to_owned),
                    },
                );
                true
            }
        };
        if changed {
            self.mark_dirty(node);
        }
    }

    /// Drop every reference recorded for `merge_id`, tree-wide.
    ///
    /// Nodes whose head reference went away are marked dirty. Nodes are not
    /// removed here; the next update pass sweeps the dead ones.
    pub fn remove_references(&mut self, merge_id: MergeId) {
        for id in self.walk_post_order(self.root) {
            let Some(data) = self.nodes.get_mut(id) else {
                continue;
            };
            let head = data.head_merge_id();
            data.references.retain(|r| r.merge_id != merge_id);
            if head == Some(merge_id) {
                self.mark_dirty(id);
            }
        }
    }

    // ── Dirty propagation ────────────────────────────────────────────

    /// Mark `id` and all its ancestors dirty and queue an update pass.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.nodes.get_mut(node) {
                Some(data) => data.dirty = true,
                None => break,
            }
            current = self.parent.get(node).copied();
        }
        self.scheduler.queue();
    }

    /// Mark every node dirty and queue an update pass.
    pub fn mark_all_dirty(&mut self) {
        for (_, data) in self.nodes.iter_mut() {
            data.dirty = true;
        }
        self.scheduler.queue();
    }

    // ── Traversal ────────────────────────────────────────────────────

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Post-order traversal: every node after all of its descendants.
    pub fn walk_post_order(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = self.walk_depth_first_mirrored(start);
        result.reverse();
        result
    }

    /// Pre-order walk visiting the last child first; its reverse is post-order.
    fn walk_depth_first_mirrored(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            stack.extend(self.children(current).iter().copied());
        }
        result
    }
}

impl Default for MergeTree {
    fn default() -> Self {
        Self::new()
    }
}
