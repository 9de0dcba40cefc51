// ============================================================================
// spark-fiber - Child Reconciliation
// Diffing a node's previous children against its next declared children
// ============================================================================
//
// Children are never detached here. A previous child that is not reused is
// appended to the parent's deletion list and the parent is flagged, so the
// committed tree stays walkable until the commit actually removes it.
//
// Reconciliation on a parent that has never been committed does not track
// side effects: its whole subtree is inserted at once by the nearest tracked
// ancestor's placement.
// ============================================================================

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::constants::{CHILD_DELETION, PLACEMENT};
use crate::core::types::{NodeId, SlotKey, WorkTag};
use crate::fiber::node::{clone_for_work, materialize_element, materialize_text, Arena};
use crate::host::HostConfig;
use crate::primitives::element::{Element, ElementType, Node};
use crate::primitives::props::Props;

pub(crate) struct ChildReconciler<'a, H: HostConfig> {
    arena: &'a mut Arena<H>,
    allocated: &'a mut Vec<NodeId>,
    track: bool,
}

impl<'a, H: HostConfig> ChildReconciler<'a, H> {
    pub(crate) fn new(arena: &'a mut Arena<H>, allocated: &'a mut Vec<NodeId>, track: bool) -> Self {
        Self {
            arena,
            allocated,
            track,
        }
    }

    /// Reconcile `parent`'s children, starting from its previous first
    /// child, and return the new first child.
    pub(crate) fn reconcile(
        &mut self,
        parent: NodeId,
        current_first: Option<NodeId>,
        next: &Node,
    ) -> Option<NodeId> {
        let next = match next {
            Node::Element(el) if matches!(el.element_type, ElementType::Fragment) && el.key.is_none() => {
                &el.props.children
            }
            other => other,
        };

        match next {
            Node::Element(el) => {
                let child = self.reconcile_single_element(parent, current_first, el);
                Some(self.place_single_child(child))
            }
            Node::Text(content) => {
                let child = self.reconcile_single_text(parent, current_first, content.clone());
                Some(self.place_single_child(child))
            }
            Node::List(items) => self.reconcile_children_array(parent, current_first, items),
            Node::Empty => {
                self.delete_remaining_children(parent, current_first);
                None
            }
        }
    }

    // =========================================================================
    // BOOKKEEPING
    // =========================================================================

    fn delete_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.track {
            return;
        }
        let node = &mut self.arena[parent];
        node.deletions.push(child);
        node.flags |= CHILD_DELETION;
    }

    fn delete_remaining_children(&mut self, parent: NodeId, mut current: Option<NodeId>) {
        if !self.track {
            return;
        }
        while let Some(child) = current {
            self.delete_child(parent, child);
            current = self.arena[child].sibling;
        }
    }

    /// Reuse `current` for the next render as an only child.
    fn use_node(&mut self, current: NodeId, props: Rc<Props>) -> NodeId {
        let clone = clone_for_work(self.arena, self.allocated, current, props);
        let node = &mut self.arena[clone];
        node.index = 0;
        node.sibling = None;
        clone
    }

    fn place_single_child(&mut self, child: NodeId) -> NodeId {
        let node = &mut self.arena[child];
        if self.track && node.alternate.is_none() {
            node.flags |= PLACEMENT;
        }
        child
    }

    /// Record the new position and decide whether the host node must move.
    ///
    /// A reused node whose previous index is below `last_placed_index` was
    /// overtaken by a node placed before it and is flagged for placement.
    fn place_child(&mut self, child: NodeId, last_placed_index: usize, new_index: usize) -> usize {
        self.arena[child].index = new_index;
        if !self.track {
            return last_placed_index;
        }

        let old_index = self.arena[child]
            .alternate
            .and_then(|current| self.arena.get(current))
            .map(|current| current.index);

        match old_index {
            Some(old) if old >= last_placed_index => old,
            _ => {
                self.arena[child].flags |= PLACEMENT;
                last_placed_index
            }
        }
    }

    fn same_type(&self, node: NodeId, element: &Element) -> bool {
        self.arena[node]
            .element_type
            .as_ref()
            .is_some_and(|ty| ty.same_type(&element.element_type))
    }

    // =========================================================================
    // SINGLE CHILD
    // =========================================================================

    fn reconcile_single_element(
        &mut self,
        parent: NodeId,
        current_first: Option<NodeId>,
        element: &Element,
    ) -> NodeId {
        let mut child = current_first;
        while let Some(current) = child {
            if self.arena[current].key == element.key {
                if self.same_type(current, element) {
                    let sibling = self.arena[current].sibling;
                    self.delete_remaining_children(parent, sibling);
                    let existing = self.use_node(current, element.props.clone());
                    let node = &mut self.arena[existing];
                    node.node_ref = element.node_ref.clone();
                    node.parent = Some(parent);
                    return existing;
                }
                self.delete_remaining_children(parent, Some(current));
                break;
            }
            self.delete_child(parent, current);
            child = self.arena[current].sibling;
        }

        let created = materialize_element(self.arena, self.allocated, element);
        self.arena[created].parent = Some(parent);
        created
    }

    fn reconcile_single_text(
        &mut self,
        parent: NodeId,
        current_first: Option<NodeId>,
        content: Rc<str>,
    ) -> NodeId {
        if let Some(current) = current_first.filter(|c| self.arena[*c].tag == WorkTag::HostText) {
            let sibling = self.arena[current].sibling;
            self.delete_remaining_children(parent, sibling);
            let existing = self.use_node(current, Rc::new(Props::text(content)));
            self.arena[existing].parent = Some(parent);
            return existing;
        }

        self.delete_remaining_children(parent, current_first);
        let created = materialize_text(self.arena, self.allocated, content);
        self.arena[created].parent = Some(parent);
        created
    }

    // =========================================================================
    // ARRAYS
    // =========================================================================

    fn map_remaining_children(&self, mut current: Option<NodeId>) -> FxHashMap<SlotKey, NodeId> {
        let mut existing = FxHashMap::default();
        while let Some(id) = current {
            let node = &self.arena[id];
            existing.insert(SlotKey::new(node.key.as_ref(), node.index), id);
            current = node.sibling;
        }
        existing
    }

    fn reconcile_children_array(
        &mut self,
        parent: NodeId,
        current_first: Option<NodeId>,
        items: &[Node],
    ) -> Option<NodeId> {
        let mut existing = self.map_remaining_children(current_first);
        let mut first: Option<NodeId> = None;
        let mut previous: Option<NodeId> = None;
        let mut last_placed_index = 0;

        for (index, item) in items.iter().enumerate() {
            let Some(child) = self.update_from_map(&mut existing, parent, index, item) else {
                continue;
            };
            last_placed_index = self.place_child(child, last_placed_index, index);
            match previous {
                Some(prev) => self.arena[prev].sibling = Some(child),
                None => first = Some(child),
            }
            previous = Some(child);
        }

        if self.track {
            let mut leftover: Vec<NodeId> = existing.into_values().collect();
            leftover.sort_by_key(|id| self.arena[*id].index);
            for child in leftover {
                self.delete_child(parent, child);
            }
        }

        first
    }

    /// Build the child for position `index`, reusing the previous child with
    /// the same slot key when its type matches.
    fn update_from_map(
        &mut self,
        existing: &mut FxHashMap<SlotKey, NodeId>,
        parent: NodeId,
        index: usize,
        item: &Node,
    ) -> Option<NodeId> {
        let child = match item {
            Node::Empty => return None,
            Node::List(_) => {
                tracing::warn!(index, "nested child lists are not supported; skipping");
                return None;
            }
            Node::Text(content) => {
                let slot = SlotKey::Index(index);
                let matched = existing
                    .get(&slot)
                    .copied()
                    .filter(|c| self.arena[*c].tag == WorkTag::HostText);
                match matched {
                    Some(current) => {
                        existing.remove(&slot);
                        self.use_node(current, Rc::new(Props::text(content.clone())))
                    }
                    None => materialize_text(self.arena, self.allocated, content.clone()),
                }
            }
            Node::Element(el) => {
                let slot = SlotKey::new(el.key.as_ref(), index);
                let matched = existing
                    .get(&slot)
                    .copied()
                    .filter(|c| self.arena[*c].key == el.key && self.same_type(*c, el));
                match matched {
                    Some(current) => {
                        existing.remove(&slot);
                        let reused = self.use_node(current, el.props.clone());
                        self.arena[reused].node_ref = el.node_ref.clone();
                        reused
                    }
                    None => materialize_element(self.arena, self.allocated, el),
                }
            }
        };

        self.arena[child].parent = Some(parent);
        Some(child)
    }
}

// =============================================================================
// TESTS
// =============================================================================
