// ============================================================================
// spark-fiber - Work Nodes
// The arena of work nodes and the two ways nodes come into being
// ============================================================================
//
// Every tree position has up to two nodes: the committed one and the one
// being worked on. They point at each other through `alternate` and swap
// roles at every commit, so a stable tree renders without allocating.
// ============================================================================

use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::core::constants::NO_FLAGS;
use crate::core::lanes::{Lanes, NO_LANES};
use crate::core::types::{Key, NodeId, WorkTag};
use crate::host::HostConfig;
use crate::primitives::context::ContextId;
use crate::primitives::element::{Element, ElementType};
use crate::primitives::node_ref::NodeRef;
use crate::primitives::props::Props;
use crate::reactivity::hooks::{Effect, Hook};
use crate::reactivity::ring::Ring;

pub(crate) type Arena<H> = SlotMap<NodeId, FiberNode<H>>;

/// One instance of a tree position.
pub(crate) struct FiberNode<H: HostConfig> {
    pub tag: WorkTag,
    pub key: Option<Key>,
    pub element_type: Option<ElementType>,

    /// Props for the render in progress
    pub pending_props: Rc<Props>,
    /// Props of the last completed render
    pub memoized_props: Option<Rc<Props>>,

    pub parent: Option<NodeId>,
    pub child: Option<NodeId>,
    pub sibling: Option<NodeId>,
    pub index: usize,

    pub state_node: Option<H::Handle>,

    /// Hook cells (component) or the root element cell (root)
    pub hooks: Vec<Hook>,
    pub effects: Ring<Rc<Effect>>,

    pub lanes: Lanes,
    pub child_lanes: Lanes,

    pub flags: u32,
    pub subtree_flags: u32,
    pub deletions: Vec<NodeId>,

    pub alternate: Option<NodeId>,
    pub node_ref: Option<NodeRef>,

    /// Contexts read by the last render
    pub context_deps: SmallVec<[ContextId; 2]>,
}

impl<H: HostConfig> FiberNode<H> {
    pub(crate) fn new(
        tag: WorkTag,
        key: Option<Key>,
        element_type: Option<ElementType>,
        pending_props: Rc<Props>,
    ) -> Self {
        Self {
            tag,
            key,
            element_type,
            pending_props,
            memoized_props: None,
            parent: None,
            child: None,
            sibling: None,
            index: 0,
            state_node: None,
            hooks: Vec::new(),
            effects: Ring::new(),
            lanes: NO_LANES,
            child_lanes: NO_LANES,
            flags: NO_FLAGS,
            subtree_flags: NO_FLAGS,
            deletions: Vec::new(),
            alternate: None,
            node_ref: None,
            context_deps: SmallVec::new(),
        }
    }

    /// Human-readable name for diagnostics.
    pub(crate) fn label(&self) -> String {
        match &self.element_type {
            Some(ty) => format!("{:?}", ty),
            None => format!("{:?}", self.tag),
        }
    }
}

impl<H: HostConfig> fmt::Debug for FiberNode<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiberNode")
            .field("tag", &self.tag)
            .field("type", &self.element_type)
            .field("key", &self.key)
            .field("flags", &format_args!("{:#b}", self.flags))
            .field("lanes", &format_args!("{:#b}", self.lanes))
            .finish()
    }
}

// =============================================================================
// CLONE FOR WORK
// =============================================================================

/// The work-in-progress twin of `current`, ready to render with `props`.
///
/// Reuses the existing alternate when there is one and allocates it
/// otherwise. Effect bits and deletions are reset; children, memoized
/// output, hooks, lanes and ref are carried over from `current`.
pub(crate) fn clone_for_work<H: HostConfig>(
    arena: &mut Arena<H>,
    allocated: &mut Vec<NodeId>,
    current: NodeId,
    props: Rc<Props>,
) -> NodeId {
    let existing = arena[current]
        .alternate
        .filter(|alt| arena.contains_key(*alt));

    let wip = match existing {
        Some(wip) => {
            let node = &mut arena[wip];
            node.pending_props = props;
            node.flags = NO_FLAGS;
            node.subtree_flags = NO_FLAGS;
            node.deletions.clear();
            wip
        }
        None => {
            let cur = &arena[current];
            let mut node = FiberNode::new(cur.tag, cur.key.clone(), cur.element_type.clone(), props);
            node.state_node = cur.state_node.clone();
            node.alternate = Some(current);
            let wip = arena.insert(node);
            arena[current].alternate = Some(wip);
            allocated.push(wip);
            wip
        }
    };

    let cur = &arena[current];
    let child = cur.child;
    let sibling = cur.sibling;
    let index = cur.index;
    let memoized_props = cur.memoized_props.clone();
    let hooks = cur.hooks.clone();
    let effects = cur.effects.clone();
    let lanes = cur.lanes;
    let child_lanes = cur.child_lanes;
    let node_ref = cur.node_ref.clone();
    let context_deps = cur.context_deps.clone();

    let node = &mut arena[wip];
    node.child = child;
    node.sibling = sibling;
    node.index = index;
    node.memoized_props = memoized_props;
    node.hooks = hooks;
    node.effects = effects;
    node.lanes = lanes;
    node.child_lanes = child_lanes;
    node.node_ref = node_ref;
    node.context_deps = context_deps;
    wip
}

// =============================================================================
// MATERIALIZE
// =============================================================================

/// A brand-new node for `element`, with no alternate.
pub(crate) fn materialize_element<H: HostConfig>(
    arena: &mut Arena<H>,
    allocated: &mut Vec<NodeId>,
    element: &Element,
) -> NodeId {
    let mut node = FiberNode::new(
        element.element_type.work_tag(),
        element.key.clone(),
        Some(element.element_type.clone()),
        element.props.clone(),
    );
    node.node_ref = element.node_ref.clone();
    let id = arena.insert(node);
    allocated.push(id);
    id
}

/// A brand-new text node.
pub(crate) fn materialize_text<H: HostConfig>(
    arena: &mut Arena<H>,
    allocated: &mut Vec<NodeId>,
    content: Rc<str>,
) -> NodeId {
    let node = FiberNode::new(WorkTag::HostText, None, None, Rc::new(Props::text(content)));
    let id = arena.insert(node);
    allocated.push(id);
    id
}

// =============================================================================
// RELEASE
// =============================================================================

/// Remove a node from the arena and unlink it from its alternate.
///
/// Children of the alternate that were re-parented onto the released node
/// during a bailout are pointed back at the alternate.
pub(crate) fn release<H: HostConfig>(arena: &mut Arena<H>, id: NodeId) {
    let Some(node) = arena.remove(id) else {
        return;
    };
    let Some(alt) = node.alternate else {
        return;
    };
    let Some(alternate) = arena.get_mut(alt) else {
        return;
    };
    if alternate.alternate == Some(id) {
        alternate.alternate = None;
    }

    let mut child = alternate.child;
    while let Some(c) = child {
        let Some(node) = arena.get_mut(c) else {
            break;
        };
        if node.parent == Some(id) {
            node.parent = Some(alt);
        }
        child = node.sibling;
    }
}

/// Parent of `id`, falling back to its alternate's parent when the direct
/// link is stale.
pub(crate) fn parent_of<H: HostConfig>(arena: &Arena<H>, id: NodeId) -> Option<NodeId> {
    let node = arena.get(id)?;
    node.parent
        .filter(|p| arena.contains_key(*p))
        .or_else(|| {
            node.alternate
                .and_then(|alt| arena.get(alt))
                .and_then(|alt| alt.parent)
                .filter(|p| arena.contains_key(*p))
        })
}

// =============================================================================
// TESTS
// =============================================================================
