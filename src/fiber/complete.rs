// ============================================================================
// spark-fiber - Complete Phase
// Create host instances bottom-up and bubble flags and lanes
// ============================================================================

use std::rc::Rc;

use crate::core::constants::{NO_FLAGS, UPDATE};
use crate::core::lanes::{merge_lanes, NO_LANES};
use crate::core::types::{NodeId, WorkTag};
use crate::fiber::node::Arena;
use crate::fiber::work_loop::RenderScope;
use crate::host::HostConfig;
use crate::primitives::element::ElementType;

pub(crate) fn complete_work<H: HostConfig>(scope: &mut RenderScope<'_, H>, wip: NodeId) {
    let current = scope.arena[wip].alternate;

    match scope.arena[wip].tag {
        WorkTag::HostComponent => complete_host_component(scope, wip, current),
        WorkTag::HostText => complete_host_text(scope, wip, current),
        WorkTag::ContextProvider => {
            if let Some(ElementType::Provider(context)) = &scope.arena[wip].element_type {
                scope.contexts.pop(context.id());
            }
        }
        WorkTag::HostRoot | WorkTag::FunctionComponent | WorkTag::Fragment => {}
    }

    bubble_properties(scope.arena, wip);
}

fn complete_host_component<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
    current: Option<NodeId>,
) {
    let node = &scope.arena[wip];
    let props = node.pending_props.clone();
    let mounted = node.state_node.is_some();

    if let (Some(current), true) = (current, mounted) {
        let changed = scope.arena[current]
            .memoized_props
            .as_ref()
            .is_none_or(|old| !Rc::ptr_eq(old, &props) && !old.same_attrs(&props));
        if changed {
            scope.arena[wip].flags |= UPDATE;
        }
        return;
    }

    let Some(ElementType::Host(kind)) = &node.element_type else {
        tracing::warn!(node = ?wip, "host node without a host type");
        return;
    };
    let instance = scope.host.create_element_instance(kind, &props);
    append_all_children(scope.arena, scope.host, &instance, node.child);
    scope.arena[wip].state_node = Some(instance);
}

fn complete_host_text<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
    current: Option<NodeId>,
) {
    let node = &scope.arena[wip];
    let content = node.pending_props.content();
    let mounted = node.state_node.is_some();

    if let (Some(current), true) = (current, mounted) {
        let old = scope.arena[current].memoized_props.as_ref().map(|p| p.content());
        if old != Some(content) {
            scope.arena[wip].flags |= UPDATE;
        }
        return;
    }

    let instance = scope.host.create_text_instance(content);
    scope.arena[wip].state_node = Some(instance);
}

/// Append the top-level host instances of a fresh subtree to `parent`.
fn append_all_children<H: HostConfig>(
    arena: &Arena<H>,
    host: &H,
    parent: &H::Handle,
    first: Option<NodeId>,
) {
    let mut next = first;
    while let Some(id) = next {
        let node = &arena[id];
        if node.tag.is_host() {
            if let Some(instance) = &node.state_node {
                host.append_child(parent, instance);
            }
        } else {
            append_all_children(arena, host, parent, node.child);
        }
        next = node.sibling;
    }
}

/// Fold the children's flags and lanes into `wip`.
fn bubble_properties<H: HostConfig>(arena: &mut Arena<H>, wip: NodeId) {
    let mut subtree_flags = NO_FLAGS;
    let mut child_lanes = NO_LANES;
    let mut next = arena[wip].child;

    while let Some(id) = next {
        let child = &mut arena[id];
        subtree_flags |= child.subtree_flags | child.flags;
        child_lanes = merge_lanes(child_lanes, merge_lanes(child.lanes, child.child_lanes));
        child.parent = Some(wip);
        next = child.sibling;
    }

    let node = &mut arena[wip];
    node.subtree_flags |= subtree_flags;
    node.child_lanes = child_lanes;
}
