// ============================================================================
// spark-fiber - Begin Phase
// Render a node and reconcile its children, or bail out
// ============================================================================

use std::rc::Rc;

use crate::core::constants::REF;
use crate::core::lanes::{includes_some_lane, merge_lanes, Lane, NO_LANES};
use crate::core::types::{NodeId, WorkTag};
use crate::error::RenderError;
use crate::fiber::child::ChildReconciler;
use crate::fiber::node::{clone_for_work, Arena};
use crate::fiber::work_loop::RenderScope;
use crate::host::HostConfig;
use crate::primitives::context::{AnyContext, ContextId};
use crate::primitives::element::{ElementType, Node};
use crate::primitives::props::VALUE_PROP;
use crate::reactivity::hooks::{Hook, Hooks, StateHook};

/// Do the render work of `wip` and return the child to work on next.
pub(crate) fn begin_work<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
) -> Result<Option<NodeId>, RenderError> {
    let current = scope.arena[wip].alternate;

    if let Some(current) = current {
        let cur = &scope.arena[current];
        let node = &scope.arena[wip];
        let same_props = cur
            .memoized_props
            .as_ref()
            .is_some_and(|old| Rc::ptr_eq(old, &node.pending_props));
        if same_props && !includes_some_lane(node.lanes, scope.lane) {
            return Ok(bailout(scope, wip));
        }
    }

    scope.arena[wip].lanes = NO_LANES;

    match scope.arena[wip].tag {
        WorkTag::HostRoot => Ok(update_host_root(scope, wip, current)),
        WorkTag::HostComponent => {
            mark_ref(scope.arena, current, wip);
            let props = scope.arena[wip].pending_props.clone();
            Ok(reconcile_children(scope, wip, current, &props.children))
        }
        WorkTag::HostText => Ok(None),
        WorkTag::FunctionComponent => update_function_component(scope, wip, current),
        WorkTag::Fragment => {
            let props = scope.arena[wip].pending_props.clone();
            Ok(reconcile_children(scope, wip, current, &props.children))
        }
        WorkTag::ContextProvider => Ok(update_context_provider(scope, wip, current)),
    }
}

fn reconcile_children<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
    current: Option<NodeId>,
    next: &Node,
) -> Option<NodeId> {
    let current_first = current.and_then(|c| scope.arena[c].child);
    let mut reconciler = ChildReconciler::new(scope.arena, scope.allocated, current.is_some());
    let child = reconciler.reconcile(wip, current_first, next);
    scope.arena[wip].child = child;
    child
}

fn mark_ref<H: HostConfig>(arena: &mut Arena<H>, current: Option<NodeId>, wip: NodeId) {
    let changed = match current {
        None => arena[wip].node_ref.is_some(),
        Some(current) => arena[current].node_ref != arena[wip].node_ref,
    };
    if changed {
        arena[wip].flags |= REF;
    }
}

// =============================================================================
// BAILOUT
// =============================================================================

/// Skip rendering `wip`. Its children are cloned only when some of them
/// have work at this lane.
fn bailout<H: HostConfig>(scope: &mut RenderScope<'_, H>, wip: NodeId) -> Option<NodeId> {
    if scope.arena[wip].tag == WorkTag::ContextProvider {
        push_provider(scope, wip);
    }

    if !includes_some_lane(scope.lane, scope.arena[wip].child_lanes) {
        tracing::trace!(node = ?wip, "subtree bailout");
        return None;
    }

    clone_child_fibers(scope, wip);
    scope.arena[wip].child
}

fn clone_child_fibers<H: HostConfig>(scope: &mut RenderScope<'_, H>, wip: NodeId) {
    let mut current_child = scope.arena[wip].child;
    let mut previous: Option<NodeId> = None;

    while let Some(current) = current_child {
        let props = scope.arena[current].pending_props.clone();
        let clone = clone_for_work(scope.arena, scope.allocated, current, props);
        scope.arena[clone].parent = Some(wip);
        match previous {
            Some(prev) => scope.arena[prev].sibling = Some(clone),
            None => scope.arena[wip].child = Some(clone),
        }
        previous = Some(clone);
        current_child = scope.arena[current].sibling;
    }

    if let Some(last) = previous {
        scope.arena[last].sibling = None;
    }
}

// =============================================================================
// ROOT
// =============================================================================

pub(crate) fn root_state<H: HostConfig>(arena: &Arena<H>, root: NodeId) -> Option<Rc<StateHook<Node>>> {
    match arena.get(root)?.hooks.first()? {
        Hook::State(any) => any.clone().downcast::<StateHook<Node>>().ok(),
        _ => None,
    }
}

fn update_host_root<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
    current: Option<NodeId>,
) -> Option<NodeId> {
    let Some(state) = root_state(scope.arena, current.unwrap_or(wip)) else {
        tracing::error!(node = ?wip, "root node without an element cell");
        return None;
    };

    let (next, skipped) = state.next(scope.lane);
    let children = next.value().clone();

    let node = &mut scope.arena[wip];
    node.hooks = vec![Hook::State(Rc::new(next))];
    node.lanes = merge_lanes(node.lanes, skipped);

    reconcile_children(scope, wip, current, &children)
}

// =============================================================================
// FUNCTION COMPONENTS
// =============================================================================

fn update_function_component<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
    current: Option<NodeId>,
) -> Result<Option<NodeId>, RenderError> {
    let node = &scope.arena[wip];
    let Some(ElementType::Component(component)) = node.element_type.clone() else {
        tracing::warn!(node = ?wip, "function component node without a component");
        return Ok(None);
    };
    let props = node.pending_props.clone();

    let rendered = {
        let current_hooks = current.map(|c| &scope.arena[c].hooks[..]);
        let mut hooks = Hooks::new(wip, current_hooks, scope.lane, scope.target.clone(), &*scope.contexts);
        let output = component.render(&mut hooks, &props)?;
        (output, hooks.finish())
    };
    let (output, hooks) = rendered;

    tracing::trace!(component = component.name(), node = ?wip, "rendered");

    let node = &mut scope.arena[wip];
    node.hooks = hooks.hooks;
    node.effects = hooks.effects;
    node.flags |= hooks.flags;
    node.lanes = merge_lanes(node.lanes, hooks.skipped_lanes);
    node.context_deps = hooks.context_deps;

    Ok(reconcile_children(scope, wip, current, &output))
}

// =============================================================================
// CONTEXT PROVIDERS
// =============================================================================

fn provider_context<H: HostConfig>(arena: &Arena<H>, node: NodeId) -> Option<AnyContext> {
    match &arena[node].element_type {
        Some(ElementType::Provider(context)) => Some(context.clone()),
        _ => None,
    }
}

fn push_provider<H: HostConfig>(scope: &mut RenderScope<'_, H>, wip: NodeId) {
    let Some(context) = provider_context(scope.arena, wip) else {
        return;
    };
    let value = scope.arena[wip]
        .pending_props
        .get_any(VALUE_PROP)
        .cloned()
        .unwrap_or_else(|| context.default_value());
    scope.contexts.push(context.id(), value);
}

fn update_context_provider<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    wip: NodeId,
    current: Option<NodeId>,
) -> Option<NodeId> {
    push_provider(scope, wip);

    if let (Some(current), Some(context)) = (current, provider_context(scope.arena, wip)) {
        let old = scope.arena[current]
            .memoized_props
            .as_ref()
            .and_then(|p| p.get_any(VALUE_PROP).cloned());
        let new = scope.arena[wip].pending_props.get_any(VALUE_PROP).cloned();
        let changed = match (old, new) {
            (Some(old), Some(new)) => !context.same_value(&*old, &*new),
            (None, None) => false,
            _ => true,
        };
        if changed {
            let first = scope.arena[wip].child;
            propagate_context_change(scope.arena, first, context.id(), scope.lane);
        }
    }

    let props = scope.arena[wip].pending_props.clone();
    reconcile_children(scope, wip, current, &props.children)
}

/// Schedule `lane` on every consumer of `context` below `first`, stopping at
/// nested providers of the same context. Returns whether any was found.
fn propagate_context_change<H: HostConfig>(
    arena: &mut Arena<H>,
    first: Option<NodeId>,
    context: ContextId,
    lane: Lane,
) -> bool {
    let mut found = false;
    let mut next = first;

    while let Some(id) = next {
        let mut hit = false;

        if arena[id].context_deps.contains(&context) {
            mark_lane(arena, id, lane, false);
            hit = true;
        }

        let shadowed = provider_context(arena, id).is_some_and(|c| c.id() == context);
        let child = arena[id].child;
        if !shadowed && propagate_context_change(arena, child, context, lane) {
            mark_lane(arena, id, lane, true);
            hit = true;
        }

        found |= hit;
        next = arena[id].sibling;
    }

    found
}

/// Add `lane` to a node and its alternate, as pending work on the node
/// itself or below it.
pub(crate) fn mark_lane<H: HostConfig>(arena: &mut Arena<H>, id: NodeId, lane: Lane, below: bool) {
    let alternate = arena.get(id).and_then(|n| n.alternate);
    for target in std::iter::once(id).chain(alternate) {
        if let Some(node) = arena.get_mut(target) {
            if below {
                node.child_lanes = merge_lanes(node.child_lanes, lane);
            } else {
                node.lanes = merge_lanes(node.lanes, lane);
            }
        }
    }
}
