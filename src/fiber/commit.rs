// ============================================================================
// spark-fiber - Commit
// Apply a finished tree to the host, swap trees, run effects
// ============================================================================
//
// The mutation traversal is post-order and skips any subtree whose
// `subtree_flags` are empty, so a commit costs O(flagged nodes). Flags are
// cleared as they are applied. Refs are attached after the current pointer
// moves to the finished tree; passive effects run later, outside the commit.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::{
    LAYOUT_MASK, MUTATION_MASK, NO_FLAGS, PASSIVE_EFFECT, PASSIVE_MASK, PLACEMENT, REF, UPDATE,
};
use crate::core::lanes::{merge_lanes, remove_lanes, Lane, NO_LANE};
use crate::core::types::{NodeId, WorkTag};
use crate::fiber::node::{release, Arena};
use crate::fiber::work_loop::{ensure_root_is_scheduled, RootInner, RootState, ScheduledCallback};
use crate::host::HostConfig;
use crate::reactivity::hooks::Effect;
use crate::reactivity::scheduling::flush_sync_callbacks;
use crate::scheduler::{PriorityLevel, Task};

/// Host work done by one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Nodes inserted or moved
    pub placements: usize,
    /// Text or prop updates
    pub updates: usize,
    /// Subtrees removed
    pub deletions: usize,
}

struct CommitScope<'a, H: HostConfig> {
    arena: &'a mut Arena<H>,
    host: &'a H,
    container: &'a H::Handle,
    stats: CommitStats,
    passive_unmount: &'a mut Vec<Rc<Effect>>,
    passive_update: &'a mut Vec<Rc<Effect>>,
    layout: Vec<NodeId>,
    released: Vec<NodeId>,
}

/// Commit the finished pass, if any. Returns the committed lane.
pub(crate) fn commit_root<H: HostConfig>(root: &RootInner<H>, state: &mut RootState<H>) -> Option<Lane> {
    let finished = state.finished_work.take()?;
    let lane = std::mem::replace(&mut state.finished_lane, NO_LANE);

    state.callback_node = None;
    state.callback_priority = NO_LANE;

    let remaining = {
        let node = &state.arena[finished];
        merge_lanes(node.lanes, node.child_lanes)
    };
    state.pending_lanes = merge_lanes(
        remove_lanes(state.pending_lanes, lane),
        merge_lanes(remaining, state.interleaved_lanes),
    );
    state.interleaved_lanes = 0;

    let all_flags = {
        let node = &state.arena[finished];
        node.flags | node.subtree_flags
    };
    if all_flags & PASSIVE_MASK != 0 && !state.passive_scheduled {
        state.passive_scheduled = true;
        let weak = root.self_weak.clone();
        root.scheduler.schedule_callback(
            PriorityLevel::Normal,
            Task::new(move |_| {
                if let Some(root) = weak.upgrade() {
                    flush_passive_effects(&root);
                }
                None
            }),
            0,
        );
    }

    tracing::debug!(lane, flags = all_flags, "commit");

    let (stats, layout) = {
        let RootState {
            arena,
            container,
            pending_passive_unmount,
            pending_passive_update,
            ..
        } = &mut *state;
        let mut scope = CommitScope {
            arena,
            host: &root.host,
            container,
            stats: CommitStats::default(),
            passive_unmount: pending_passive_unmount,
            passive_update: pending_passive_update,
            layout: Vec::new(),
            released: Vec::new(),
        };
        commit_mutation_effects(&mut scope, finished);
        for id in std::mem::take(&mut scope.released) {
            release(scope.arena, id);
        }
        (scope.stats, scope.layout)
    };

    state.current = finished;
    commit_layout_effects(&mut state.arena, &layout);

    state.allocated.clear();
    state.last_commit = stats;
    state.commit_count += 1;
    tracing::debug!(
        placements = stats.placements,
        updates = stats.updates,
        deletions = stats.deletions,
        "commit finished"
    );

    ensure_root_is_scheduled(root, state);
    Some(lane)
}

// =============================================================================
// MUTATION
// =============================================================================

fn commit_mutation_effects<H: HostConfig>(scope: &mut CommitScope<'_, H>, id: NodeId) {
    let deletions = std::mem::take(&mut scope.arena[id].deletions);
    for deleted in deletions {
        commit_deletion(scope, id, deleted);
        scope.stats.deletions += 1;
    }

    if scope.arena[id].subtree_flags & (MUTATION_MASK | PASSIVE_EFFECT | LAYOUT_MASK) != NO_FLAGS {
        let mut child = scope.arena[id].child;
        while let Some(c) = child {
            commit_mutation_effects(scope, c);
            child = scope.arena[c].sibling;
        }
    }

    let flags = scope.arena[id].flags;
    if flags & PLACEMENT != 0 {
        commit_placement(scope, id);
        scope.stats.placements += 1;
    }
    if flags & UPDATE != 0 {
        commit_update(scope, id);
        scope.stats.updates += 1;
    }
    if flags & PASSIVE_EFFECT != 0 {
        let effects = scope.arena[id].effects.iter().filter(|e| e.has_effect()).cloned();
        scope.passive_update.extend(effects);
    }
    if flags & REF != 0 {
        scope.layout.push(id);
    }

    let node = &mut scope.arena[id];
    node.flags = NO_FLAGS;
    node.subtree_flags = NO_FLAGS;
}

fn is_host_parent(tag: WorkTag) -> bool {
    matches!(tag, WorkTag::HostComponent | WorkTag::HostRoot)
}

/// Host instance that `id`'s host nodes live in: the nearest host ancestor,
/// or the container.
fn get_host_parent<H: HostConfig>(scope: &CommitScope<'_, H>, id: NodeId) -> H::Handle {
    let mut parent = scope.arena[id].parent;
    while let Some(p) = parent {
        let node = &scope.arena[p];
        match node.tag {
            WorkTag::HostComponent => {
                if let Some(instance) = &node.state_node {
                    return instance.clone();
                }
            }
            WorkTag::HostRoot => break,
            _ => {}
        }
        parent = node.parent;
    }
    scope.container.clone()
}

/// First host instance after `id` in host order whose position is settled.
fn get_host_sibling<H: HostConfig>(arena: &Arena<H>, id: NodeId) -> Option<H::Handle> {
    let mut node = id;
    'siblings: loop {
        while arena[node].sibling.is_none() {
            let parent = arena[node].parent?;
            if is_host_parent(arena[parent].tag) {
                return None;
            }
            node = parent;
        }
        node = arena[node].sibling?;

        while !arena[node].tag.is_host() {
            if arena[node].flags & PLACEMENT != 0 {
                continue 'siblings;
            }
            match arena[node].child {
                Some(child) => node = child,
                None => continue 'siblings,
            }
        }

        if arena[node].flags & PLACEMENT == 0 {
            if let Some(instance) = &arena[node].state_node {
                return Some(instance.clone());
            }
        }
    }
}

fn commit_placement<H: HostConfig>(scope: &mut CommitScope<'_, H>, id: NodeId) {
    let parent = get_host_parent(scope, id);
    let before = get_host_sibling(scope.arena, id);
    insert_or_append(scope.arena, scope.host, id, before.as_ref(), &parent);
}

fn insert_or_append<H: HostConfig>(
    arena: &Arena<H>,
    host: &H,
    id: NodeId,
    before: Option<&H::Handle>,
    parent: &H::Handle,
) {
    let node = &arena[id];
    if node.tag.is_host() {
        if let Some(instance) = &node.state_node {
            match before {
                Some(before) => host.insert_before(parent, instance, before),
                None => host.append_child(parent, instance),
            }
        }
        return;
    }

    let mut child = node.child;
    while let Some(c) = child {
        insert_or_append(arena, host, c, before, parent);
        child = arena[c].sibling;
    }
}

fn commit_update<H: HostConfig>(scope: &mut CommitScope<'_, H>, id: NodeId) {
    let node = &scope.arena[id];
    let (Some(instance), Some(props)) = (&node.state_node, &node.memoized_props) else {
        return;
    };
    match node.tag {
        WorkTag::HostText => scope.host.set_text_content(instance, props.content()),
        WorkTag::HostComponent => scope.host.apply_props(instance, props),
        _ => {}
    }
}

// =============================================================================
// DELETION
// =============================================================================

fn commit_deletion<H: HostConfig>(scope: &mut CommitScope<'_, H>, parent: NodeId, deleted: NodeId) {
    let host_parent = match scope.arena[parent].tag {
        WorkTag::HostComponent => scope.arena[parent].state_node.clone(),
        _ => None,
    }
    .unwrap_or_else(|| get_host_parent(scope, parent));
    tracing::trace!(node = %scope.arena[deleted].label(), "deleting subtree");

    unmount_subtree(scope, deleted, Some(&host_parent));
    detach_subtree(scope, deleted);
}

/// Visit a deleted subtree. Only its top-level host nodes are removed from
/// `remove_from`; everything below goes with them.
fn unmount_subtree<H: HostConfig>(
    scope: &mut CommitScope<'_, H>,
    id: NodeId,
    remove_from: Option<&H::Handle>,
) {
    let tag = scope.arena[id].tag;

    if tag == WorkTag::HostComponent {
        if let Some(node_ref) = &scope.arena[id].node_ref {
            node_ref.detach();
        }
    }
    if tag == WorkTag::FunctionComponent {
        let effects = scope.arena[id].effects.iter().filter(|e| e.is_passive()).cloned();
        scope.passive_unmount.extend(effects);
    }

    let below = if tag.is_host() { None } else { remove_from };
    let mut child = scope.arena[id].child;
    while let Some(c) = child {
        unmount_subtree(scope, c, below);
        child = scope.arena[c].sibling;
    }

    if tag.is_host() {
        if let (Some(parent), Some(instance)) = (remove_from, &scope.arena[id].state_node) {
            scope.host.remove_child(parent, instance);
        }
    }
}

/// Sever the deleted subtree and queue its nodes, and their alternates, for
/// release.
fn detach_subtree<H: HostConfig>(scope: &mut CommitScope<'_, H>, id: NodeId) {
    let mut stack = vec![id];
    while let Some(n) = stack.pop() {
        let Some(node) = scope.arena.get_mut(n) else {
            continue;
        };
        let mut child = node.child.take();
        node.parent = None;
        node.sibling = None;
        let alternate = node.alternate;

        while let Some(c) = child {
            stack.push(c);
            child = scope.arena.get(c).and_then(|n| n.sibling);
        }
        scope.released.push(n);
        scope.released.extend(alternate);
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

fn commit_layout_effects<H: HostConfig>(arena: &mut Arena<H>, layout: &[NodeId]) {
    for &id in layout {
        let Some(node) = arena.get(id) else {
            continue;
        };
        let previous = node
            .alternate
            .and_then(|alt| arena.get(alt))
            .and_then(|alt| alt.node_ref.clone());

        if let Some(previous) = previous.filter(|p| Some(p) != node.node_ref.as_ref()) {
            previous.detach();
        }
        if let (Some(node_ref), Some(instance)) = (&node.node_ref, &node.state_node) {
            node_ref.attach(instance.clone());
        }
    }
}

// =============================================================================
// PASSIVE EFFECTS
// =============================================================================

/// Run queued passive effects: every cleanup first (unmounted instances,
/// then updated ones), then every create. Returns whether anything ran.
pub(crate) fn flush_passive_effects<H: HostConfig>(root: &RootInner<H>) -> bool {
    let (unmount, update) = {
        let Ok(mut state) = root.state.try_borrow_mut() else {
            return false;
        };
        state.passive_scheduled = false;
        (
            std::mem::take(&mut state.pending_passive_unmount),
            std::mem::take(&mut state.pending_passive_update),
        )
    };

    if unmount.is_empty() && update.is_empty() {
        return false;
    }
    tracing::trace!(unmount = unmount.len(), update = update.len(), "flushing passive effects");

    for effect in &unmount {
        effect.destroy();
    }
    for effect in &update {
        effect.destroy();
    }
    for effect in &update {
        effect.create();
    }

    flush_sync_callbacks();

    if let Ok(mut state) = root.state.try_borrow_mut() {
        if state.callback_node != Some(ScheduledCallback::Sync) {
            ensure_root_is_scheduled(root, &mut state);
        }
    }
    true
}
