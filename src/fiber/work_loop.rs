// ============================================================================
// spark-fiber - Work Loop
// Scheduling decisions, render passes and their entry points
// ============================================================================
//
// A root is idle, scheduled, rendering (possibly paused between slices),
// complete, or committing. `ensure_root_is_scheduled` runs after every update
// and every commit and keeps at most one callback outstanding, at the
// priority of the most urgent pending lane.
//
// Component code runs while the root's state is borrowed. Updates that
// arrive during that window are parked in `interleaved` and applied once the
// borrow is released.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::lanes::{
    get_highest_priority_lane, lanes_to_priority, merge_lanes, request_update_lane, Lane, Lanes,
    NO_LANE, NO_LANES, SYNC_LANE,
};
use crate::core::types::{NodeId, WorkTag};
use crate::error::RenderError;
use crate::fiber::begin::{begin_work, mark_lane};
use crate::fiber::commit::{commit_root, flush_passive_effects, CommitStats};
use crate::fiber::complete::complete_work;
use crate::fiber::context_stack::ContextStack;
use crate::fiber::node::{clone_for_work, parent_of, release, Arena};
use crate::host::HostConfig;
use crate::primitives::element::Node;
use crate::reactivity::hooks::{Effect, UpdateTarget};
use crate::reactivity::scheduling::{flush_sync_callbacks, schedule_sync_callback};
use crate::reactivity::update_queue::StateQueue;
use crate::scheduler::{CallbackHandle, Scheduler, Task};

// =============================================================================
// ROOT STATE
// =============================================================================

/// The callback a root is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScheduledCallback {
    /// Queued on the sync callback queue; cannot be cancelled
    Sync,
    Task(CallbackHandle),
}

pub(crate) struct RootState<H: HostConfig> {
    pub arena: Arena<H>,
    pub current: NodeId,
    pub container: H::Handle,

    pub pending_lanes: Lanes,
    pub finished_work: Option<NodeId>,
    pub finished_lane: Lane,

    pub callback_node: Option<ScheduledCallback>,
    pub callback_priority: Lane,

    pub work_in_progress: Option<NodeId>,
    pub wip_root: Option<NodeId>,
    pub wip_root_render_lane: Lane,
    /// Lanes updated while a pass was in progress
    pub interleaved_lanes: Lanes,
    pub context_stack: ContextStack,
    /// Nodes created by the pass in progress
    pub allocated: Vec<NodeId>,

    pub pending_passive_unmount: Vec<Rc<Effect>>,
    pub pending_passive_update: Vec<Rc<Effect>>,
    pub passive_scheduled: bool,

    pub error: Option<RenderError>,
    pub last_commit: CommitStats,
    pub commit_count: usize,
}

pub(crate) struct RootInner<H: HostConfig> {
    pub state: RefCell<RootState<H>>,
    pub host: H,
    pub scheduler: Rc<dyn Scheduler>,
    pub root_node: NodeId,
    pub root_queue: Rc<RefCell<StateQueue<Node>>>,
    pub self_weak: Weak<RootInner<H>>,
    pub interleaved: RefCell<Vec<(NodeId, Lane)>>,
    pub reschedule: Cell<bool>,
}

impl<H: HostConfig> RootInner<H> {
    pub(crate) fn update_target(&self) -> Weak<dyn UpdateTarget> {
        self.self_weak.clone()
    }
}

impl<H: HostConfig> UpdateTarget for RootInner<H> {
    fn request_update_lane(&self) -> Lane {
        request_update_lane(self.scheduler.current_priority())
    }

    fn schedule_update(&self, node: NodeId, lane: Lane) {
        schedule_update_on_node(self, node, lane);
    }
}

/// Everything the begin and complete phases touch.
pub(crate) struct RenderScope<'a, H: HostConfig> {
    pub arena: &'a mut Arena<H>,
    pub allocated: &'a mut Vec<NodeId>,
    pub contexts: &'a mut ContextStack,
    pub host: &'a H,
    pub target: &'a Weak<dyn UpdateTarget>,
    pub lane: Lane,
}

// =============================================================================
// UPDATES
// =============================================================================

/// Mark `node` and its ancestors with `lane` and schedule the root.
pub(crate) fn schedule_update_on_node<H: HostConfig>(root: &RootInner<H>, node: NodeId, lane: Lane) {
    let Ok(mut state) = root.state.try_borrow_mut() else {
        tracing::trace!(?node, lane, "update while the root is busy; deferred");
        root.interleaved.borrow_mut().push((node, lane));
        return;
    };

    if !mark_update_lane_to_root(&mut state.arena, node, lane) {
        tracing::warn!(?node, "update on a component that is no longer mounted");
        return;
    }

    if state.wip_root_render_lane != NO_LANE {
        state.interleaved_lanes = merge_lanes(state.interleaved_lanes, lane);
    }
    state.pending_lanes = merge_lanes(state.pending_lanes, lane);
    ensure_root_is_scheduled(root, &mut state);
}

fn mark_update_lane_to_root<H: HostConfig>(arena: &mut Arena<H>, node: NodeId, lane: Lane) -> bool {
    if !arena.contains_key(node) {
        return false;
    }
    mark_lane(arena, node, lane, false);

    let mut last = node;
    while let Some(parent) = parent_of(arena, last) {
        mark_lane(arena, parent, lane, true);
        last = parent;
    }
    arena[last].tag == WorkTag::HostRoot
}

/// Apply updates that were parked while the state was borrowed, and
/// re-queue a sync pass that could not run.
pub(crate) fn release_root<H: HostConfig>(root: &RootInner<H>) {
    let parked: Vec<_> = root.interleaved.borrow_mut().drain(..).collect();
    for (node, lane) in parked {
        schedule_update_on_node(root, node, lane);
    }

    if root.reschedule.replace(false) {
        schedule_sync_pass(root);
    }
}

// =============================================================================
// SCHEDULING DECISION
// =============================================================================

pub(crate) fn ensure_root_is_scheduled<H: HostConfig>(root: &RootInner<H>, state: &mut RootState<H>) {
    let next_lane = get_highest_priority_lane(state.pending_lanes);

    if next_lane == NO_LANE {
        if let Some(ScheduledCallback::Task(handle)) = state.callback_node {
            root.scheduler.cancel_callback(handle);
        }
        state.callback_node = None;
        state.callback_priority = NO_LANE;
        return;
    }

    if state.callback_node.is_some() && state.callback_priority == next_lane {
        return;
    }

    if let Some(ScheduledCallback::Task(handle)) = state.callback_node.take() {
        tracing::debug!(?handle, lane = next_lane, "cancelling callback for a different lane");
        root.scheduler.cancel_callback(handle);
    }

    let callback = if next_lane == SYNC_LANE {
        schedule_sync_pass(root);
        ScheduledCallback::Sync
    } else {
        let priority = lanes_to_priority(next_lane);
        let handle = root
            .scheduler
            .schedule_callback(priority, concurrent_task(root.self_weak.clone()), 0);
        ScheduledCallback::Task(handle)
    };

    tracing::debug!(lane = next_lane, ?callback, "root scheduled");
    state.callback_node = Some(callback);
    state.callback_priority = next_lane;
}

fn schedule_sync_pass<H: HostConfig>(root: &RootInner<H>) {
    let weak = root.self_weak.clone();
    schedule_sync_callback(Box::new(move || {
        if let Some(root) = weak.upgrade() {
            perform_sync_work_on_root(&root);
        }
    }));
    root.scheduler.schedule_microtask(Box::new(flush_sync_callbacks));
}

fn concurrent_task<H: HostConfig>(weak: Weak<RootInner<H>>) -> Task {
    Task::new(move |did_timeout| {
        let root = weak.upgrade()?;
        perform_concurrent_work_on_root(&root, did_timeout)
    })
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// A time-sliced callback. Returns a continuation while the pass it is
/// working on is paused and still wanted.
pub(crate) fn perform_concurrent_work_on_root<H: HostConfig>(
    root: &RootInner<H>,
    did_timeout: bool,
) -> Option<Task> {
    let Ok(original) = root.state.try_borrow().map(|s| s.callback_node) else {
        return Some(concurrent_task(root.self_weak.clone()));
    };

    let did_flush = flush_passive_effects(root);
    if did_flush && root.state.try_borrow().map(|s| s.callback_node).ok() != Some(original) {
        // The effects scheduled something else
        return None;
    }

    let Ok(mut state) = root.state.try_borrow_mut() else {
        return Some(concurrent_task(root.self_weak.clone()));
    };

    let lane = get_highest_priority_lane(state.pending_lanes);
    if lane == NO_LANE {
        ensure_root_is_scheduled(root, &mut state);
        return None;
    }

    let time_slice = !did_timeout && lane != SYNC_LANE;
    let mut committed = None;
    match render_root(root, &mut state, lane, time_slice) {
        RenderExit::Completed => committed = commit_root(root, &mut state),
        RenderExit::Incomplete => {}
        RenderExit::Aborted(err) => {
            abort_render(&mut state, err);
            drop(state);
            release_root(root);
            return None;
        }
    }

    ensure_root_is_scheduled(root, &mut state);
    let still_wanted = state.callback_node == original;
    drop(state);

    if committed == Some(SYNC_LANE) {
        flush_passive_effects(root);
    }
    release_root(root);

    if still_wanted {
        Some(concurrent_task(root.self_weak.clone()))
    } else {
        None
    }
}

/// The sync-lane callback. Runs a full pass without yielding.
pub(crate) fn perform_sync_work_on_root<H: HostConfig>(root: &RootInner<H>) {
    flush_passive_effects(root);

    let Ok(mut state) = root.state.try_borrow_mut() else {
        root.reschedule.set(true);
        return;
    };

    let lane = get_highest_priority_lane(state.pending_lanes);
    if lane != SYNC_LANE {
        ensure_root_is_scheduled(root, &mut state);
        drop(state);
        release_root(root);
        return;
    }

    let mut committed = None;
    match render_root(root, &mut state, SYNC_LANE, false) {
        RenderExit::Completed => committed = commit_root(root, &mut state),
        RenderExit::Incomplete => ensure_root_is_scheduled(root, &mut state),
        RenderExit::Aborted(err) => abort_render(&mut state, err),
    }
    drop(state);

    if committed.is_some() {
        flush_passive_effects(root);
    }
    release_root(root);
}

// =============================================================================
// RENDER PASS
// =============================================================================

pub(crate) enum RenderExit {
    Completed,
    Incomplete,
    Aborted(RenderError),
}

fn render_root<H: HostConfig>(
    root: &RootInner<H>,
    state: &mut RootState<H>,
    lane: Lane,
    time_slice: bool,
) -> RenderExit {
    if state.wip_root_render_lane != lane {
        prepare_fresh_stack(state, lane);
    }
    tracing::debug!(lane, time_slice, "render pass");

    let target = root.update_target();
    let result = {
        let RootState {
            arena,
            allocated,
            context_stack,
            work_in_progress,
            wip_root,
            ..
        } = state;
        let mut scope = RenderScope {
            arena,
            allocated,
            contexts: context_stack,
            host: &root.host,
            target: &target,
            lane,
        };
        let wip_root = *wip_root;
        if time_slice {
            work_loop_concurrent(&mut scope, work_in_progress, wip_root, &*root.scheduler)
        } else {
            work_loop_sync(&mut scope, work_in_progress, wip_root)
        }
    };

    match result {
        Err(err) => RenderExit::Aborted(err),
        Ok(()) if state.work_in_progress.is_some() => {
            tracing::trace!(lane, "render pass yielded");
            RenderExit::Incomplete
        }
        Ok(()) => {
            state.finished_work = state.wip_root.take();
            state.finished_lane = lane;
            state.wip_root_render_lane = NO_LANE;
            RenderExit::Completed
        }
    }
}

/// Throw away any pass in progress and start one for `lane` from the
/// committed tree.
fn prepare_fresh_stack<H: HostConfig>(state: &mut RootState<H>, lane: Lane) {
    if state.wip_root_render_lane != NO_LANE {
        tracing::debug!(
            discarded = state.wip_root_render_lane,
            lane,
            "discarding paused render pass"
        );
    }
    release_allocated(state);
    state.context_stack.reset();
    state.finished_work = None;
    state.interleaved_lanes = NO_LANES;

    let current = state.current;
    let props = state.arena[current].pending_props.clone();
    let wip = clone_for_work(&mut state.arena, &mut state.allocated, current, props);
    state.arena[wip].parent = None;

    state.work_in_progress = Some(wip);
    state.wip_root = Some(wip);
    state.wip_root_render_lane = lane;
}

fn release_allocated<H: HostConfig>(state: &mut RootState<H>) {
    for id in std::mem::take(&mut state.allocated) {
        release(&mut state.arena, id);
    }
}

/// Drop a failed pass and keep the committed tree. The lane stays pending
/// and is retried with the next update.
fn abort_render<H: HostConfig>(state: &mut RootState<H>, err: RenderError) {
    tracing::error!(error = %err, lane = state.wip_root_render_lane, "render pass aborted");
    release_allocated(state);
    state.context_stack.reset();
    state.work_in_progress = None;
    state.wip_root = None;
    state.wip_root_render_lane = NO_LANE;
    state.callback_node = None;
    state.callback_priority = NO_LANE;
    state.error = Some(err);
}

fn work_loop_sync<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    work_in_progress: &mut Option<NodeId>,
    wip_root: Option<NodeId>,
) -> Result<(), RenderError> {
    while let Some(unit) = *work_in_progress {
        *work_in_progress = perform_unit_of_work(scope, unit, wip_root)?;
    }
    Ok(())
}

fn work_loop_concurrent<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    work_in_progress: &mut Option<NodeId>,
    wip_root: Option<NodeId>,
    scheduler: &dyn Scheduler,
) -> Result<(), RenderError> {
    while let Some(unit) = *work_in_progress {
        if scheduler.should_yield() {
            break;
        }
        *work_in_progress = perform_unit_of_work(scope, unit, wip_root)?;
    }
    Ok(())
}

fn perform_unit_of_work<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    unit: NodeId,
    wip_root: Option<NodeId>,
) -> Result<Option<NodeId>, RenderError> {
    let next = begin_work(scope, unit)?;
    let node = &mut scope.arena[unit];
    node.memoized_props = Some(node.pending_props.clone());

    match next {
        Some(child) => Ok(Some(child)),
        None => Ok(complete_unit_of_work(scope, unit, wip_root)),
    }
}

/// Complete `unit` and its ancestors until one has a sibling to begin.
fn complete_unit_of_work<H: HostConfig>(
    scope: &mut RenderScope<'_, H>,
    unit: NodeId,
    wip_root: Option<NodeId>,
) -> Option<NodeId> {
    let mut completed = unit;
    loop {
        complete_work(scope, completed);

        if Some(completed) == wip_root {
            return None;
        }
        if let Some(sibling) = scope.arena[completed].sibling {
            return Some(sibling);
        }
        completed = scope.arena[completed].parent?;
    }
}
