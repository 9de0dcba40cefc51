// ============================================================================
// spark-fiber - Hooks
// Per-instance state cells and effect records, rebuilt on every render
// ============================================================================
//
// A component receives a `Hooks` render context. On the first render of an
// instance (`Mounting`) every hook call allocates a fresh cell. On later
// renders (`Updating`) hook calls walk the committed instance's cells in
// lock-step and build new ones from them, so an abandoned render never
// changes what is committed. Calling hooks in a different number or order
// between renders is a programming error and panics.
// ============================================================================

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::core::constants::{HOOK_HAS_EFFECT, HOOK_PASSIVE, NO_FLAGS, PASSIVE_EFFECT};
use crate::core::lanes::{merge_lanes, Lane, Lanes, NO_LANES};
use crate::core::types::NodeId;
use crate::error::HookError;
use crate::fiber::context_stack::ContextStack;
use crate::primitives::context::{Context, ContextId};
use crate::primitives::node_ref::NodeRef;
use crate::reactivity::batching::{current_update_priority, start_transition, with_update_priority};
use crate::reactivity::equality::{are_hook_inputs_equal, Dep};
use crate::reactivity::ring::Ring;
use crate::reactivity::update_queue::{process_update_queue, Action, StateQueue, Update};
use crate::scheduler::PriorityLevel;

// =============================================================================
// UPDATE TARGET
// =============================================================================

/// The root a setter reports to.
pub(crate) trait UpdateTarget {
    fn request_update_lane(&self) -> Lane;

    /// Mark `node` and its ancestors with `lane` and make sure a render is
    /// scheduled for it.
    fn schedule_update(&self, node: NodeId, lane: Lane);
}

// =============================================================================
// HOOK CELLS
// =============================================================================

#[derive(Clone)]
pub(crate) enum Hook {
    State(Rc<dyn Any>),
    Effect(Rc<Effect>),
    Ref(Rc<dyn Any>),
}

impl Hook {
    fn kind(&self) -> &'static str {
        match self {
            Hook::State(_) => "state",
            Hook::Effect(_) => "effect",
            Hook::Ref(_) => "ref",
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// A state cell as seen by one render.
pub(crate) struct StateHook<T> {
    memoized: T,
    base_state: T,
    base_queue: RefCell<Ring<Update<T>>>,
    queue: Rc<RefCell<StateQueue<T>>>,
    /// Node the cell was mounted on; setters target it for life
    owner: NodeId,
}

impl<T: Clone + 'static> StateHook<T> {
    pub(crate) fn mount(initial: T, owner: NodeId) -> Self {
        Self {
            memoized: initial.clone(),
            base_state: initial,
            base_queue: RefCell::new(Ring::new()),
            queue: Rc::new(RefCell::new(StateQueue::new())),
            owner,
        }
    }

    pub(crate) fn value(&self) -> &T {
        &self.memoized
    }

    pub(crate) fn queue(&self) -> &Rc<RefCell<StateQueue<T>>> {
        &self.queue
    }

    /// Build this cell's successor for a render at `render_lanes`.
    ///
    /// Pending updates are first moved onto this (committed) cell's base
    /// queue, so they survive if the render is thrown away. Returns the new
    /// cell and the lanes of the updates it skipped.
    pub(crate) fn next(&self, render_lanes: Lanes) -> (StateHook<T>, Lanes) {
        let pending = self.queue.borrow_mut().pending.take();
        if !pending.is_empty() {
            self.base_queue.borrow_mut().append(pending);
        }

        let processed = {
            let base_queue = self.base_queue.borrow();
            process_update_queue(self.base_state.clone(), &base_queue, render_lanes)
        };

        let next = StateHook {
            memoized: processed.memoized_state,
            base_state: processed.base_state,
            base_queue: RefCell::new(processed.base_queue),
            queue: self.queue.clone(),
            owner: self.owner,
        };
        (next, processed.skipped_lanes)
    }
}

// =============================================================================
// EFFECT RECORDS
// =============================================================================

/// What an effect returns: an optional cleanup to run before the effect runs
/// again or when its component unmounts.
pub struct Cleanup(Option<Box<dyn FnOnce()>>);

impl Cleanup {
    pub fn none() -> Self {
        Cleanup(None)
    }

    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Cleanup(Some(Box::new(f)))
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "Cleanup(..)" } else { "Cleanup(none)" })
    }
}

/// The part of an effect that survives across renders: its pending cleanup.
#[derive(Default)]
pub(crate) struct EffectInstance {
    destroy: RefCell<Option<Box<dyn FnOnce()>>>,
}

pub(crate) struct Effect {
    tag: u32,
    create: RefCell<Option<Box<dyn FnOnce() -> Cleanup>>>,
    instance: Rc<EffectInstance>,
    deps: Option<Vec<Dep>>,
}

impl Effect {
    /// Whether this commit must run the destroy/create pair.
    pub(crate) fn has_effect(&self) -> bool {
        self.tag & HOOK_HAS_EFFECT != 0
    }

    pub(crate) fn is_passive(&self) -> bool {
        self.tag & HOOK_PASSIVE != 0
    }

    /// Run the last cleanup, if any.
    pub(crate) fn destroy(&self) {
        let destroy = self.instance.destroy.borrow_mut().take();
        if let Some(destroy) = destroy {
            destroy();
        }
    }

    /// Run the create callback and keep its cleanup.
    pub(crate) fn create(&self) {
        let create = self.create.borrow_mut().take();
        if let Some(create) = create {
            let Cleanup(destroy) = create();
            *self.instance.destroy.borrow_mut() = destroy;
        }
    }
}

// =============================================================================
// SETTERS
// =============================================================================

/// Enqueues updates on a state cell.
///
/// Setters stay valid across renders. After the component unmounts they
/// become no-ops (with a warning).
pub struct SetState<T> {
    queue: Rc<RefCell<StateQueue<T>>>,
    node: NodeId,
    target: Weak<dyn UpdateTarget>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            node: self.node,
            target: self.target.clone(),
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState").field("node", &self.node).finish()
    }
}

impl<T: Clone + 'static> SetState<T> {
    pub(crate) fn new(
        queue: Rc<RefCell<StateQueue<T>>>,
        node: NodeId,
        target: Weak<dyn UpdateTarget>,
    ) -> Self {
        Self { queue, node, target }
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.dispatch(Action::Replace(value));
    }

    /// Derive the next value from the previous one. `f` may run more than
    /// once when updates of different priorities are replayed.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.dispatch(Action::Reduce(Rc::new(f)));
    }

    fn dispatch(&self, action: Action<T>) {
        let Some(target) = self.target.upgrade() else {
            tracing::warn!(node = ?self.node, "state update on a root that no longer exists");
            return;
        };
        let lane = target.request_update_lane();
        self.queue.borrow_mut().enqueue(Update::new(action, lane));
        target.schedule_update(self.node, lane);
    }
}

/// Dispatches actions through a reducer.
pub struct Dispatch<S, A> {
    set: SetState<S>,
    reducer: Rc<dyn Fn(&S, A) -> S>,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
            reducer: self.reducer.clone(),
        }
    }
}

impl<S: Clone + 'static, A: Clone + 'static> Dispatch<S, A> {
    pub fn dispatch(&self, action: A) {
        let reducer = self.reducer.clone();
        self.set.update(move |state| reducer(state, action.clone()));
    }
}

/// Starts transitions and flips the pending flag of `use_transition`.
#[derive(Clone)]
pub struct StartTransition {
    set_pending: SetState<bool>,
}

impl StartTransition {
    /// Mark the transition pending at input priority, then run `f` with its
    /// updates on the transition lane.
    pub fn start(&self, f: impl FnOnce()) {
        let urgent = current_update_priority()
            .map_or(PriorityLevel::UserBlocking, |p| p.min(PriorityLevel::UserBlocking));
        with_update_priority(urgent, || self.set_pending.set(true));

        start_transition(|| {
            self.set_pending.set(false);
            f();
        });
    }
}

// =============================================================================
// RENDER CONTEXT
// =============================================================================

/// Whether this render creates the instance's hooks or updates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookPhase {
    Mounting,
    Updating,
}

/// What a component render left behind for its work node.
pub(crate) struct RenderedHooks {
    pub hooks: Vec<Hook>,
    pub effects: Ring<Rc<Effect>>,
    pub flags: u32,
    pub skipped_lanes: Lanes,
    pub context_deps: SmallVec<[ContextId; 2]>,
}

/// The render context handed to a component.
pub struct Hooks<'a> {
    phase: HookPhase,
    node: NodeId,
    render_lanes: Lanes,
    current: &'a [Hook],
    next: Vec<Hook>,
    effects: Ring<Rc<Effect>>,
    flags: u32,
    skipped_lanes: Lanes,
    target: Weak<dyn UpdateTarget>,
    contexts: &'a ContextStack,
    context_deps: SmallVec<[ContextId; 2]>,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        node: NodeId,
        current: Option<&'a [Hook]>,
        render_lanes: Lanes,
        target: Weak<dyn UpdateTarget>,
        contexts: &'a ContextStack,
    ) -> Self {
        let (phase, current) = match current {
            Some(hooks) => (HookPhase::Updating, hooks),
            None => (HookPhase::Mounting, &[][..]),
        };
        Self {
            phase,
            node,
            render_lanes,
            current,
            next: Vec::with_capacity(current.len()),
            effects: Ring::new(),
            flags: NO_FLAGS,
            skipped_lanes: NO_LANES,
            target,
            contexts,
            context_deps: SmallVec::new(),
        }
    }

    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    /// Check the hook count against the previous render and hand back the
    /// new cells.
    pub(crate) fn finish(self) -> RenderedHooks {
        if self.phase == HookPhase::Updating && self.next.len() != self.current.len() {
            panic!(
                "{}",
                HookError::FewerHooks {
                    rendered: self.next.len(),
                    previous: self.current.len(),
                }
            );
        }
        RenderedHooks {
            hooks: self.next,
            effects: self.effects,
            flags: self.flags,
            skipped_lanes: self.skipped_lanes,
            context_deps: self.context_deps,
        }
    }

    /// The committed cell at the position of the next hook call.
    fn current_hook(&self) -> &'a Hook {
        let index = self.next.len();
        match self.current.get(index) {
            Some(hook) => hook,
            None => panic!(
                "{}",
                HookError::MoreHooks {
                    previous: self.current.len()
                }
            ),
        }
    }

    fn mismatch(&self, expected: &'static str, found: &'static str) -> ! {
        panic!(
            "{}",
            HookError::KindMismatch {
                index: self.next.len(),
                expected,
                found,
            }
        )
    }

    fn setter<T: Clone + 'static>(&self, hook: &StateHook<T>) -> SetState<T> {
        SetState::new(hook.queue.clone(), hook.owner, self.target.clone())
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// A state cell. `init` only runs on mount.
    pub fn use_state<T: Clone + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, SetState<T>) {
        let hook = match self.phase {
            HookPhase::Mounting => StateHook::mount(init(), self.node),
            HookPhase::Updating => {
                let current = self.current_hook();
                let Hook::State(any) = current else {
                    self.mismatch("state", current.kind());
                };
                let Some(state) = any.downcast_ref::<StateHook<T>>() else {
                    self.mismatch("state", "state of another type");
                };
                let (next, skipped) = state.next(self.render_lanes);
                self.skipped_lanes = merge_lanes(self.skipped_lanes, skipped);
                next
            }
        };

        let value = hook.value().clone();
        let setter = self.setter(&hook);
        self.next.push(Hook::State(Rc::new(hook)));
        (value, setter)
    }

    /// A state cell driven by `reducer`.
    pub fn use_reducer<S, A>(
        &mut self,
        reducer: impl Fn(&S, A) -> S + 'static,
        initial: S,
    ) -> (S, Dispatch<S, A>)
    where
        S: Clone + 'static,
        A: Clone + 'static,
    {
        let (state, set) = self.use_state(|| initial);
        (
            state,
            Dispatch {
                set,
                reducer: Rc::new(reducer),
            },
        )
    }

    // =========================================================================
    // EFFECTS
    // =========================================================================

    /// A passive effect, run after the commit that follows this render.
    ///
    /// `deps: None` runs it after every render; `Some(list)` only when the
    /// list changed (see [`deps!`](crate::deps)).
    pub fn use_effect(
        &mut self,
        deps: Option<Vec<Dep>>,
        create: impl FnOnce() -> Cleanup + 'static,
    ) {
        let (instance, changed) = match self.phase {
            HookPhase::Mounting => (Rc::new(EffectInstance::default()), true),
            HookPhase::Updating => {
                let current = self.current_hook();
                let Hook::Effect(prev) = current else {
                    self.mismatch("effect", current.kind());
                };
                let unchanged = are_hook_inputs_equal(deps.as_deref(), prev.deps.as_deref());
                (prev.instance.clone(), !unchanged)
            }
        };

        let mut tag = HOOK_PASSIVE;
        if changed {
            tag |= HOOK_HAS_EFFECT;
            self.flags |= PASSIVE_EFFECT;
        }

        let effect = Rc::new(Effect {
            tag,
            create: RefCell::new(Some(Box::new(create))),
            instance,
            deps,
        });
        self.effects.push(effect.clone());
        self.next.push(Hook::Effect(effect));
    }

    // =========================================================================
    // REFS
    // =========================================================================

    /// A mutable box that persists for the lifetime of the instance.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let cell = match self.phase {
            HookPhase::Mounting => Rc::new(RefCell::new(init())),
            HookPhase::Updating => {
                let current = self.current_hook();
                let Hook::Ref(any) = current else {
                    self.mismatch("ref", current.kind());
                };
                match any.clone().downcast::<RefCell<T>>() {
                    Ok(cell) => cell,
                    Err(_) => self.mismatch("ref", "ref of another type"),
                }
            }
        };
        self.next.push(Hook::Ref(cell.clone()));
        cell
    }

    /// A persistent [`NodeRef`] to attach to a host element.
    pub fn use_node_ref(&mut self) -> NodeRef {
        let cell = self.use_ref(NodeRef::new);
        let node_ref = cell.borrow().clone();
        node_ref
    }

    // =========================================================================
    // CONTEXT AND TRANSITIONS
    // =========================================================================

    /// The value of the nearest enclosing provider of `context`, or its default.
    ///
    /// The component re-renders when that provider's value changes, even if
    /// everything between them bails out.
    pub fn use_context<T: 'static>(&mut self, context: &Context<T>) -> Rc<T> {
        let id = context.id();
        if !self.context_deps.contains(&id) {
            self.context_deps.push(id);
        }
        context.resolve(self.contexts.read(id))
    }

    /// A pending flag plus a starter for transitions.
    pub fn use_transition(&mut self) -> (bool, StartTransition) {
        let (pending, set_pending) = self.use_state(|| false);
        let start = self.use_ref(move || StartTransition { set_pending });
        let start = start.borrow().clone();
        (pending, start)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lanes::{DEFAULT_LANE, SYNC_LANE};
    use crate::deps;
    use slotmap::SlotMap;
    use std::cell::Cell;

    struct RecordingTarget {
        lane: Cell<Lane>,
        scheduled: RefCell<Vec<(NodeId, Lane)>>,
    }

    impl UpdateTarget for RecordingTarget {
        fn request_update_lane(&self) -> Lane {
            self.lane.get()
        }

        fn schedule_update(&self, node: NodeId, lane: Lane) {
            self.scheduled.borrow_mut().push((node, lane));
        }
    }

    fn fixture() -> (Rc<RecordingTarget>, NodeId, ContextStack) {
        let target = Rc::new(RecordingTarget {
            lane: Cell::new(DEFAULT_LANE),
            scheduled: RefCell::new(Vec::new()),
        });
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        (target, ids.insert(()), ContextStack::default())
    }

    fn weak(target: &Rc<RecordingTarget>) -> Weak<dyn UpdateTarget> {
        let target: Rc<dyn UpdateTarget> = target.clone();
        Rc::downgrade(&target)
    }

    #[test]
    fn state_survives_renders_and_applies_updates() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        let (count, set) = hooks.use_state(|| 1);
        assert_eq!(count, 1);
        let mounted = hooks.finish();

        set.update(|n| n + 1);
        set.update(|n| n * 10);
        assert_eq!(target.scheduled.borrow().len(), 2);

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        let (count, _) = hooks.use_state::<i32>(|| unreachable!("init runs on mount only"));
        assert_eq!(count, 20);
        assert_eq!(hooks.phase(), HookPhase::Updating);
    }

    #[test]
    fn setters_target_the_mount_node() {
        let (target, node, contexts) = fixture();
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        let (_, other) = (ids.insert(()), ids.insert(()));

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_state(|| 0);
        let mounted = hooks.finish();

        let mut hooks = Hooks::new(other, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        let (_, set) = hooks.use_state(|| 0);
        set.set(1);
        assert_eq!(target.scheduled.borrow()[0].0, node);
    }

    #[test]
    fn abandoned_render_keeps_pending_updates() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        let (_, set) = hooks.use_state(|| 0);
        let committed = hooks.finish();

        set.set(5);

        // A render that is thrown away
        let mut hooks = Hooks::new(node, Some(&committed.hooks), DEFAULT_LANE, weak(&target), &contexts);
        assert_eq!(hooks.use_state(|| 0).0, 5);
        drop(hooks);

        // The retry still sees the update
        let mut hooks = Hooks::new(node, Some(&committed.hooks), DEFAULT_LANE, weak(&target), &contexts);
        assert_eq!(hooks.use_state(|| 0).0, 5);
    }

    #[test]
    fn skipped_lanes_are_reported() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, SYNC_LANE, weak(&target), &contexts);
        let (_, set) = hooks.use_state(|| 0);
        let committed = hooks.finish();

        target.lane.set(DEFAULT_LANE);
        set.update(|n| n + 1);
        target.lane.set(SYNC_LANE);
        set.update(|n| n + 100);

        let mut hooks = Hooks::new(node, Some(&committed.hooks), SYNC_LANE, weak(&target), &contexts);
        assert_eq!(hooks.use_state(|| 0).0, 100);
        let rendered = hooks.finish();
        assert_eq!(rendered.skipped_lanes, DEFAULT_LANE);

        let mut hooks = Hooks::new(node, Some(&rendered.hooks), DEFAULT_LANE, weak(&target), &contexts);
        assert_eq!(hooks.use_state(|| 0).0, 101);
    }

    #[test]
    fn reducer_dispatches_actions() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        let (_, dispatch) = hooks.use_reducer(|n: &i32, by: i32| n + by, 0);
        let committed = hooks.finish();

        dispatch.dispatch(3);
        dispatch.dispatch(4);

        let mut hooks = Hooks::new(node, Some(&committed.hooks), DEFAULT_LANE, weak(&target), &contexts);
        let (total, _) = hooks.use_reducer(|n: &i32, by: i32| n + by, 0);
        assert_eq!(total, 7);
    }

    #[test]
    fn effect_reruns_only_when_deps_change() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_effect(deps![1], Cleanup::none);
        let mounted = hooks.finish();
        assert_eq!(mounted.flags, PASSIVE_EFFECT);
        assert!(mounted.effects.first().is_some_and(|e| e.has_effect()));

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_effect(deps![1], Cleanup::none);
        let same = hooks.finish();
        assert_eq!(same.flags, NO_FLAGS);
        assert!(same.effects.first().is_some_and(|e| !e.has_effect() && e.is_passive()));

        let mut hooks = Hooks::new(node, Some(&same.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_effect(deps![2], Cleanup::none);
        assert_eq!(hooks.finish().flags, PASSIVE_EFFECT);

        let mut hooks = Hooks::new(node, Some(&same.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_effect(None, Cleanup::none);
        assert_eq!(hooks.finish().flags, PASSIVE_EFFECT);
    }

    #[test]
    fn cleanup_is_shared_across_renders() {
        let (target, node, contexts) = fixture();
        let cleaned = Rc::new(Cell::new(0));

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        let c = cleaned.clone();
        hooks.use_effect(None, move || Cleanup::new(move || c.set(c.get() + 1)));
        let mounted = hooks.finish();
        let first = mounted.effects.first().cloned().expect("effect");
        first.create();

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_effect(None, Cleanup::none);
        let updated = hooks.finish();
        let second = updated.effects.first().cloned().expect("effect");

        second.destroy();
        assert_eq!(cleaned.get(), 1);
        second.create();
        second.destroy();
        assert_eq!(cleaned.get(), 1);
    }

    #[test]
    fn refs_persist() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        let r = hooks.use_ref(|| 0u32);
        *r.borrow_mut() = 9;
        let mounted = hooks.finish();

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        let again = hooks.use_ref(|| 0u32);
        assert!(Rc::ptr_eq(&r, &again));
        assert_eq!(*again.borrow(), 9);
    }

    #[test]
    fn context_reads_default_and_records_dependency() {
        let (target, node, mut contexts) = fixture();
        let theme = Context::new("light");

        {
            let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
            assert_eq!(*hooks.use_context(&theme), "light");
            hooks.use_context(&theme);
            let rendered = hooks.finish();
            assert_eq!(rendered.context_deps.as_slice(), &[theme.id()]);
        }

        contexts.push(theme.id(), Rc::new("dark"));
        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        assert_eq!(*hooks.use_context(&theme), "dark");
    }

    #[test]
    fn transition_start_sets_pending_then_clears_at_transition_lane() {
        let (target, node, contexts) = fixture();

        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        let (pending, start) = hooks.use_transition();
        assert!(!pending);
        hooks.finish();

        start.start(|| {});
        assert_eq!(target.scheduled.borrow().len(), 2);
    }

    #[test]
    #[should_panic(expected = "rendered more hooks")]
    fn extra_hook_panics() {
        let (target, node, contexts) = fixture();
        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_state(|| 0);
        let mounted = hooks.finish();

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_state(|| 0);
        hooks.use_state(|| 0);
    }

    #[test]
    #[should_panic(expected = "rendered fewer hooks")]
    fn missing_hook_panics() {
        let (target, node, contexts) = fixture();
        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_state(|| 0);
        hooks.use_state(|| 0);
        let mounted = hooks.finish();

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_state(|| 0);
        hooks.finish();
    }

    #[test]
    #[should_panic(expected = "expected state, found effect")]
    fn reordered_hooks_panic() {
        let (target, node, contexts) = fixture();
        let mut hooks = Hooks::new(node, None, DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_effect(None, Cleanup::none);
        let mounted = hooks.finish();

        let mut hooks = Hooks::new(node, Some(&mounted.hooks), DEFAULT_LANE, weak(&target), &contexts);
        hooks.use_state(|| 0);
    }
}
