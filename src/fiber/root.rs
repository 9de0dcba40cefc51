// ============================================================================
// spark-fiber - Root
// The public handle of a mount point
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::core::lanes::{Lanes, NO_LANE, NO_LANES};
use crate::core::types::WorkTag;
use crate::error::RenderError;
use crate::fiber::commit::{flush_passive_effects, CommitStats};
use crate::fiber::context_stack::ContextStack;
use crate::fiber::node::FiberNode;
use crate::fiber::work_loop::{schedule_update_on_node, RootInner, RootState};
use crate::host::events::{dispatch_event, EventKind, SyntheticEvent};
use crate::host::HostConfig;
use crate::primitives::element::Node;
use crate::primitives::props::Props;
use crate::reactivity::batching::flush_sync;
use crate::reactivity::hooks::{Hook, StateHook, UpdateTarget};
use crate::reactivity::update_queue::{Action, Update};
use crate::scheduler::Scheduler;

/// A mount point: a host container plus the work tree rendered into it.
///
/// Cloning gives another handle to the same root.
///
/// # Example
///
/// ```
/// use spark_fiber::{element, ManualScheduler, MemoryHost, Root};
/// use std::rc::Rc;
///
/// let host = MemoryHost::new();
/// let container = host.create_container();
/// let scheduler = Rc::new(ManualScheduler::new());
///
/// let root = Root::mount(host.clone(), scheduler.clone(), container, element("h1").child("hi"));
/// scheduler.flush_all();
/// assert_eq!(host.markup(container), "<h1>hi</h1>");
///
/// root.unmount();
/// assert_eq!(host.markup(container), "");
/// ```
pub struct Root<H: HostConfig>(Rc<RootInner<H>>);

impl<H: HostConfig> Clone for Root<H> {
    fn clone(&self) -> Self {
        Root(self.0.clone())
    }
}

impl<H: HostConfig> Root<H> {
    /// Create an empty root over `container` and register the supported
    /// event kinds on it.
    pub fn create(host: H, scheduler: Rc<dyn Scheduler>, container: H::Handle) -> Self {
        let props = Rc::new(Props::new());
        let mut node = FiberNode::new(WorkTag::HostRoot, None, None, props.clone());
        node.memoized_props = Some(props);
        node.state_node = Some(container.clone());

        let mut arena = SlotMap::with_key();
        let root_node = arena.insert(node);

        let cell = Rc::new(StateHook::mount(Node::Empty, root_node));
        let root_queue = cell.queue().clone();
        arena[root_node].hooks = vec![Hook::State(cell)];

        for kind in EventKind::ALL {
            host.register_event(&container, kind);
        }
        tracing::debug!(?container, "root created");

        let state = RootState {
            arena,
            current: root_node,
            container,
            pending_lanes: NO_LANES,
            finished_work: None,
            finished_lane: NO_LANE,
            callback_node: None,
            callback_priority: NO_LANE,
            work_in_progress: None,
            wip_root: None,
            wip_root_render_lane: NO_LANE,
            interleaved_lanes: NO_LANES,
            context_stack: ContextStack::default(),
            allocated: Vec::new(),
            pending_passive_unmount: Vec::new(),
            pending_passive_update: Vec::new(),
            passive_scheduled: false,
            error: None,
            last_commit: CommitStats::default(),
            commit_count: 0,
        };

        Root(Rc::new_cyclic(|weak| RootInner {
            state: RefCell::new(state),
            host,
            scheduler,
            root_node,
            root_queue,
            self_weak: weak.clone(),
            interleaved: RefCell::new(Vec::new()),
            reschedule: Cell::new(false),
        }))
    }

    /// Create a root and schedule the first render of `node`.
    pub fn mount(
        host: H,
        scheduler: Rc<dyn Scheduler>,
        container: H::Handle,
        node: impl Into<Node>,
    ) -> Self {
        let root = Self::create(host, scheduler, container);
        root.update(node);
        root
    }

    /// Schedule a render of `node` at the lane of the calling context.
    pub fn update(&self, node: impl Into<Node>) {
        let lane = self.0.request_update_lane();
        self.0
            .root_queue
            .borrow_mut()
            .enqueue(Update::new(Action::Replace(node.into()), lane));
        tracing::trace!(lane, "root update");
        schedule_update_on_node(&self.0, self.0.root_node, lane);
    }

    /// Synchronously render nothing, running every cleanup.
    pub fn unmount(&self) {
        flush_sync(|| self.update(Node::Empty));
        self.flush_passive_effects();
    }

    /// Dispatch a `kind` event at `target`, running capture handlers then
    /// bubble handlers found on the path to the container.
    pub fn dispatch_event(&self, kind: EventKind, target: &H::Handle) -> Rc<SyntheticEvent> {
        let container = self.container();
        dispatch_event(&self.0.host, &container, kind, target)
    }

    /// Run queued passive effects now. Returns whether any ran.
    pub fn flush_passive_effects(&self) -> bool {
        flush_passive_effects(&self.0)
    }

    pub fn host(&self) -> &H {
        &self.0.host
    }

    pub fn container(&self) -> H::Handle {
        self.0.state.borrow().container.clone()
    }

    /// The error of the last aborted render pass, if not taken yet.
    pub fn take_error(&self) -> Option<RenderError> {
        self.0.state.borrow_mut().error.take()
    }

    /// Host work done by the last commit.
    pub fn last_commit(&self) -> CommitStats {
        self.0.state.borrow().last_commit
    }

    pub fn commit_count(&self) -> usize {
        self.0.state.borrow().commit_count
    }

    pub fn pending_lanes(&self) -> Lanes {
        self.0.state.borrow().pending_lanes
    }

    /// Whether any lane is pending or any passive effect is queued.
    pub fn has_pending_work(&self) -> bool {
        let state = self.0.state.borrow();
        state.pending_lanes != NO_LANES
            || !state.pending_passive_unmount.is_empty()
            || !state.pending_passive_update.is_empty()
    }
}

impl<H: HostConfig> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Root")
                .field("container", &state.container)
                .field("pending_lanes", &format_args!("{:#b}", state.pending_lanes))
                .field("commits", &state.commit_count)
                .finish(),
            Err(_) => f.write_str("Root(<busy>)"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
