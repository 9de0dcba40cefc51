// ============================================================================
// spark-fiber - Scheduler
// The prioritized callback service the work loop runs on
// ============================================================================
//
// The engine never owns an event loop. It hands prioritized callbacks to a
// `Scheduler`, polls `should_yield` between units of work, and queues
// microtasks for the synchronous lane. `ManualScheduler` is a deterministic
// implementation driven by hand.
// ============================================================================

pub mod manual;

pub use manual::ManualScheduler;

use std::fmt;

// =============================================================================
// PRIORITY
// =============================================================================

/// Priority tier of a scheduled callback, most urgent first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityLevel {
    Immediate,
    UserBlocking,
    Normal,
    Low,
    Idle,
}

impl PriorityLevel {
    /// Milliseconds a callback of this tier may wait before it is expired
    /// and must run without yielding.
    pub fn timeout(self) -> u64 {
        match self {
            PriorityLevel::Immediate => 0,
            PriorityLevel::UserBlocking => 250,
            PriorityLevel::Normal => 5_000,
            PriorityLevel::Low => 10_000,
            PriorityLevel::Idle => 1_073_741_823,
        }
    }
}

// =============================================================================
// CALLBACKS
// =============================================================================

/// Handle of a scheduled callback. A continuation keeps its handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle(pub(crate) u64);

/// A unit of scheduled work.
///
/// Receives `did_timeout` and may return a continuation, which the scheduler
/// keeps under the same handle and runs in a later slice.
pub struct Task(Box<dyn FnOnce(bool) -> Option<Task>>);

impl Task {
    pub fn new(f: impl FnOnce(bool) -> Option<Task> + 'static) -> Self {
        Task(Box::new(f))
    }

    pub fn run(self, did_timeout: bool) -> Option<Task> {
        (self.0)(did_timeout)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task(..)")
    }
}

/// A callback queued to run once the current task finishes.
pub type Microtask = Box<dyn FnOnce()>;

// =============================================================================
// SCHEDULER TRAIT
// =============================================================================

/// Cooperative prioritized callback service.
pub trait Scheduler {
    /// Queue `task` at `priority`, not to start before `delay` ms from now.
    fn schedule_callback(&self, priority: PriorityLevel, task: Task, delay: u64) -> CallbackHandle;

    /// Drop a queued callback. Cancelling an unknown handle is a no-op.
    fn cancel_callback(&self, handle: CallbackHandle);

    /// Priority of the callback currently running (or the ambient one).
    fn current_priority(&self) -> PriorityLevel;

    /// Whether the current time slice is used up.
    fn should_yield(&self) -> bool;

    /// The most urgent callback still queued.
    fn first_callback(&self) -> Option<CallbackHandle>;

    fn schedule_microtask(&self, task: Microtask);
}

// =============================================================================
// TESTS
// =============================================================================
