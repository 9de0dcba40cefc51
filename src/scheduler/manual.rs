// ============================================================================
// spark-fiber - Manual Scheduler
// Deterministic, hand-driven implementation of the Scheduler trait
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::{CallbackHandle, Microtask, PriorityLevel, Scheduler, Task};

/// Upper bound on slices run by one `flush_all` call.
const MAX_FLUSH_SLICES: usize = 100_000;

struct ScheduledTask {
    handle: CallbackHandle,
    priority: PriorityLevel,
    start_time: u64,
    expiration: u64,
    task: Task,
}

/// A scheduler driven explicitly by the caller.
///
/// Time is a virtual millisecond clock that only moves on [`advance`]. Tasks
/// run most-expiring first (ties by submission order) and only once their
/// delay has elapsed. Microtasks drain before and after every task.
///
/// [`advance`]: ManualScheduler::advance
///
/// # Example
///
/// ```
/// use spark_fiber::scheduler::{ManualScheduler, PriorityLevel, Scheduler, Task};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scheduler = ManualScheduler::new();
/// let runs = Rc::new(Cell::new(0));
///
/// let r = runs.clone();
/// scheduler.schedule_callback(PriorityLevel::Normal, Task::new(move |_| {
///     r.set(r.get() + 1);
///     None
/// }), 0);
///
/// assert_eq!(scheduler.flush_all(), 1);
/// assert_eq!(runs.get(), 1);
/// ```
pub struct ManualScheduler {
    tasks: RefCell<Vec<ScheduledTask>>,
    microtasks: RefCell<VecDeque<Microtask>>,
    next_id: Cell<u64>,
    now: Cell<u64>,
    current_priority: Cell<PriorityLevel>,
    running: Cell<Option<CallbackHandle>>,
    running_cancelled: Cell<bool>,
    yield_after: Cell<Option<u32>>,
    yield_polls: Cell<u32>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(Vec::new()),
            microtasks: RefCell::new(VecDeque::new()),
            next_id: Cell::new(1),
            now: Cell::new(0),
            current_priority: Cell::new(PriorityLevel::Normal),
            running: Cell::new(None),
            running_cancelled: Cell::new(false),
            yield_after: Cell::new(None),
            yield_polls: Cell::new(0),
        }
    }

    // =========================================================================
    // CLOCK AND SLICE BUDGET
    // =========================================================================

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Make `should_yield` fire after `polls` checks within one task.
    /// `None` never yields.
    pub fn set_yield_after(&self, polls: Option<u32>) {
        self.yield_after.set(polls);
    }

    /// Run `f` with `priority` as the ambient priority.
    pub fn run_with_priority<R>(&self, priority: PriorityLevel, f: impl FnOnce() -> R) -> R {
        let prev = self.current_priority.replace(priority);

        struct PriorityGuard<'a> {
            cell: &'a Cell<PriorityLevel>,
            prev: PriorityLevel,
        }

        impl Drop for PriorityGuard<'_> {
            fn drop(&mut self) {
                self.cell.set(self.prev);
            }
        }

        let _guard = PriorityGuard {
            cell: &self.current_priority,
            prev,
        };
        f()
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.borrow().len()
    }

    pub fn has_pending_work(&self) -> bool {
        self.pending_tasks() > 0 || self.pending_microtasks() > 0
    }

    /// Priority of the most urgent queued task
    pub fn first_priority(&self) -> Option<PriorityLevel> {
        let tasks = self.tasks.borrow();
        tasks
            .iter()
            .min_by_key(|t| (t.expiration, t.handle))
            .map(|t| t.priority)
    }

    // =========================================================================
    // DRIVING
    // =========================================================================

    /// Drain the microtask queue, including microtasks queued while draining.
    pub fn flush_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.microtasks.borrow_mut().pop_front();
            let Some(task) = next else { break };
            task();
            ran += 1;
        }
        ran
    }

    /// Run one time slice: the most urgent due task.
    ///
    /// Returns `false` when no task is due.
    pub fn run_next_task(&self) -> bool {
        self.flush_microtasks();

        let now = self.now.get();
        let next = {
            let mut tasks = self.tasks.borrow_mut();
            let position = tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.start_time <= now)
                .min_by_key(|(_, t)| (t.expiration, t.handle))
                .map(|(i, _)| i);
            position.map(|i| tasks.remove(i))
        };
        let Some(scheduled) = next else {
            return false;
        };

        let ScheduledTask {
            handle,
            priority,
            start_time,
            expiration,
            task,
        } = scheduled;

        self.running.set(Some(handle));
        self.running_cancelled.set(false);
        self.yield_polls.set(0);
        let did_timeout = expiration <= now;

        let continuation = self.run_with_priority(priority, || task.run(did_timeout));

        self.running.set(None);
        if let Some(task) = continuation {
            if !self.running_cancelled.get() {
                self.tasks.borrow_mut().push(ScheduledTask {
                    handle,
                    priority,
                    start_time,
                    expiration,
                    task,
                });
            }
        }

        self.flush_microtasks();
        true
    }

    /// Run tasks until none remain, moving the clock forward to delayed
    /// tasks when nothing else is due. Returns the number of slices run.
    pub fn flush_all(&self) -> usize {
        let mut slices = 0;
        loop {
            if self.run_next_task() {
                slices += 1;
                if slices > MAX_FLUSH_SLICES {
                    panic!(
                        "ManualScheduler::flush_all ran {} slices without draining; \
                         a task keeps rescheduling itself",
                        MAX_FLUSH_SLICES
                    );
                }
                continue;
            }

            let next_start = self.tasks.borrow().iter().map(|t| t.start_time).min();
            match next_start {
                Some(start) => self.now.set(start.max(self.now.get())),
                None => break,
            }
        }
        slices
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_callback(&self, priority: PriorityLevel, task: Task, delay: u64) -> CallbackHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handle = CallbackHandle(id);

        let start_time = self.now.get() + delay;
        self.tasks.borrow_mut().push(ScheduledTask {
            handle,
            priority,
            start_time,
            expiration: start_time + priority.timeout(),
            task,
        });
        tracing::trace!(?handle, ?priority, delay, "callback scheduled");
        handle
    }

    fn cancel_callback(&self, handle: CallbackHandle) {
        if self.running.get() == Some(handle) {
            self.running_cancelled.set(true);
        }
        self.tasks.borrow_mut().retain(|t| t.handle != handle);
    }

    fn current_priority(&self) -> PriorityLevel {
        self.current_priority.get()
    }

    fn should_yield(&self) -> bool {
        match self.yield_after.get() {
            None => false,
            Some(budget) => {
                let polls = self.yield_polls.get() + 1;
                self.yield_polls.set(polls);
                polls > budget
            }
        }
    }

    fn first_callback(&self) -> Option<CallbackHandle> {
        self.tasks
            .borrow()
            .iter()
            .min_by_key(|t| (t.expiration, t.handle))
            .map(|t| t.handle)
    }

    fn schedule_microtask(&self, task: Microtask) {
        self.microtasks.borrow_mut().push_back(task);
    }
}

// =============================================================================
// TESTS
// =============================================================================
