// ============================================================================
// spark-fiber - Runtime Context
// Thread-local state shared by every root on this thread
// ============================================================================

use std::cell::{Cell, RefCell};

use crate::scheduler::PriorityLevel;

/// A callback queued on the synchronous lane queue.
pub type SyncCallback = Box<dyn FnOnce()>;

// =============================================================================
// RUNTIME CONTEXT
// =============================================================================

/// Thread-local runtime context.
///
/// Holds the pieces of state that are not owned by any one root: the
/// microtask-flushed queue of synchronous render callbacks, the transition
/// scope depth and the update priority forced by an event or `flush_sync`.
pub struct RuntimeContext {
    // =========================================================================
    // SYNC LANE QUEUE
    // =========================================================================
    /// Render callbacks for roots with pending synchronous work
    pub sync_queue: RefCell<Vec<SyncCallback>>,

    /// Whether the sync queue is currently being drained
    pub is_flushing_sync: Cell<bool>,

    // =========================================================================
    // UPDATE PRIORITY
    // =========================================================================
    /// Nesting depth of `start_transition` scopes
    pub transition_depth: Cell<u32>,

    /// Priority forced by event dispatch or `flush_sync`
    pub update_priority: Cell<Option<PriorityLevel>>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            sync_queue: RefCell::new(Vec::new()),
            is_flushing_sync: Cell::new(false),
            transition_depth: Cell::new(0),
            update_priority: Cell::new(None),
        }
    }

    // =========================================================================
    // SYNC LANE QUEUE
    // =========================================================================

    pub fn push_sync_callback(&self, callback: SyncCallback) {
        self.sync_queue.borrow_mut().push(callback);
    }

    /// Take every queued sync callback, leaving the queue empty
    pub fn take_sync_callbacks(&self) -> Vec<SyncCallback> {
        std::mem::take(&mut *self.sync_queue.borrow_mut())
    }

    pub fn has_sync_callbacks(&self) -> bool {
        !self.sync_queue.borrow().is_empty()
    }

    /// Set the flushing flag, returning the previous value
    pub fn set_flushing_sync(&self, value: bool) -> bool {
        self.is_flushing_sync.replace(value)
    }

    pub fn is_flushing_sync(&self) -> bool {
        self.is_flushing_sync.get()
    }

    // =========================================================================
    // UPDATE PRIORITY
    // =========================================================================

    pub fn enter_transition(&self) {
        self.transition_depth.set(self.transition_depth.get() + 1);
    }

    pub fn exit_transition(&self) -> u32 {
        let depth = self.transition_depth.get().saturating_sub(1);
        self.transition_depth.set(depth);
        depth
    }

    pub fn is_transition(&self) -> bool {
        self.transition_depth.get() > 0
    }

    /// Set the forced update priority, returning the previous one
    pub fn set_update_priority(&self, priority: Option<PriorityLevel>) -> Option<PriorityLevel> {
        self.update_priority.replace(priority)
    }

    pub fn update_priority(&self) -> Option<PriorityLevel> {
        self.update_priority.get()
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    static CONTEXT: RuntimeContext = RuntimeContext::new();
}

/// Run a closure with the thread's runtime context.
///
/// Keep the closure short: never call user code (components, effects,
/// handlers) from inside it.
pub fn with_context<R>(f: impl FnOnce(&RuntimeContext) -> R) -> R {
    CONTEXT.with(f)
}

pub fn is_flushing_sync() -> bool {
    with_context(|ctx| ctx.is_flushing_sync())
}

pub fn is_transition() -> bool {
    with_context(|ctx| ctx.is_transition())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn sync_queue_take_empties() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        with_context(|ctx| ctx.push_sync_callback(Box::new(move || h.set(h.get() + 1))));
        assert!(with_context(|ctx| ctx.has_sync_callbacks()));

        let callbacks = with_context(|ctx| ctx.take_sync_callbacks());
        assert_eq!(callbacks.len(), 1);
        assert!(!with_context(|ctx| ctx.has_sync_callbacks()));

        for cb in callbacks {
            cb();
        }
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn transition_depth_nests() {
        with_context(|ctx| {
            ctx.enter_transition();
            ctx.enter_transition();
            assert!(ctx.is_transition());
            assert_eq!(ctx.exit_transition(), 1);
            assert!(ctx.is_transition());
            assert_eq!(ctx.exit_transition(), 0);
            assert!(!ctx.is_transition());
        });
    }

    #[test]
    fn update_priority_replace_returns_previous() {
        let prev = with_context(|ctx| ctx.set_update_priority(Some(PriorityLevel::Immediate)));
        assert_eq!(prev, None);
        let prev = with_context(|ctx| ctx.set_update_priority(None));
        assert_eq!(prev, Some(PriorityLevel::Immediate));
    }
}
