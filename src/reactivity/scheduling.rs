// ============================================================================
// spark-fiber - Sync Lane Scheduling
// The microtask-flushed queue of synchronous render callbacks
// ============================================================================
//
// Synchronous-lane work is not handed to the prioritized scheduler. A root
// pushes a callback here and schedules a microtask that drains the queue, so
// the render completes before the current task returns to the event loop.
// ============================================================================

use crate::core::context::{with_context, SyncCallback};

/// Maximum drain rounds before we consider it an infinite update loop
const MAX_FLUSH_COUNT: u32 = 1000;

/// Queue a callback for the next sync flush.
pub fn schedule_sync_callback(callback: SyncCallback) {
    with_context(|ctx| ctx.push_sync_callback(callback));
}

/// Drain the sync callback queue, including callbacks queued while draining.
///
/// Re-entrant calls are no-ops; the outer flush picks up their work.
///
/// # Panics
///
/// Panics if the queue keeps refilling for more than 1000 rounds, which
/// means commits keep scheduling new synchronous updates.
///
/// # Example
///
/// ```
/// use spark_fiber::reactivity::scheduling::{flush_sync_callbacks, schedule_sync_callback};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let ran = Rc::new(Cell::new(false));
/// let r = ran.clone();
/// schedule_sync_callback(Box::new(move || r.set(true)));
///
/// flush_sync_callbacks();
/// assert!(ran.get());
/// ```
pub fn flush_sync_callbacks() {
    if with_context(|ctx| ctx.set_flushing_sync(true)) {
        return;
    }

    struct FlushGuard;

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_flushing_sync(false));
        }
    }

    let _guard = FlushGuard;
    let mut flush_count = 0u32;

    loop {
        let callbacks = with_context(|ctx| ctx.take_sync_callbacks());
        if callbacks.is_empty() {
            break;
        }

        flush_count += 1;
        if flush_count > MAX_FLUSH_COUNT {
            panic!(
                "Maximum update depth exceeded. This can happen when an effect or \
                 commit keeps scheduling synchronous updates."
            );
        }

        tracing::trace!(callbacks = callbacks.len(), round = flush_count, "flushing sync queue");
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::is_flushing_sync;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn callbacks_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let l = log.clone();
            schedule_sync_callback(Box::new(move || l.borrow_mut().push(i)));
        }
        flush_sync_callbacks();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!is_flushing_sync());
    }

    #[test]
    fn callbacks_queued_while_flushing_run_in_same_flush() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        schedule_sync_callback(Box::new(move || {
            h.set(h.get() + 1);
            let h2 = h.clone();
            schedule_sync_callback(Box::new(move || h2.set(h2.get() + 10)));
        }));

        flush_sync_callbacks();
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn nested_flush_is_noop() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        schedule_sync_callback(Box::new(move || {
            o.borrow_mut().push("outer");
            let o2 = o.clone();
            schedule_sync_callback(Box::new(move || o2.borrow_mut().push("queued")));
            flush_sync_callbacks();
            o.borrow_mut().push("after-nested");
        }));

        flush_sync_callbacks();
        assert_eq!(*order.borrow(), vec!["outer", "after-nested", "queued"]);
    }

    #[test]
    #[should_panic(expected = "Maximum update depth exceeded")]
    fn runaway_loop_panics() {
        fn again() {
            schedule_sync_callback(Box::new(again));
        }
        schedule_sync_callback(Box::new(again));
        flush_sync_callbacks();
    }
}
