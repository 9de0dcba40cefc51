// ============================================================================
// spark-fiber - Update Priority Scopes
// Transitions, forced priorities and synchronous flushing
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::scheduling::flush_sync_callbacks;
use crate::scheduler::PriorityLevel;

// =============================================================================
// UPDATE PRIORITY
// =============================================================================

/// Run `f` with updates forced to `priority`'s lane.
///
/// Event dispatch uses this so that state set in a click handler renders
/// synchronously while state set during a scroll renders as continuous input.
pub fn with_update_priority<T>(priority: PriorityLevel, f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_update_priority(Some(priority)));

    struct PriorityGuard {
        prev: Option<PriorityLevel>,
    }

    impl Drop for PriorityGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_update_priority(self.prev));
        }
    }

    let _guard = PriorityGuard { prev };
    f()
}

/// The priority forced by an enclosing [`with_update_priority`] or [`flush_sync`].
pub fn current_update_priority() -> Option<PriorityLevel> {
    with_context(|ctx| ctx.update_priority())
}

// =============================================================================
// FLUSH SYNC
// =============================================================================

/// Run `f` with updates at the synchronous lane, then render them before
/// returning.
///
/// Called from inside a render the flush is deferred until that render ends.
///
/// # Example
///
/// ```
/// use spark_fiber::{element, flush_sync, ManualScheduler, MemoryHost, Root};
/// use std::rc::Rc;
///
/// let host = MemoryHost::new();
/// let container = host.create_container();
/// let scheduler = Rc::new(ManualScheduler::new());
/// let root = Root::create(host.clone(), scheduler.clone(), container);
///
/// flush_sync(|| root.update(element("p").child("now")));
/// assert_eq!(host.markup(container), "<p>now</p>");
/// ```
pub fn flush_sync<T>(f: impl FnOnce() -> T) -> T {
    let result = with_update_priority(PriorityLevel::Immediate, f);
    flush_sync_callbacks();
    result
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Run `f` with its updates marked as a transition: they render at the
/// transition lane and yield to any more urgent work.
///
/// # Example
///
/// ```
/// use spark_fiber::{is_transition, start_transition};
///
/// assert!(!is_transition());
/// start_transition(|| assert!(is_transition()));
/// assert!(!is_transition());
/// ```
pub fn start_transition<T>(f: impl FnOnce() -> T) -> T {
    with_context(|ctx| ctx.enter_transition());

    struct TransitionGuard;

    impl Drop for TransitionGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.exit_transition());
        }
    }

    let _guard = TransitionGuard;
    f()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::is_transition;
    use crate::core::lanes::{request_update_lane, INPUT_CONTINUOUS_LANE, SYNC_LANE, TRANSITION_LANE};

    #[test]
    fn priority_scope_restores_on_exit() {
        assert_eq!(current_update_priority(), None);
        with_update_priority(PriorityLevel::UserBlocking, || {
            assert_eq!(current_update_priority(), Some(PriorityLevel::UserBlocking));
            with_update_priority(PriorityLevel::Immediate, || {
                assert_eq!(current_update_priority(), Some(PriorityLevel::Immediate));
            });
            assert_eq!(current_update_priority(), Some(PriorityLevel::UserBlocking));
        });
        assert_eq!(current_update_priority(), None);
    }

    #[test]
    fn priority_scope_restores_on_panic() {
        let result = std::panic::catch_unwind(|| {
            with_update_priority(PriorityLevel::Immediate, || panic!("boom"));
        });
        assert!(result.is_err());
        assert_eq!(current_update_priority(), None);
    }

    #[test]
    fn lanes_follow_scopes() {
        with_update_priority(PriorityLevel::Immediate, || {
            assert_eq!(request_update_lane(PriorityLevel::Normal), SYNC_LANE);
        });
        with_update_priority(PriorityLevel::UserBlocking, || {
            assert_eq!(request_update_lane(PriorityLevel::Normal), INPUT_CONTINUOUS_LANE);
        });
        with_update_priority(PriorityLevel::Immediate, || {
            start_transition(|| {
                assert_eq!(request_update_lane(PriorityLevel::Normal), TRANSITION_LANE);
            });
        });
    }

    #[test]
    fn transitions_nest() {
        start_transition(|| {
            start_transition(|| assert!(is_transition()));
            assert!(is_transition());
        });
        assert!(!is_transition());
    }

    #[test]
    fn flush_sync_returns_value() {
        assert_eq!(flush_sync(|| 42), 42);
    }
}
