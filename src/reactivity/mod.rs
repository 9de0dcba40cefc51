// ============================================================================
// spark-fiber - Reactivity Module
// Hooks, update queues, priority scopes and the sync callback queue
// ============================================================================

pub mod batching;
pub mod equality;
pub mod hooks;
pub mod ring;
pub mod scheduling;
pub mod update_queue;

// Re-export the component-facing API
pub use batching::{current_update_priority, flush_sync, start_transition, with_update_priority};
pub use equality::{are_hook_inputs_equal, Dep};
pub use hooks::{Cleanup, Dispatch, HookPhase, Hooks, SetState, StartTransition};
pub use scheduling::{flush_sync_callbacks, schedule_sync_callback};
