// ============================================================================
// spark-fiber - Core Module
// Flags, lanes, identifiers and the thread-local runtime context
// ============================================================================

pub mod constants;
pub mod context;
pub mod lanes;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{is_flushing_sync, is_transition, with_context, RuntimeContext};
pub use lanes::{Lane, Lanes};
pub use types::{Key, NodeId, SlotKey, WorkTag};
