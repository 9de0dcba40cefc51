// ============================================================================
// spark-fiber - An Incremental UI-Tree Reconciliation Runtime
// ============================================================================
//
// Declarative element trees are diffed against the committed work tree in
// interruptible, prioritized render passes, and the differences are applied
// to a pluggable host in one commit. Components keep state in hooks;
// updates are tagged with lanes so urgent input can preempt background work.
//
//   primitives  elements, components, props, contexts, node refs
//   reactivity  hooks, update queues, priority scopes, the sync lane queue
//   fiber       work tree, reconciler, work loop, commit, Root
//   host        the HostConfig boundary, synthetic events, MemoryHost
//   scheduler   the Scheduler trait and the deterministic ManualScheduler
// ============================================================================

pub mod core;
pub mod error;
pub mod fiber;
pub mod host;
mod macros;
pub mod primitives;
pub mod reactivity;
pub mod scheduler;

// Core items
pub use core::constants;
pub use core::context::is_transition;
pub use core::lanes::{Lane, Lanes};
pub use core::types::Key;
pub use error::{HookError, RenderError};

// Declarative tree
pub use primitives::{
    element, fragment, text, Component, Context, Element, ElementBuilder, EventHandler, Node,
    NodeRef, PropValue, Props,
};

// Hooks and update scopes
pub use reactivity::{
    flush_sync, start_transition, with_update_priority, Cleanup, Dep, Dispatch, HookPhase, Hooks,
    SetState, StartTransition,
};

// Engine
pub use fiber::{CommitStats, Root};
pub use host::{EventKind, HostConfig, HostOp, InstanceId, MemoryHost, SyntheticEvent};
pub use scheduler::{ManualScheduler, PriorityLevel, Scheduler, Task};

// =============================================================================
// TESTS
// =============================================================================
