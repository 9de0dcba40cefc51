// ============================================================================
// spark-fiber - Fiber
// Work tree, reconciliation, the work loop and the commit
// ============================================================================

pub(crate) mod begin;
pub(crate) mod child;
pub(crate) mod commit;
pub(crate) mod complete;
pub(crate) mod context_stack;
pub(crate) mod node;
pub mod root;
pub(crate) mod work_loop;

pub use commit::CommitStats;
pub use root::Root;
