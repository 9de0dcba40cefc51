// ============================================================================
// spark-fiber - Constants
// Flag constants for work-node effects and hook effect records
// ============================================================================

// =============================================================================
// WORK NODE EFFECT FLAGS
// =============================================================================

/// No pending effect
pub const NO_FLAGS: u32 = 0;

/// Host node must be inserted (new node, or a reused node that moved)
pub const PLACEMENT: u32 = 1 << 0;

/// Host props or text content changed
pub const UPDATE: u32 = 1 << 1;

/// Node has children queued in its deletion list
pub const CHILD_DELETION: u32 = 1 << 2;

/// Function component has passive effects that must run after commit
pub const PASSIVE_EFFECT: u32 = 1 << 3;

/// Element ref must be (re)attached during layout
pub const REF: u32 = 1 << 4;

// =============================================================================
// PHASE MASKS
// =============================================================================

/// Flags handled by the mutation phase
pub const MUTATION_MASK: u32 = PLACEMENT | UPDATE | CHILD_DELETION;

/// Flags handled by the layout phase (disjoint from the mutation mask)
pub const LAYOUT_MASK: u32 = REF;

/// Flags that mean the commit has deferred effects to flush.
///
/// Deletions are included because unmounting a component queues its
/// effect cleanups.
pub const PASSIVE_MASK: u32 = PASSIVE_EFFECT | CHILD_DELETION;

// =============================================================================
// HOOK EFFECT TAGS
// =============================================================================

/// Effect record belongs to a passive (deferred) effect
pub const HOOK_PASSIVE: u32 = 1 << 0;

/// Effect record must run its destroy/create pair on this commit
pub const HOOK_HAS_EFFECT: u32 = 1 << 1;

// =============================================================================
// TESTS
// =============================================================================
