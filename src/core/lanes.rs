// ============================================================================
// spark-fiber - Lanes
// Priority bitsets: union of pending work, highest-priority extraction
// ============================================================================
//
// A lane is one bit. Lower bits are more urgent, so the lowest set bit of a
// lane set is its highest priority lane (`lanes & -lanes`).
// ============================================================================

use crate::core::context::with_context;
use crate::scheduler::PriorityLevel;

/// A single priority bit.
pub type Lane = u32;

/// A set of lanes.
pub type Lanes = u32;

pub const NO_LANE: Lane = 0b00000;
pub const NO_LANES: Lanes = 0b00000;

/// Discrete user input and `flush_sync`; rendered without yielding
pub const SYNC_LANE: Lane = 0b00001;

/// Continuous input such as pointer moves and scrolling
pub const INPUT_CONTINUOUS_LANE: Lane = 0b00010;

/// Updates outside of any event
pub const DEFAULT_LANE: Lane = 0b00100;

/// Updates wrapped in `start_transition`
pub const TRANSITION_LANE: Lane = 0b01000;

pub const IDLE_LANE: Lane = 0b10000;

// =============================================================================
// SET ARITHMETIC
// =============================================================================

pub fn merge_lanes(a: Lanes, b: Lanes) -> Lanes {
    a | b
}

pub fn remove_lanes(set: Lanes, subset: Lanes) -> Lanes {
    set & !subset
}

/// Extract the most urgent lane of a set.
///
/// # Example
/// ```
/// use spark_fiber::core::lanes::*;
///
/// let pending = DEFAULT_LANE | SYNC_LANE | IDLE_LANE;
/// assert_eq!(get_highest_priority_lane(pending), SYNC_LANE);
/// assert_eq!(get_highest_priority_lane(NO_LANES), NO_LANE);
/// ```
pub fn get_highest_priority_lane(lanes: Lanes) -> Lane {
    lanes & lanes.wrapping_neg()
}

/// Whether every bit of `subset` is in `set`. `NO_LANE` is a subset of anything.
pub fn is_subset_of_lanes(set: Lanes, subset: Lanes) -> bool {
    (set & subset) == subset
}

pub fn includes_some_lane(a: Lanes, b: Lanes) -> bool {
    (a & b) != NO_LANES
}

// =============================================================================
// LANE <-> SCHEDULER PRIORITY
// =============================================================================

/// Map the most urgent lane of a set to the scheduler tier it runs at.
pub fn lanes_to_priority(lanes: Lanes) -> PriorityLevel {
    match get_highest_priority_lane(lanes) {
        SYNC_LANE => PriorityLevel::Immediate,
        INPUT_CONTINUOUS_LANE => PriorityLevel::UserBlocking,
        DEFAULT_LANE => PriorityLevel::Normal,
        TRANSITION_LANE => PriorityLevel::Low,
        _ => PriorityLevel::Idle,
    }
}

/// Inverse of [`lanes_to_priority`].
pub fn priority_to_lane(priority: PriorityLevel) -> Lane {
    match priority {
        PriorityLevel::Immediate => SYNC_LANE,
        PriorityLevel::UserBlocking => INPUT_CONTINUOUS_LANE,
        PriorityLevel::Normal => DEFAULT_LANE,
        PriorityLevel::Low => TRANSITION_LANE,
        PriorityLevel::Idle => IDLE_LANE,
    }
}

/// Pick the lane for an update issued right now.
///
/// A transition scope wins, then an event/`flush_sync` priority override,
/// then the scheduler's current priority tier.
pub fn request_update_lane(scheduler_priority: PriorityLevel) -> Lane {
    with_context(|ctx| {
        if ctx.is_transition() {
            TRANSITION_LANE
        } else if let Some(priority) = ctx.update_priority() {
            priority_to_lane(priority)
        } else {
            priority_to_lane(scheduler_priority)
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
