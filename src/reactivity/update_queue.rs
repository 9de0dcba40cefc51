// ============================================================================
// spark-fiber - Update Queue
// Prioritized state transitions and their deterministic replay
// ============================================================================
//
// Every state cell has a shared pending ring that setters push into, plus a
// base value and base queue kept on the cell itself. Rendering merges the
// pending ring into the base queue and replays it for the render lane:
//
// - an update whose lane is not being rendered is skipped, cloned into the
//   new base queue, and (if it is the first skip) freezes the new base state
// - an applied update that follows a skip is also cloned into the new base
//   queue with NO_LANE, so the next replay reapplies it in source order
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::lanes::{is_subset_of_lanes, merge_lanes, Lane, Lanes, NO_LANE, NO_LANES};
use crate::reactivity::ring::Ring;

// =============================================================================
// UPDATE
// =============================================================================

/// What an update does to the value it is applied to.
pub enum Action<S> {
    Replace(S),
    Reduce(Rc<dyn Fn(&S) -> S>),
}

impl<S: Clone> Action<S> {
    pub fn apply(&self, prev: &S) -> S {
        match self {
            Action::Replace(value) => value.clone(),
            Action::Reduce(f) => f(prev),
        }
    }
}

impl<S: Clone> Clone for Action<S> {
    fn clone(&self) -> Self {
        match self {
            Action::Replace(value) => Action::Replace(value.clone()),
            Action::Reduce(f) => Action::Reduce(f.clone()),
        }
    }
}

impl<S> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Replace(_) => f.write_str("Replace(..)"),
            Action::Reduce(_) => f.write_str("Reduce(..)"),
        }
    }
}

/// One queued state transition.
#[derive(Debug)]
pub struct Update<S> {
    pub action: Action<S>,
    pub lane: Lane,
}

impl<S: Clone> Clone for Update<S> {
    fn clone(&self) -> Self {
        Update {
            action: self.action.clone(),
            lane: self.lane,
        }
    }
}

impl<S> Update<S> {
    pub fn new(action: Action<S>, lane: Lane) -> Self {
        Self { action, lane }
    }
}

/// Pending updates shared between a cell's setters and both of its renders.
pub struct StateQueue<S> {
    pub pending: Ring<Update<S>>,
}

impl<S> StateQueue<S> {
    pub fn new() -> Self {
        Self {
            pending: Ring::new(),
        }
    }

    pub fn enqueue(&mut self, update: Update<S>) {
        self.pending.push(update);
    }
}

impl<S> Default for StateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Result of replaying a base queue for one render lane.
#[derive(Debug)]
pub struct ProcessedQueue<S> {
    /// Value the component renders with
    pub memoized_state: S,
    /// Value the next replay starts from
    pub base_state: S,
    /// Updates the next replay must apply
    pub base_queue: Ring<Update<S>>,
    /// Lanes of the skipped updates
    pub skipped_lanes: Lanes,
}

/// Replay `queue` on top of `base_state`, applying only updates whose lane is
/// included in `render_lanes`.
///
/// # Example
///
/// ```
/// use spark_fiber::core::lanes::{DEFAULT_LANE, SYNC_LANE};
/// use spark_fiber::reactivity::ring::Ring;
/// use spark_fiber::reactivity::update_queue::{process_update_queue, Action, Update};
/// use std::rc::Rc;
///
/// let mut queue = Ring::new();
/// queue.push(Update::new(Action::Reduce(Rc::new(|s: &String| format!("{s}a"))), DEFAULT_LANE));
/// queue.push(Update::new(Action::Reduce(Rc::new(|s: &String| format!("{s}b"))), SYNC_LANE));
///
/// let urgent = process_update_queue(String::new(), &queue, SYNC_LANE);
/// assert_eq!(urgent.memoized_state, "b");
/// assert_eq!(urgent.base_state, "");
///
/// let rest = process_update_queue(urgent.base_state, &urgent.base_queue, DEFAULT_LANE);
/// assert_eq!(rest.memoized_state, "ab");
/// ```
pub fn process_update_queue<S: Clone>(
    base_state: S,
    queue: &Ring<Update<S>>,
    render_lanes: Lanes,
) -> ProcessedQueue<S> {
    let mut new_state = base_state.clone();
    let mut new_base_state: Option<S> = None;
    let mut new_base_queue = Ring::new();
    let mut skipped_lanes = NO_LANES;

    for update in queue {
        if !is_subset_of_lanes(render_lanes, update.lane) {
            if new_base_queue.is_empty() {
                new_base_state = Some(new_state.clone());
            }
            new_base_queue.push(update.clone());
            skipped_lanes = merge_lanes(skipped_lanes, update.lane);
        } else {
            if !new_base_queue.is_empty() {
                new_base_queue.push(Update::new(update.action.clone(), NO_LANE));
            }
            new_state = update.action.apply(&new_state);
        }
    }

    ProcessedQueue {
        base_state: new_base_state.unwrap_or_else(|| new_state.clone()),
        memoized_state: new_state,
        base_queue: new_base_queue,
        skipped_lanes,
    }
}

// =============================================================================
// TESTS
// =============================================================================
