// ============================================================================
// spark-fiber - Dependency Equality
// Effect dependency snapshots and their comparison
// ============================================================================

use std::any::Any;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// DEP
// =============================================================================

/// One entry of an effect's dependency list.
///
/// Built either from a value compared with `PartialEq`, or from an `Rc`
/// compared by identity.
#[derive(Clone)]
pub struct Dep {
    value: Rc<dyn Any>,
    same: fn(&dyn Any, &dyn Any) -> bool,
}

fn same_value<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn same_pointer<T: 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<Rc<T>>(), b.downcast_ref::<Rc<T>>()) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl Dep {
    /// A dependency compared by value.
    pub fn new<T: PartialEq + 'static>(value: T) -> Self {
        Self {
            value: Rc::new(value),
            same: same_value::<T>,
        }
    }

    /// A dependency compared by `Rc` identity.
    pub fn ptr<T: 'static>(value: &Rc<T>) -> Self {
        Self {
            value: Rc::new(value.clone()),
            same: same_pointer::<T>,
        }
    }

    /// Whether two entries are identical. Entries of different types never are.
    pub fn same(&self, other: &Dep) -> bool {
        (self.same)(&*self.value, &*other.value)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dep(..)")
    }
}

// =============================================================================
// COMPARISON
// =============================================================================

/// Compare two dependency lists.
///
/// A missing list means "run on every render" and never compares equal.
/// Otherwise entries are compared pairwise up to the shorter length.
///
/// # Example
/// ```
/// use spark_fiber::reactivity::equality::{are_hook_inputs_equal, Dep};
///
/// let a = vec![Dep::new(1), Dep::new("x")];
/// let b = vec![Dep::new(1), Dep::new("x")];
/// assert!(are_hook_inputs_equal(Some(&a[..]), Some(&b[..])));
/// assert!(!are_hook_inputs_equal(None, Some(&b[..])));
/// ```
pub fn are_hook_inputs_equal(next: Option<&[Dep]>, prev: Option<&[Dep]>) -> bool {
    let (Some(next), Some(prev)) = (next, prev) else {
        return false;
    };
    next.iter().zip(prev.iter()).all(|(a, b)| a.same(b))
}

// =============================================================================
// TESTS
// =============================================================================
