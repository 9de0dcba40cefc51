// ============================================================================
// spark-fiber - Node Refs
// Handles to committed host instances
// ============================================================================

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A slot that holds the host handle of the element it is attached to.
///
/// Set during the layout phase of the commit that mounts the element,
/// cleared when the element is deleted or the ref moves to another element.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<Rc<dyn Any>>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The attached handle, if any and if it has type `T`.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.0.borrow().as_ref()?.downcast_ref::<T>().cloned()
    }

    pub fn is_attached(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub(crate) fn attach<T: 'static>(&self, handle: T) {
        *self.0.borrow_mut() = Some(Rc::new(handle));
    }

    pub(crate) fn detach(&self) {
        *self.0.borrow_mut() = None;
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("attached", &self.is_attached())
            .finish()
    }
}
