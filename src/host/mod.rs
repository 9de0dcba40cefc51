// ============================================================================
// spark-fiber - Host Boundary
// The operations the engine invokes on the platform tree
// ============================================================================

pub mod events;
pub mod memory;

pub use events::{EventKind, EventPhase, SyntheticEvent};
pub use memory::{HostOp, InstanceId, MemoryHost};

use std::fmt::Debug;
use std::rc::Rc;

use crate::primitives::props::Props;

/// A platform tree the engine renders into.
///
/// The engine only creates instances during completion, and only mutates
/// attached instances during commit. Methods take `&self`; implementations
/// keep their tree behind interior mutability.
pub trait HostConfig: 'static {
    /// Handle of a platform node or container
    type Handle: Clone + PartialEq + Debug + 'static;

    /// Create an element of `kind` with its initial props applied.
    fn create_element_instance(&self, kind: &str, props: &Rc<Props>) -> Self::Handle;

    fn create_text_instance(&self, content: &str) -> Self::Handle;

    /// Append `child` as the last child of `parent`, detaching it first if it
    /// is already attached somewhere.
    fn append_child(&self, parent: &Self::Handle, child: &Self::Handle);

    fn insert_before(&self, parent: &Self::Handle, child: &Self::Handle, before: &Self::Handle);

    fn remove_child(&self, parent: &Self::Handle, child: &Self::Handle);

    fn set_text_content(&self, handle: &Self::Handle, content: &str);

    /// Replace the props of an element.
    fn apply_props(&self, handle: &Self::Handle, props: &Rc<Props>);

    /// Called once per root for each supported event kind.
    fn register_event(&self, container: &Self::Handle, kind: EventKind);

    /// Parent of an attached node, used to build event paths.
    fn parent_of(&self, handle: &Self::Handle) -> Option<Self::Handle>;

    /// Props last applied to an element, used to find event handlers.
    fn props_of(&self, handle: &Self::Handle) -> Option<Rc<Props>>;
}
