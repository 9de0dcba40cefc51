// ============================================================================
// spark-fiber - Primitives Module
// Declarative input: nodes, elements, props, components, contexts, refs
// ============================================================================

pub mod component;
pub mod context;
pub mod element;
pub mod node_ref;
pub mod props;

// Re-export for convenience
pub use component::Component;
pub use context::{AnyContext, Context, ContextId};
pub use element::{element, fragment, text, Element, ElementBuilder, ElementType, Node};
pub use node_ref::NodeRef;
pub use props::{EventHandler, PropValue, Props};
