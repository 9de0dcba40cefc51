// ============================================================================
// spark-fiber - Components
// Render functions with identity
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::error::RenderError;
use crate::primitives::element::{ElementBuilder, ElementType, Node};
use crate::primitives::props::Props;
use crate::reactivity::hooks::Hooks;

type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> Result<Node, RenderError>;

struct ComponentInner {
    name: &'static str,
    render: Box<RenderFn>,
}

/// A function component.
///
/// Identity is the allocation: clones of one `Component` are the same type
/// for reconciliation, two `Component::new` calls never are. Create each
/// component once and clone it where it is used.
///
/// # Example
///
/// ```
/// use spark_fiber::{element, Component, Node};
///
/// let greeting = Component::new("Greeting", |_hooks, props| {
///     let name = props.get_str("name").unwrap_or("world").to_string();
///     element("p").child(format!("hello {name}")).into()
/// });
///
/// let node: Node = greeting.element().attr("name", "fiber").into();
/// assert!(node.as_element().is_some());
/// ```
#[derive(Clone)]
pub struct Component(Rc<ComponentInner>);

impl Component {
    /// A component that always renders.
    pub fn new(
        name: &'static str,
        render: impl Fn(&mut Hooks<'_>, &Props) -> Node + 'static,
    ) -> Self {
        Component(Rc::new(ComponentInner {
            name,
            render: Box::new(move |hooks: &mut Hooks<'_>, props: &Props| Ok(render(hooks, props))),
        }))
    }

    /// A component whose render can fail. A failure aborts the render pass.
    pub fn fallible<E: fmt::Display + 'static>(
        name: &'static str,
        render: impl Fn(&mut Hooks<'_>, &Props) -> Result<Node, E> + 'static,
    ) -> Self {
        Component(Rc::new(ComponentInner {
            name,
            render: Box::new(move |hooks: &mut Hooks<'_>, props: &Props| {
                render(hooks, props).map_err(|e| RenderError::component(name, e.to_string()))
            }),
        }))
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Start an element of this component.
    pub fn element(&self) -> ElementBuilder {
        ElementBuilder::new(ElementType::Component(self.clone()))
    }

    pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Result<Node, RenderError> {
        (self.0.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0.name)
    }
}
