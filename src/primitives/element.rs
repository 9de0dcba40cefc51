// ============================================================================
// spark-fiber - Elements
// The declarative tree: nodes, elements and the element builder
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::types::{Key, WorkTag};
use crate::primitives::component::Component;
use crate::primitives::context::AnyContext;
use crate::primitives::node_ref::NodeRef;
use crate::primitives::props::{EventHandler, PropValue, Props};
use crate::host::events::SyntheticEvent;

// =============================================================================
// NODE
// =============================================================================

/// One position of a declarative tree.
#[derive(Clone, Default)]
pub enum Node {
    /// Renders nothing
    #[default]
    Empty,
    Text(Rc<str>),
    Element(Element),
    /// A keyed or positional child list
    List(Vec<Node>),
}

impl Node {
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::Text(s) => write!(f, "{:?}", s),
            Node::Element(el) => fmt::Debug::fmt(el, f),
            Node::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(Rc::from(value))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(Rc::from(value))
    }
}

impl From<Rc<str>> for Node {
    fn from(value: Rc<str>) -> Self {
        Node::Text(value)
    }
}

macro_rules! node_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Node {
                fn from(value: $t) -> Self {
                    Node::Text(Rc::from(value.to_string()))
                }
            }
        )*
    };
}

node_from_number!(i32, i64, u32, u64, usize, f64);

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<ElementBuilder> for Node {
    fn from(value: ElementBuilder) -> Self {
        Node::Element(value.build())
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::List(value)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Empty, Into::into)
    }
}

impl FromIterator<Node> for Node {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Node::List(iter.into_iter().collect())
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Declared type of an element.
#[derive(Clone)]
pub enum ElementType {
    /// A platform element such as `"div"`
    Host(Rc<str>),
    Component(Component),
    Fragment,
    Provider(AnyContext),
}

impl ElementType {
    /// Whether a node built for `self` can be reused for `other`.
    pub fn same_type(&self, other: &ElementType) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Component(a), ElementType::Component(b)) => a == b,
            (ElementType::Fragment, ElementType::Fragment) => true,
            (ElementType::Provider(a), ElementType::Provider(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn work_tag(&self) -> WorkTag {
        match self {
            ElementType::Host(_) => WorkTag::HostComponent,
            ElementType::Component(_) => WorkTag::FunctionComponent,
            ElementType::Fragment => WorkTag::Fragment,
            ElementType::Provider(_) => WorkTag::ContextProvider,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(kind) => write!(f, "{}", kind),
            ElementType::Component(c) => write!(f, "{}", c.name()),
            ElementType::Fragment => f.write_str("Fragment"),
            ElementType::Provider(_) => f.write_str("Provider"),
        }
    }
}

/// A declared element.
#[derive(Clone)]
pub struct Element {
    pub element_type: ElementType,
    pub key: Option<Key>,
    pub node_ref: Option<NodeRef>,
    pub props: Rc<Props>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("type", &self.element_type);
        if let Some(key) = &self.key {
            s.field("key", key);
        }
        s.field("props", &*self.props);
        if !self.props.children.is_empty() {
            s.field("children", &self.props.children);
        }
        s.finish()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Fluent construction of an [`Element`].
///
/// # Example
///
/// ```
/// use spark_fiber::{element, Node};
///
/// let list: Node = element("ul")
///     .attr("id", "todos")
///     .child(element("li").key("a").child("first"))
///     .child(element("li").key("b").child("second"))
///     .into();
///
/// let el = list.as_element().unwrap();
/// assert_eq!(el.props.get_str("id"), Some("todos"));
/// assert!(matches!(el.props.children, Node::List(ref items) if items.len() == 2));
/// ```
pub struct ElementBuilder {
    element_type: ElementType,
    key: Option<Key>,
    node_ref: Option<NodeRef>,
    props: Props,
    children: Vec<Node>,
}

impl ElementBuilder {
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            key: None,
            node_ref: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    /// Attach an event handler under `name` (`"onClick"`, `"onClickCapture"`, ...).
    pub fn on(mut self, name: &str, handler: impl Fn(&SyntheticEvent) + 'static) -> Self {
        self.props.set(name, EventHandler::new(handler));
        self
    }

    pub fn node_ref(mut self, node_ref: &NodeRef) -> Self {
        self.node_ref = Some(node_ref.clone());
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Replace the prop bag. Children added with `child` still win.
    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Finish the element. One child is stored as is, several as a list.
    pub fn build(self) -> Element {
        let ElementBuilder {
            element_type,
            key,
            node_ref,
            mut props,
            mut children,
        } = self;

        if !children.is_empty() {
            props.children = if children.len() == 1 {
                children.remove(0)
            } else {
                Node::List(children)
            };
        }

        Element {
            element_type,
            key,
            node_ref,
            props: Rc::new(props),
        }
    }
}

/// Start a host element of `kind`.
pub fn element(kind: &str) -> ElementBuilder {
    ElementBuilder::new(ElementType::Host(Rc::from(kind)))
}

/// Start a fragment: its children render in place, without a host node.
pub fn fragment() -> ElementBuilder {
    ElementBuilder::new(ElementType::Fragment)
}

pub fn text(content: impl Into<Rc<str>>) -> Node {
    Node::Text(content.into())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_child_is_not_wrapped() {
        let el = element("p").child("hi").build();
        assert!(matches!(&el.props.children, Node::Text(t) if &**t == "hi"));
    }

    #[test]
    fn no_children_is_empty() {
        let el = element("br").build();
        assert!(el.props.children.is_empty());
    }

    #[test]
    fn numbers_become_text() {
        assert!(matches!(Node::from(42), Node::Text(t) if &*t == "42"));
    }

    #[test]
    fn host_types_compare_by_kind() {
        let div = ElementType::Host(Rc::from("div"));
        assert!(div.same_type(&ElementType::Host(Rc::from("div"))));
        assert!(!div.same_type(&ElementType::Host(Rc::from("span"))));
        assert!(!div.same_type(&ElementType::Fragment));
        assert_eq!(div.work_tag(), WorkTag::HostComponent);
    }

    #[test]
    fn option_and_iterators_convert() {
        let none: Option<&str> = None;
        assert!(Node::from(none).is_empty());

        let list: Node = (0..3).map(Node::from).collect();
        assert!(matches!(list, Node::List(ref items) if items.len() == 3));
    }

    #[test]
    fn props_keeps_builder_children() {
        let el = element("div")
            .child("x")
            .props(Props::new().with("id", "a"))
            .build();
        assert_eq!(el.props.get_str("id"), Some("a"));
        assert!(matches!(&el.props.children, Node::Text(_)));
    }
}
