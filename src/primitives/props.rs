// ============================================================================
// spark-fiber - Props
// Attribute bags carried by elements and handed to hosts and components
// ============================================================================

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::host::events::SyntheticEvent;
use crate::primitives::element::Node;

// =============================================================================
// EVENT HANDLER
// =============================================================================

/// An event callback stored in props. Compared by identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&SyntheticEvent)>);

impl EventHandler {
    pub fn new(f: impl Fn(&SyntheticEvent) + 'static) -> Self {
        EventHandler(Rc::new(f))
    }

    pub fn call(&self, event: &SyntheticEvent) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

// =============================================================================
// PROP VALUE
// =============================================================================

/// A single prop.
///
/// Scalars compare by value; handlers and opaque values by identity.
#[derive(Clone)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
    Value(Rc<dyn Any>),
}

impl PropValue {
    /// Wrap an arbitrary value for a component.
    pub fn value<T: 'static>(value: T) -> Self {
        PropValue::Value(Rc::new(value))
    }

    /// Textual form used by hosts for attributes; `None` for handlers and
    /// opaque values.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            PropValue::Str(s) => Some(s.to_string()),
            PropValue::Int(i) => Some(i.to_string()),
            PropValue::Float(f) => Some(f.to_string()),
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Handler(_) | PropValue::Value(_) => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a == b,
            (PropValue::Value(a), PropValue::Value(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(s) => write!(f, "{:?}", s),
            PropValue::Int(i) => write!(f, "{}", i),
            PropValue::Float(x) => write!(f, "{}", x),
            PropValue::Bool(b) => write!(f, "{}", b),
            PropValue::Handler(_) => f.write_str("<handler>"),
            PropValue::Value(_) => f.write_str("<value>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

// =============================================================================
// PROPS
// =============================================================================

/// Named props plus the element's children, in insertion order.
#[derive(Clone, Default)]
pub struct Props {
    attrs: Vec<(Rc<str>, PropValue)>,
    pub children: Node,
}

/// Prop name under which host text nodes keep their content
pub(crate) const CONTENT_PROP: &str = "content";

/// Prop name under which context providers carry their value
pub(crate) const VALUE_PROP: &str = "value";

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Props::set).
    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a prop, replacing an existing one of the same name in place.
    pub fn set(&mut self, name: &str, value: impl Into<PropValue>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((Rc::from(name), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            PropValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Downcast an opaque value set with [`PropValue::value`].
    pub fn get_value<T: 'static>(&self, name: &str) -> Option<&T> {
        match self.get(name)? {
            PropValue::Value(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub(crate) fn get_any(&self, name: &str) -> Option<&Rc<dyn Any>> {
        match self.get(name)? {
            PropValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn handler(&self, name: &str) -> Option<&EventHandler> {
        match self.get(name)? {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(n, v)| (&**n, v))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Whether the named props match, ignoring order and children.
    pub fn same_attrs(&self, other: &Props) -> bool {
        self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }

    // =========================================================================
    // INTERNAL SHAPES
    // =========================================================================

    pub(crate) fn text(content: Rc<str>) -> Self {
        Props::new().with(CONTENT_PROP, PropValue::Str(content))
    }

    pub(crate) fn content(&self) -> &str {
        self.get_str(CONTENT_PROP).unwrap_or_default()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.attrs {
            map.entry(name, value);
        }
        map.finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
