// ============================================================================
// spark-fiber - Context
// Values provided by an ancestor and read anywhere below it
// ============================================================================

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::primitives::element::{ElementBuilder, ElementType};
use crate::primitives::props::{PropValue, VALUE_PROP};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

pub(crate) struct ContextInner {
    id: ContextId,
    default: Rc<dyn Any>,
    same: fn(&dyn Any, &dyn Any) -> bool,
}

fn same_value<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// A typed context with a default value.
///
/// # Example
///
/// ```
/// use spark_fiber::{element, Context, Node};
///
/// let theme = Context::new(String::from("light"));
/// let tree: Node = theme
///     .provider(String::from("dark"))
///     .child(element("main"))
///     .into();
/// assert!(tree.as_element().is_some());
/// ```
pub struct Context<T> {
    inner: Rc<ContextInner>,
    _marker: PhantomData<T>,
}

impl<T: PartialEq + 'static> Context<T> {
    pub fn new(default: T) -> Self {
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Rc::new(ContextInner {
                id,
                default: Rc::new(default),
                same: same_value::<T>,
            }),
            _marker: PhantomData,
        }
    }

    /// Start a provider element that makes `value` visible to its subtree.
    pub fn provider(&self, value: T) -> ElementBuilder {
        ElementBuilder::new(ElementType::Provider(self.erased()))
            .attr(VALUE_PROP, PropValue::value(value))
    }
}

impl<T: 'static> Context<T> {
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub(crate) fn erased(&self) -> AnyContext {
        AnyContext(self.inner.clone())
    }

    /// Downcast a provided value; falls back to the default on mismatch.
    pub(crate) fn resolve(&self, value: Option<Rc<dyn Any>>) -> Rc<T> {
        value
            .and_then(|v| v.downcast::<T>().ok())
            .or_else(|| self.inner.default.clone().downcast::<T>().ok())
            .unwrap_or_else(|| unreachable!("context default has the context's type"))
    }
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({:?})", self.inner.id)
    }
}

/// A context with its value type erased, as stored in element types.
#[derive(Clone)]
pub struct AnyContext(pub(crate) Rc<ContextInner>);

impl AnyContext {
    pub fn id(&self) -> ContextId {
        self.0.id
    }

    pub(crate) fn default_value(&self) -> Rc<dyn Any> {
        self.0.default.clone()
    }

    /// Whether two provided values are equal under the context's `PartialEq`.
    pub(crate) fn same_value(&self, a: &dyn Any, b: &dyn Any) -> bool {
        (self.0.same)(a, b)
    }
}

impl PartialEq for AnyContext {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl fmt::Debug for AnyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyContext({:?})", self.0.id)
    }
}
