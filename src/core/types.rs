// ============================================================================
// spark-fiber - Type Definitions
// Identifiers shared by the work tree, the reconciler and the hook store
// ============================================================================

use std::fmt;
use std::rc::Rc;

slotmap::new_key_type! {
    /// Generational handle of a work node in a root's arena.
    ///
    /// Handles of released nodes stop resolving, so a state setter that
    /// outlives its component is detected instead of touching a reused slot.
    pub struct NodeId;
}

/// Kind of a work node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkTag {
    /// The root of a mount point; its host handle is the container
    HostRoot,
    /// A platform element (`"div"`, `"span"`, ...)
    HostComponent,
    /// A platform text node
    HostText,
    /// A user component function
    FunctionComponent,
    /// A host-less wrapper around a child list
    Fragment,
    /// A context provider
    ContextProvider,
}

impl WorkTag {
    /// Whether nodes of this kind own a host instance
    pub fn is_host(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostText)
    }
}

// =============================================================================
// KEY
// =============================================================================

/// Identity key of an element among its siblings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key(Rc::from(value))
    }
}

macro_rules! key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(value: $t) -> Self {
                    Key(Rc::from(value.to_string()))
                }
            }
        )*
    };
}

key_from_int!(i32, i64, u32, u64, usize);

/// Lookup key used by keyed-array reconciliation: an explicit key, or the
/// position when the element has none.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Key(Key),
    Index(usize),
}

impl SlotKey {
    pub fn new(key: Option<&Key>, index: usize) -> Self {
        match key {
            Some(key) => SlotKey::Key(key.clone()),
            None => SlotKey::Index(index),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
