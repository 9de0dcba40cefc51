// ============================================================================
// spark-fiber - Ergonomic Macros
// ============================================================================

/// Clone variables into a move closure.
///
/// Handy for event handlers and effects that capture setters.
///
/// # Usage
///
/// ```rust
/// use spark_fiber::{cloned, element, Node};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let clicks = Rc::new(Cell::new(0));
/// let button: Node = element("button")
///     .on("onClick", cloned!(clicks => move |_| clicks.set(clicks.get() + 1)))
///     .into();
/// assert_eq!(clicks.get(), 0);
/// # drop(button);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Build an effect dependency list, comparing each entry by value.
///
/// `deps![]` runs the effect once; leaving deps out (`None`) runs it after
/// every render.
///
/// # Usage
///
/// ```rust
/// use spark_fiber::deps;
///
/// let id = 3;
/// let name = String::from("ada");
/// let list = deps![id, name];
/// assert_eq!(list.map(|d| d.len()), Some(2));
/// assert_eq!(deps![].map(|d| d.len()), Some(0));
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        ::std::option::Option::Some(::std::vec::Vec::<$crate::Dep>::new())
    };
    ($($e:expr),+ $(,)?) => {
        ::std::option::Option::Some(::std::vec![$($crate::Dep::new(($e).clone())),+])
    };
}
