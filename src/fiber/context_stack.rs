// ============================================================================
// spark-fiber - Context Stack
// Provider values visible at the current point of the traversal
// ============================================================================

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::primitives::context::ContextId;

/// Current value per context, plus the values each push shadowed.
///
/// Providers push when they begin and pop when they complete, so the map
/// always reflects the providers enclosing the node being worked on.
#[derive(Default)]
pub(crate) struct ContextStack {
    values: FxHashMap<ContextId, Rc<dyn Any>>,
    stack: Vec<(ContextId, Option<Rc<dyn Any>>)>,
}

impl ContextStack {
    pub(crate) fn push(&mut self, id: ContextId, value: Rc<dyn Any>) {
        let prev = self.values.insert(id, value);
        self.stack.push((id, prev));
    }

    pub(crate) fn pop(&mut self, id: ContextId) {
        let Some((top, prev)) = self.stack.pop() else {
            tracing::warn!(?id, "context pop on an empty stack");
            return;
        };
        if top != id {
            tracing::warn!(expected = ?top, found = ?id, "unbalanced context pop");
        }
        match prev {
            Some(value) => {
                self.values.insert(top, value);
            }
            None => {
                self.values.remove(&top);
            }
        }
    }

    pub(crate) fn read(&self, id: ContextId) -> Option<Rc<dyn Any>> {
        self.values.get(&id).cloned()
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drop everything; used when a render pass is thrown away mid-tree.
    pub(crate) fn reset(&mut self) {
        self.values.clear();
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::context::Context;

    fn read_u8(stack: &ContextStack, id: ContextId) -> Option<u8> {
        stack.read(id).and_then(|v| v.downcast_ref::<u8>().copied())
    }

    #[test]
    fn nested_providers_shadow_and_restore() {
        let ctx = Context::new(0u8);
        let id = ctx.id();
        let mut stack = ContextStack::default();

        assert_eq!(read_u8(&stack, id), None);
        stack.push(id, Rc::new(1u8));
        stack.push(id, Rc::new(2u8));
        assert_eq!(read_u8(&stack, id), Some(2));

        stack.pop(id);
        assert_eq!(read_u8(&stack, id), Some(1));
        stack.pop(id);
        assert_eq!(read_u8(&stack, id), None);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn contexts_are_independent() {
        let (a, b) = (Context::new(0u8), Context::new(0u8));
        let mut stack = ContextStack::default();
        stack.push(a.id(), Rc::new(1u8));
        stack.push(b.id(), Rc::new(2u8));
        stack.pop(b.id());

        assert_eq!(read_u8(&stack, a.id()), Some(1));
        assert_eq!(read_u8(&stack, b.id()), None);

        stack.reset();
        assert_eq!(read_u8(&stack, a.id()), None);
        assert_eq!(stack.depth(), 0);
    }
}
