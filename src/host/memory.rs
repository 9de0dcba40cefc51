// ============================================================================
// spark-fiber - In-Memory Host
// A recording platform tree for tests, benchmarks and headless use
// ============================================================================
//
// Instances live in a flat table addressed by `InstanceId`. Every mutating
// call is appended to an operation log so callers can assert exactly which
// host operations a commit performed.
// ============================================================================

use std::cell::RefCell;
use std::fmt::{self, Write};
use std::rc::Rc;

use crate::host::{EventKind, HostConfig};
use crate::primitives::props::Props;

/// Handle of a node in a [`MemoryHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recorded host operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    CreateElement { id: InstanceId, kind: String },
    CreateText { id: InstanceId, content: String },
    Append { parent: InstanceId, child: InstanceId },
    InsertBefore { parent: InstanceId, child: InstanceId, before: InstanceId },
    Remove { parent: InstanceId, child: InstanceId },
    SetText { id: InstanceId, content: String },
    ApplyProps { id: InstanceId },
    RegisterEvent { container: InstanceId, kind: EventKind },
}

impl HostOp {
    /// Whether this op changes the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HostOp::Append { .. } | HostOp::InsertBefore { .. } | HostOp::Remove { .. }
        )
    }
}

enum InstanceKind {
    Container,
    Element(Rc<str>),
    Text(String),
}

struct Instance {
    kind: InstanceKind,
    props: Option<Rc<Props>>,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
}

#[derive(Default)]
struct MemoryTree {
    instances: Vec<Instance>,
    ops: Vec<HostOp>,
    events: Vec<(InstanceId, EventKind)>,
}

impl MemoryTree {
    fn alloc(&mut self, kind: InstanceKind, props: Option<Rc<Props>>) -> InstanceId {
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(Instance {
            kind,
            props,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id.0 as usize)
    }

    fn detach(&mut self, child: InstanceId) {
        let Some(parent) = self.get_mut(child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|c| *c != child);
        }
    }

    fn attach(&mut self, parent: InstanceId, child: InstanceId, before: Option<InstanceId>) {
        if self.get(parent).is_none() || self.get(child).is_none() {
            tracing::warn!(%parent, %child, "attach with unknown instance");
            return;
        }
        self.detach(child);
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.get_mut(parent) {
            let at = before
                .and_then(|b| p.children.iter().position(|c| *c == b))
                .unwrap_or(p.children.len());
            p.children.insert(at, child);
        }
    }

    fn write_markup(&self, id: InstanceId, out: &mut String) {
        let Some(instance) = self.get(id) else {
            return;
        };
        match &instance.kind {
            InstanceKind::Text(content) => out.push_str(content),
            InstanceKind::Container => self.write_children(instance, out),
            InstanceKind::Element(kind) => {
                let _ = write!(out, "<{}", kind);
                if let Some(props) = &instance.props {
                    for (name, value) in props.attrs() {
                        if let Some(attr) = value.to_attribute() {
                            let _ = write!(out, " {}=\"{}\"", name, attr);
                        }
                    }
                }
                out.push('>');
                self.write_children(instance, out);
                let _ = write!(out, "</{}>", kind);
            }
        }
    }

    fn write_children(&self, instance: &Instance, out: &mut String) {
        for child in &instance.children {
            self.write_markup(*child, out);
        }
    }
}

/// A host that keeps its tree in memory and logs every operation.
///
/// Cloning shares the tree.
///
/// # Example
///
/// ```
/// use spark_fiber::{HostConfig, MemoryHost, Props};
/// use std::rc::Rc;
///
/// let host = MemoryHost::new();
/// let container = host.create_container();
/// let div = host.create_element_instance("div", &Rc::new(Props::new().with("id", "a")));
/// let label = host.create_text_instance("hi");
/// host.append_child(&div, &label);
/// host.append_child(&container, &div);
///
/// assert_eq!(host.markup(container), r#"<div id="a">hi</div>"#);
/// ```
#[derive(Clone, Default)]
pub struct MemoryHost {
    tree: Rc<RefCell<MemoryTree>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh detached container to render a root into.
    pub fn create_container(&self) -> InstanceId {
        self.tree.borrow_mut().alloc(InstanceKind::Container, None)
    }

    /// The operation log since creation or the last [`take_ops`](Self::take_ops).
    pub fn ops(&self) -> Vec<HostOp> {
        self.tree.borrow().ops.clone()
    }

    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut self.tree.borrow_mut().ops)
    }

    /// Serialize the subtree under `id`, skipping handler and opaque props.
    pub fn markup(&self, id: InstanceId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        match tree.get(id) {
            Some(instance) if matches!(instance.kind, InstanceKind::Container) => {
                tree.write_children(instance, &mut out)
            }
            Some(_) => tree.write_markup(id, &mut out),
            None => {}
        }
        out
    }

    pub fn children(&self, id: InstanceId) -> Vec<InstanceId> {
        self.tree
            .borrow()
            .get(id)
            .map(|i| i.children.clone())
            .unwrap_or_default()
    }

    /// Content of a text instance.
    pub fn text(&self, id: InstanceId) -> Option<String> {
        match self.tree.borrow().get(id).map(|i| &i.kind) {
            Some(InstanceKind::Text(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Element kind, `None` for text and containers.
    pub fn kind(&self, id: InstanceId) -> Option<String> {
        match self.tree.borrow().get(id).map(|i| &i.kind) {
            Some(InstanceKind::Element(kind)) => Some(kind.to_string()),
            _ => None,
        }
    }

    /// First element of `kind` under `root`, depth first.
    pub fn find(&self, root: InstanceId, kind: &str) -> Option<InstanceId> {
        self.find_all(root, kind).into_iter().next()
    }

    /// Every element of `kind` under `root`, in document order.
    pub fn find_all(&self, root: InstanceId, kind: &str) -> Vec<InstanceId> {
        let tree = self.tree.borrow();
        let mut found = Vec::new();
        let mut stack: Vec<InstanceId> = self.children(root).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            let Some(instance) = tree.get(id) else {
                continue;
            };
            if matches!(&instance.kind, InstanceKind::Element(k) if &**k == kind) {
                found.push(id);
            }
            stack.extend(instance.children.iter().rev().copied());
        }
        found
    }

    /// Event kinds registered on `container`, in registration order.
    pub fn registered_events(&self, container: InstanceId) -> Vec<EventKind> {
        self.tree
            .borrow()
            .events
            .iter()
            .filter(|(c, _)| *c == container)
            .map(|(_, kind)| *kind)
            .collect()
    }

    fn record(&self, op: HostOp) {
        tracing::trace!(?op, "host op");
        self.tree.borrow_mut().ops.push(op);
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("MemoryHost")
            .field("instances", &tree.instances.len())
            .field("ops", &tree.ops.len())
            .finish()
    }
}

impl HostConfig for MemoryHost {
    type Handle = InstanceId;

    fn create_element_instance(&self, kind: &str, props: &Rc<Props>) -> InstanceId {
        let id = self
            .tree
            .borrow_mut()
            .alloc(InstanceKind::Element(Rc::from(kind)), Some(props.clone()));
        self.record(HostOp::CreateElement {
            id,
            kind: kind.to_string(),
        });
        id
    }

    fn create_text_instance(&self, content: &str) -> InstanceId {
        let id = self
            .tree
            .borrow_mut()
            .alloc(InstanceKind::Text(content.to_string()), None);
        self.record(HostOp::CreateText {
            id,
            content: content.to_string(),
        });
        id
    }

    fn append_child(&self, parent: &InstanceId, child: &InstanceId) {
        self.tree.borrow_mut().attach(*parent, *child, None);
        self.record(HostOp::Append {
            parent: *parent,
            child: *child,
        });
    }

    fn insert_before(&self, parent: &InstanceId, child: &InstanceId, before: &InstanceId) {
        self.tree.borrow_mut().attach(*parent, *child, Some(*before));
        self.record(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
    }

    fn remove_child(&self, parent: &InstanceId, child: &InstanceId) {
        {
            let mut tree = self.tree.borrow_mut();
            if tree.get(*child).and_then(|c| c.parent) == Some(*parent) {
                tree.detach(*child);
            } else {
                tracing::warn!(%parent, %child, "remove_child of a non-child");
            }
        }
        self.record(HostOp::Remove {
            parent: *parent,
            child: *child,
        });
    }

    fn set_text_content(&self, handle: &InstanceId, content: &str) {
        if let Some(instance) = self.tree.borrow_mut().get_mut(*handle) {
            instance.kind = InstanceKind::Text(content.to_string());
        }
        self.record(HostOp::SetText {
            id: *handle,
            content: content.to_string(),
        });
    }

    fn apply_props(&self, handle: &InstanceId, props: &Rc<Props>) {
        if let Some(instance) = self.tree.borrow_mut().get_mut(*handle) {
            instance.props = Some(props.clone());
        }
        self.record(HostOp::ApplyProps { id: *handle });
    }

    fn register_event(&self, container: &InstanceId, kind: EventKind) {
        self.tree.borrow_mut().events.push((*container, kind));
        self.record(HostOp::RegisterEvent {
            container: *container,
            kind,
        });
    }

    fn parent_of(&self, handle: &InstanceId) -> Option<InstanceId> {
        self.tree.borrow().get(*handle).and_then(|i| i.parent)
    }

    fn props_of(&self, handle: &InstanceId) -> Option<Rc<Props>> {
        self.tree.borrow().get(*handle).and_then(|i| i.props.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn el(host: &MemoryHost, kind: &str) -> InstanceId {
        host.create_element_instance(kind, &Rc::new(Props::new()))
    }

    #[test]
    fn append_moves_attached_child() {
        let host = MemoryHost::new();
        let root = host.create_container();
        let (a, b) = (el(&host, "a"), el(&host, "b"));
        host.append_child(&root, &a);
        host.append_child(&root, &b);
        host.append_child(&root, &a);

        assert_eq!(host.children(root), vec![b, a]);
        assert_eq!(host.parent_of(&a), Some(root));
    }

    #[test]
    fn insert_before_and_remove() {
        let host = MemoryHost::new();
        let root = host.create_container();
        let (a, b, c) = (el(&host, "a"), el(&host, "b"), el(&host, "c"));
        host.append_child(&root, &a);
        host.append_child(&root, &c);
        host.insert_before(&root, &b, &c);
        assert_eq!(host.markup(root), "<a></a><b></b><c></c>");

        host.remove_child(&root, &b);
        assert_eq!(host.markup(root), "<a></a><c></c>");
        assert_eq!(host.parent_of(&b), None);
    }

    #[test]
    fn markup_skips_handlers_and_values() {
        use crate::host::SyntheticEvent;
        use crate::primitives::props::{EventHandler, PropValue};

        let host = MemoryHost::new();
        let root = host.create_container();
        let props = Props::new()
            .with("id", "x")
            .with("onClick", EventHandler::new(|_: &SyntheticEvent| {}))
            .with("data", PropValue::value(3u8))
            .with("n", 2);
        let div = host.create_element_instance("div", &Rc::new(props));
        let t = host.create_text_instance("a");
        host.append_child(&div, &t);
        host.append_child(&root, &div);

        assert_eq!(host.markup(root), r#"<div id="x" n="2">a</div>"#);
        host.set_text_content(&t, "b");
        assert_eq!(host.text(t).as_deref(), Some("b"));
        assert_eq!(host.markup(div), r#"<div id="x" n="2">b</div>"#);
    }

    #[test]
    fn ops_are_logged_in_order() {
        let host = MemoryHost::new();
        let root = host.create_container();
        let a = el(&host, "a");
        host.append_child(&root, &a);
        host.register_event(&root, EventKind::Click);

        let ops = host.take_ops();
        assert_eq!(
            ops,
            vec![
                HostOp::CreateElement { id: a, kind: "a".into() },
                HostOp::Append { parent: root, child: a },
                HostOp::RegisterEvent { container: root, kind: EventKind::Click },
            ]
        );
        assert!(ops[1].is_structural());
        assert!(host.ops().is_empty());
        assert_eq!(host.registered_events(root), vec![EventKind::Click]);
    }

    #[test]
    fn find_walks_in_document_order() {
        let host = MemoryHost::new();
        let root = host.create_container();
        let (ul, li1, li2) = (el(&host, "ul"), el(&host, "li"), el(&host, "li"));
        host.append_child(&ul, &li1);
        host.append_child(&ul, &li2);
        host.append_child(&root, &ul);

        assert_eq!(host.find(root, "li"), Some(li1));
        assert_eq!(host.find_all(root, "li"), vec![li1, li2]);
        assert_eq!(host.kind(ul).as_deref(), Some("ul"));
        assert_eq!(host.find(root, "p"), None);
    }
}
