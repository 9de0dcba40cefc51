// Integration tests for hooks rendered through a real root: state, reducers,
// effects and their dependency lists, refs, context and hook misuse.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_fiber::{
    deps, element, Cleanup, Component, Context, Dispatch, InstanceId, ManualScheduler,
    MemoryHost, Node, Props, Root, SetState,
};

type Log = Rc<RefCell<Vec<String>>>;

struct Harness {
    host: MemoryHost,
    container: InstanceId,
    scheduler: Rc<ManualScheduler>,
    root: Root<MemoryHost>,
}

impl Harness {
    fn mount(node: impl Into<Node>) -> Self {
        let host = MemoryHost::new();
        let container = host.create_container();
        let scheduler = Rc::new(ManualScheduler::new());
        let root = Root::mount(host.clone(), scheduler.clone(), container, node);
        scheduler.flush_all();
        Self {
            host,
            container,
            scheduler,
            root,
        }
    }

    fn markup(&self) -> String {
        self.host.markup(self.container)
    }

    fn rerender(&self, node: impl Into<Node>) {
        self.root.update(node);
        self.scheduler.flush_all();
    }
}

fn slot<T>() -> Rc<RefCell<Option<T>>> {
    Rc::new(RefCell::new(None))
}

fn take<T: Clone>(slot: &Rc<RefCell<Option<T>>>) -> T {
    slot.borrow().clone().expect("component rendered")
}

// =============================================================================
// STATE
// =============================================================================

#[test]
fn state_updates_batch_into_one_commit() {
    let setter: Rc<RefCell<Option<SetState<i32>>>> = slot();
    let s = setter.clone();
    let counter = Component::new("Counter", move |hooks, _| {
        let (count, set) = hooks.use_state(|| 0);
        *s.borrow_mut() = Some(set);
        element("b").child(count).into()
    });

    let h = Harness::mount(counter.element());
    assert_eq!(h.markup(), "<b>0</b>");

    let set = take(&setter);
    set.update(|n| n + 1);
    set.update(|n| n + 1);
    set.update(|n| n * 10);
    h.scheduler.flush_all();

    assert_eq!(h.markup(), "<b>20</b>");
    assert_eq!(h.root.commit_count(), 2);
}

#[test]
fn reducer_dispatches_actions() {
    #[derive(Clone)]
    enum Op {
        Push(&'static str),
        Clear,
    }

    let dispatch: Rc<RefCell<Option<Dispatch<Vec<&'static str>, Op>>>> = slot();
    let d = dispatch.clone();
    let list = Component::new("List", move |hooks, _| {
        let (items, dispatch) = hooks.use_reducer(
            |items: &Vec<&'static str>, op: Op| match op {
                Op::Push(item) => {
                    let mut next = items.clone();
                    next.push(item);
                    next
                }
                Op::Clear => Vec::new(),
            },
            Vec::new(),
        );
        *d.borrow_mut() = Some(dispatch);
        element("ul")
            .children(items.iter().map(|i| element("li").key(*i).child(*i)))
            .into()
    });

    let h = Harness::mount(list.element());
    let dispatch = take(&dispatch);
    dispatch.dispatch(Op::Push("x"));
    dispatch.dispatch(Op::Push("y"));
    h.scheduler.flush_all();
    assert_eq!(h.markup(), "<ul><li>x</li><li>y</li></ul>");

    dispatch.dispatch(Op::Clear);
    h.scheduler.flush_all();
    assert_eq!(h.markup(), "<ul></ul>");
}

#[test]
fn state_is_kept_per_keyed_instance() {
    let setters: Rc<RefCell<Vec<(String, SetState<i32>)>>> = Rc::new(RefCell::new(Vec::new()));
    let s = setters.clone();
    let item = Component::new("Item", move |hooks, props| {
        let name = props.get_str("name").unwrap_or_default().to_string();
        let (count, set) = hooks.use_state(|| 0);
        s.borrow_mut().push((name.clone(), set));
        element("li").child(format!("{name}{count}")).into()
    });

    let list = |names: &[&str]| -> Node {
        element("ul")
            .children(names.iter().map(|n| item.element().key(*n).attr("name", *n)))
            .into()
    };

    let h = Harness::mount(list(&["a", "b"]));
    let set_b = setters
        .borrow()
        .iter()
        .find(|(n, _)| n == "b")
        .map(|(_, s)| s.clone())
        .expect("b rendered");
    set_b.set(5);
    h.scheduler.flush_all();
    assert_eq!(h.markup(), "<ul><li>a0</li><li>b5</li></ul>");

    // Reordering moves state along with the key
    h.rerender(list(&["b", "a"]));
    assert_eq!(h.markup(), "<ul><li>b5</li><li>a0</li></ul>");
}

#[test]
fn setter_after_unmount_is_ignored() {
    let setter: Rc<RefCell<Option<SetState<i32>>>> = slot();
    let s = setter.clone();
    let counter = Component::new("Counter", move |hooks, _| {
        let (count, set) = hooks.use_state(|| 0);
        *s.borrow_mut() = Some(set);
        Node::from(count)
    });

    let h = Harness::mount(element("div").child(counter.element()));
    h.rerender(element("div"));
    assert_eq!(h.markup(), "<div></div>");
    let commits = h.root.commit_count();

    take(&setter).set(9);
    h.scheduler.flush_all();
    assert_eq!(h.root.commit_count(), commits);
    assert!(!h.root.has_pending_work());
}

// =============================================================================
// EFFECTS
// =============================================================================

fn effect_component(log: &Log) -> Component {
    let log = log.clone();
    Component::new("Effectful", move |hooks, props| {
        let value = props.get_int("value").unwrap_or_default();
        let log = log.clone();
        hooks.use_effect(deps![value], move || {
            log.borrow_mut().push(format!("run {value}"));
            Cleanup::new(move || log.borrow_mut().push(format!("cleanup {value}")))
        });
        Node::from(value)
    })
}

#[test]
fn effects_run_only_when_dependencies_change() {
    let log: Log = Rc::default();
    let effectful = effect_component(&log);

    let h = Harness::mount(effectful.element().attr("value", 1));
    assert_eq!(*log.borrow(), vec!["run 1"]);

    // Same deps: rendering again is idempotent
    h.rerender(effectful.element().attr("value", 1));
    h.rerender(effectful.element().attr("value", 1));
    assert_eq!(*log.borrow(), vec!["run 1"]);

    h.rerender(effectful.element().attr("value", 2));
    assert_eq!(*log.borrow(), vec!["run 1", "cleanup 1", "run 2"]);
}

#[test]
fn effects_without_deps_run_after_every_commit() {
    let runs = Rc::new(Cell::new(0));
    let r = runs.clone();
    let every = Component::new("Every", move |hooks, _| {
        let r = r.clone();
        hooks.use_effect(None, move || {
            r.set(r.get() + 1);
            Cleanup::none()
        });
        Node::Empty
    });

    let h = Harness::mount(every.element());
    h.rerender(every.element());
    h.rerender(every.element());
    assert_eq!(runs.get(), 3);
}

#[test]
fn empty_deps_run_once_and_clean_up_on_unmount() {
    let log: Log = Rc::default();
    let l = log.clone();
    let once = Component::new("Once", move |hooks, _| {
        let l = l.clone();
        hooks.use_effect(deps![], move || {
            l.borrow_mut().push("mount".into());
            Cleanup::new(move || l.borrow_mut().push("unmount".into()))
        });
        element("i").into()
    });

    let h = Harness::mount(once.element());
    h.rerender(once.element());
    assert_eq!(*log.borrow(), vec!["mount"]);

    h.root.unmount();
    assert_eq!(*log.borrow(), vec!["mount", "unmount"]);
}

#[test]
fn effect_can_set_state_and_trigger_another_commit() {
    let ready = Component::new("Ready", |hooks, _| {
        let (ready, set_ready) = hooks.use_state(|| false);
        hooks.use_effect(deps![], move || {
            set_ready.set(true);
            Cleanup::none()
        });
        element("p").child(if ready { "ready" } else { "loading" }).into()
    });

    let h = Harness::mount(ready.element());
    assert_eq!(h.markup(), "<p>ready</p>");
    assert_eq!(h.root.commit_count(), 2);
}

// =============================================================================
// REFS
// =============================================================================

#[test]
fn use_ref_persists_without_rerendering() {
    let renders = Rc::new(Cell::new(0));
    let seen: Rc<RefCell<Vec<u32>>> = Rc::default();

    let (r, s) = (renders.clone(), seen.clone());
    let counter = Component::new("RefCounter", move |hooks, _| {
        r.set(r.get() + 1);
        let cell = hooks.use_ref(|| 0u32);
        *cell.borrow_mut() += 1;
        s.borrow_mut().push(*cell.borrow());
        Node::Empty
    });

    let h = Harness::mount(counter.element());
    h.rerender(counter.element());
    h.rerender(counter.element());
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    assert_eq!(renders.get(), 3);
}

#[test]
fn node_ref_is_attached_before_effects_run() {
    let seen: Rc<RefCell<Option<InstanceId>>> = slot();
    let s = seen.clone();
    let focus = Component::new("Focus", move |hooks, _| {
        let input = hooks.use_node_ref();
        let (input2, s) = (input.clone(), s.clone());
        hooks.use_effect(deps![], move || {
            *s.borrow_mut() = input2.get::<InstanceId>();
            Cleanup::none()
        });
        element("input").node_ref(&input).into()
    });

    let h = Harness::mount(focus.element());
    let input = h.host.find(h.container, "input");
    assert!(input.is_some());
    assert_eq!(*seen.borrow(), input);
}

// =============================================================================
// CONTEXT
// =============================================================================

#[test]
fn context_reaches_consumers_below_a_bailed_out_subtree() {
    let theme = Context::new(String::from("light"));
    let consumer_renders = Rc::new(Cell::new(0));
    let setter: Rc<RefCell<Option<SetState<String>>>> = slot();

    let consumer = {
        let (theme, renders) = (theme.clone(), consumer_renders.clone());
        Component::new("Consumer", move |hooks, _| {
            renders.set(renders.get() + 1);
            let value = hooks.use_context(&theme);
            element("span").child((*value).clone()).into()
        })
    };

    // Built once: the same props allocation on every render, so the div
    // bails out and only propagation can reach the consumer.
    let static_subtree: Node = element("div").child(consumer.element()).into();

    let app = {
        let (theme, setter) = (theme.clone(), setter.clone());
        Component::new("App", move |hooks, _| {
            let (value, set) = hooks.use_state(|| String::from("dark"));
            *setter.borrow_mut() = Some(set);
            theme.provider(value).child(static_subtree.clone()).into()
        })
    };

    let h = Harness::mount(app.element());
    assert_eq!(h.markup(), "<div><span>dark</span></div>");
    assert_eq!(consumer_renders.get(), 1);

    take(&setter).set(String::from("dim"));
    h.scheduler.flush_all();
    assert_eq!(h.markup(), "<div><span>dim</span></div>");
    assert_eq!(consumer_renders.get(), 2);

    // An unchanged value does not reach the consumer
    take(&setter).set(String::from("dim"));
    h.scheduler.flush_all();
    assert_eq!(consumer_renders.get(), 2);
}

#[test]
fn context_defaults_and_nearest_provider_wins() {
    let level = Context::new(0i64);
    let reader = {
        let level = level.clone();
        Component::new("Reader", move |hooks, _| Node::from(*hooks.use_context(&level)))
    };

    let h = Harness::mount(
        element("div")
            .child(reader.element())
            .child(
                level
                    .provider(1)
                    .child(element("p").child(reader.element()).child(level.provider(2).child(reader.element()))),
            ),
    );
    assert_eq!(h.markup(), "<div>0<p>12</p></div>");
}

// =============================================================================
// MISUSE AND FAILURES
// =============================================================================

#[test]
#[should_panic(expected = "expected effect, found state")]
fn changing_hook_order_panics() {
    let first = Rc::new(Cell::new(true));
    let f = first.clone();
    let unstable = Component::new("Unstable", move |hooks, _| {
        if f.get() {
            hooks.use_state(|| 0);
        } else {
            hooks.use_effect(None, Cleanup::none);
        }
        Node::Empty
    });

    let h = Harness::mount(unstable.element());
    first.set(false);
    h.rerender(unstable.element());
}

#[test]
#[should_panic(expected = "rendered more hooks")]
fn adding_hooks_panics() {
    let extra = Rc::new(Cell::new(false));
    let e = extra.clone();
    let growing = Component::new("Growing", move |hooks, _| {
        hooks.use_state(|| 0);
        if e.get() {
            hooks.use_state(|| 1);
        }
        Node::Empty
    });

    let h = Harness::mount(growing.element());
    extra.set(true);
    h.rerender(growing.element());
}

#[test]
fn failing_component_aborts_and_keeps_the_committed_tree() {
    let profile = Component::fallible("Profile", |_, props: &Props| {
        match props.get_str("user") {
            Some(user) => Ok(element("h2").child(user.to_string()).into()),
            None => Err("missing user"),
        }
    });

    let h = Harness::mount(element("main").child(profile.element().attr("user", "ada")));
    assert_eq!(h.markup(), "<main><h2>ada</h2></main>");

    h.rerender(element("main").child(element("aside")).child(profile.element()));
    assert_eq!(h.markup(), "<main><h2>ada</h2></main>");
    let err = h.root.take_error().expect("render error kept on the root");
    assert!(err.to_string().contains("Profile"));
    assert!(h.root.take_error().is_none());

    // The next update renders normally
    h.rerender(element("main").child(profile.element().attr("user", "grace")));
    assert_eq!(h.markup(), "<main><h2>grace</h2></main>");
    assert!(h.root.take_error().is_none());
}
