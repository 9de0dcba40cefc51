// Integration tests for lanes and the work loop: time slicing, preemption,
// priority replay and transitions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_fiber::core::lanes::{DEFAULT_LANE, NO_LANES, TRANSITION_LANE};
use spark_fiber::{
    element, flush_sync, start_transition, with_update_priority, Component, EventKind,
    InstanceId, ManualScheduler, MemoryHost, Node, PriorityLevel, Root, SetState,
};

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
}

type Setter<T> = Rc<RefCell<Option<SetState<T>>>>;

fn get<T: Clone>(slot: &Setter<T>) -> SetState<T> {
    slot.borrow().clone().expect("component rendered")
}

/// A text cell plus a long list, so a render has enough units to slice.
fn search_app(query: &Setter<String>, results: &Setter<String>) -> Component {
    let (query, results) = (query.clone(), results.clone());
    Component::new("Search", move |hooks, _| {
        let (q, set_q) = hooks.use_state(|| String::from("a"));
        let (r, set_r) = hooks.use_state(|| String::from("a"));
        *query.borrow_mut() = Some(set_q);
        *results.borrow_mut() = Some(set_r);

        element("div")
            .child(element("input").attr("value", q))
            .child(
                element("ul").children((0..8).map(|i| element("li").key(i).child(format!("{r}{i}")))),
            )
            .into()
    })
}

#[test]
fn long_renders_are_sliced() {
    let host = MemoryHost::new();
    let container = host.create_container();
    let scheduler = Rc::new(ManualScheduler::new());
    scheduler.set_yield_after(Some(2));

    let list = element("ul").children((0..10).map(|i| element("li").key(i).child(i)));
    let root = Root::mount(host.clone(), scheduler.clone(), container, list);

    assert!(scheduler.run_next_task());
    assert_eq!(host.markup(container), "", "nothing is visible mid-render");
    assert_eq!(root.pending_lanes(), DEFAULT_LANE);

    assert!(scheduler.flush_all() > 1);
    assert!(host.markup(container).starts_with("<ul><li>0</li>"));
    assert_eq!(root.commit_count(), 1);
}

#[test]
fn expired_work_runs_to_completion() {
    let host = MemoryHost::new();
    let container = host.create_container();
    let scheduler = Rc::new(ManualScheduler::new());
    scheduler.set_yield_after(Some(1));

    let list = element("ul").children((0..10).map(|i| element("li").key(i).child(i)));
    let root = Root::mount(host.clone(), scheduler.clone(), container, list);

    scheduler.advance(PriorityLevel::Normal.timeout() + 1);
    assert!(scheduler.run_next_task());
    assert_eq!(root.commit_count(), 1);
}

#[test]
fn updates_outside_events_share_a_default_lane_commit() {
    let (query, results) = (Rc::default(), Rc::default());
    let h = Harness::mount(search_app(&query, &results).element());

    get(&query).set(String::from("b"));
    get(&results).set(String::from("b"));
    assert_eq!(h.root.pending_lanes(), DEFAULT_LANE);

    h.scheduler.flush_all();
    assert_eq!(h.root.commit_count(), 2);
    assert!(h.markup().starts_with(r#"<div><input value="b"></input><ul><li>b0</li>"#));
}

#[test]
fn sync_update_preempts_a_paused_transition() {
    let (query, results) = (Rc::default(), Rc::default());
    let h = Harness::mount(search_app(&query, &results).element());
    let initial = h.markup();

    h.scheduler.set_yield_after(Some(3));
    start_transition(|| get(&results).set(String::from("z")));
    assert_eq!(h.root.pending_lanes(), TRANSITION_LANE);

    // Start the transition and leave it paused part way
    assert!(h.scheduler.run_next_task());
    assert_eq!(h.markup(), initial);

    flush_sync(|| get(&query).set(String::from("typed")));
    assert!(
        h.markup()
            .starts_with(r#"<div><input value="typed"></input><ul><li>a0</li>"#),
        "urgent update commits first without the transition: {}",
        h.markup()
    );
    assert_eq!(h.root.pending_lanes(), TRANSITION_LANE);

    h.scheduler.set_yield_after(None);
    h.scheduler.flush_all();
    assert!(h.markup().contains("<li>z7</li>"));
    assert!(h.markup().contains(r#"value="typed""#));
    assert_eq!(h.root.pending_lanes(), NO_LANES);
}

#[test]
fn skipped_updates_are_replayed_in_order() {
    let setter: Setter<String> = Rc::default();
    let s = setter.clone();
    let log = Component::new("Log", move |hooks, _| {
        let (text, set) = hooks.use_state(String::new);
        *s.borrow_mut() = Some(set);
        element("p").child(text).into()
    });
    let h = Harness::mount(log.element());

    let set = get(&setter);
    start_transition(|| set.update(|s| format!("{s}T")));
    flush_sync(|| set.update(|s| format!("{s}S")));
    // The sync render skips the transition update
    assert_eq!(h.markup(), "<p>S</p>");

    // The transition render replays both, in the order they were made
    h.scheduler.flush_all();
    assert_eq!(h.markup(), "<p>TS</p>");
}

#[test]
fn use_transition_reports_pending_until_the_transition_commits() {
    let renders: Rc<RefCell<Vec<String>>> = Rc::default();
    let r = renders.clone();
    let tabs = Component::new("Tabs", move |hooks, _| {
        let (pending, start) = hooks.use_transition();
        let (tab, set_tab) = hooks.use_state(|| "home");
        let label = format!("{}:{}", if pending { "pending" } else { "idle" }, tab);
        r.borrow_mut().push(label.clone());

        element("button")
            .on("onClick", move |_| {
                let set_tab = set_tab.clone();
                start.start(move || set_tab.set("settings"));
            })
            .child(label)
            .into()
    });

    let h = Harness::mount(tabs.element());
    let button = h.host.find(h.container, "button").expect("button");

    h.root.dispatch_event(EventKind::Click, &button);
    h.scheduler.flush_microtasks();
    assert_eq!(h.markup(), "<button>pending:home</button>");

    h.scheduler.flush_all();
    assert_eq!(h.markup(), "<button>idle:settings</button>");
    assert_eq!(
        *renders.borrow(),
        vec!["idle:home", "pending:home", "idle:settings"]
    );
}

#[test]
fn forced_priority_picks_the_lane() {
    let (query, results) = (Rc::default(), Rc::default());
    let h = Harness::mount(search_app(&query, &results).element());

    with_update_priority(PriorityLevel::Idle, || get(&query).set(String::from("later")));
    assert_eq!(h.scheduler.first_priority(), Some(PriorityLevel::Idle));

    h.scheduler.flush_all();
    assert!(h.markup().contains(r#"value="later""#));
}

#[test]
fn render_phase_updates_are_applied_after_the_pass() {
    let renders = Rc::new(Cell::new(0));
    let r = renders.clone();
    let eager = Component::new("Eager", move |hooks, _| {
        r.set(r.get() + 1);
        let (n, set_n) = hooks.use_state(|| 0);
        if n < 2 {
            set_n.set(n + 1);
        }
        Node::from(n)
    });

    let h = Harness::mount(eager.element());
    assert_eq!(h.markup(), "2");
    assert_eq!(renders.get(), 3);
    assert!(!h.root.has_pending_work());
}
