// ============================================================================
// spark-fiber - Synthetic Events
// Capture and bubble dispatch over host instances
// ============================================================================
//
// Handlers live in element props under `on{Kind}Capture` and `on{Kind}`.
// Dispatch walks from the target up to (not including) the container,
// collecting capture handlers outermost-first and bubble handlers
// innermost-first, then runs both phases under the event's update priority.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::host::HostConfig;
use crate::primitives::props::EventHandler;
use crate::reactivity::batching::with_update_priority;
use crate::scheduler::PriorityLevel;

// =============================================================================
// EVENT KINDS
// =============================================================================

/// Supported event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Input,
    Change,
    MouseMove,
    Scroll,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Click,
        EventKind::KeyDown,
        EventKind::Input,
        EventKind::Change,
        EventKind::MouseMove,
        EventKind::Scroll,
    ];

    /// Prop name of the bubble-phase handler
    pub fn bubble_prop(self) -> &'static str {
        match self {
            EventKind::Click => "onClick",
            EventKind::KeyDown => "onKeyDown",
            EventKind::Input => "onInput",
            EventKind::Change => "onChange",
            EventKind::MouseMove => "onMouseMove",
            EventKind::Scroll => "onScroll",
        }
    }

    /// Prop name of the capture-phase handler
    pub fn capture_prop(self) -> &'static str {
        match self {
            EventKind::Click => "onClickCapture",
            EventKind::KeyDown => "onKeyDownCapture",
            EventKind::Input => "onInputCapture",
            EventKind::Change => "onChangeCapture",
            EventKind::MouseMove => "onMouseMoveCapture",
            EventKind::Scroll => "onScrollCapture",
        }
    }

    /// Priority that updates issued by handlers of this kind run at.
    ///
    /// Discrete input is synchronous; continuous input is user-blocking.
    pub fn priority(self) -> PriorityLevel {
        match self {
            EventKind::Click | EventKind::KeyDown | EventKind::Input | EventKind::Change => {
                PriorityLevel::Immediate
            }
            EventKind::MouseMove | EventKind::Scroll => PriorityLevel::UserBlocking,
        }
    }
}

// =============================================================================
// SYNTHETIC EVENT
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    Capture,
    Bubble,
}

/// The event object handed to handlers.
#[derive(Debug)]
pub struct SyntheticEvent {
    kind: EventKind,
    phase: Cell<EventPhase>,
    propagation_stopped: Cell<bool>,
}

impl SyntheticEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            phase: Cell::new(EventPhase::Capture),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Stop the remaining handlers of the current phase and skip bubbling.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Handlers found on the path from a target to its container.
#[derive(Default)]
pub struct Paths {
    pub capture: Vec<EventHandler>,
    pub bubble: Vec<EventHandler>,
}

/// Collect handlers for `kind` from `target` up to `container`.
pub fn collect_paths<H: HostConfig>(
    host: &H,
    target: &H::Handle,
    container: &H::Handle,
    kind: EventKind,
) -> Paths {
    let mut paths = Paths::default();
    let mut node = Some(target.clone());

    while let Some(current) = node {
        if &current == container {
            break;
        }
        if let Some(props) = host.props_of(&current) {
            if let Some(handler) = props.handler(kind.capture_prop()) {
                paths.capture.insert(0, handler.clone());
            }
            if let Some(handler) = props.handler(kind.bubble_prop()) {
                paths.bubble.push(handler.clone());
            }
        }
        node = host.parent_of(&current);
    }

    paths
}

fn trigger_event_flow(handlers: &[EventHandler], event: &SyntheticEvent) {
    for handler in handlers {
        handler.call(event);
        if event.is_propagation_stopped() {
            break;
        }
    }
}

/// Dispatch `kind` at `target`, returning the event after both phases.
pub fn dispatch_event<H: HostConfig>(
    host: &H,
    container: &H::Handle,
    kind: EventKind,
    target: &H::Handle,
) -> Rc<SyntheticEvent> {
    let paths = collect_paths(host, target, container, kind);
    let event = Rc::new(SyntheticEvent::new(kind));
    tracing::trace!(
        ?kind,
        capture = paths.capture.len(),
        bubble = paths.bubble.len(),
        "dispatching event"
    );

    with_update_priority(kind.priority(), || {
        trigger_event_flow(&paths.capture, &event);
        if !event.is_propagation_stopped() {
            event.phase.set(EventPhase::Bubble);
            trigger_event_flow(&paths.bubble, &event);
        }
    });

    event
}

// =============================================================================
// TESTS
// =============================================================================
