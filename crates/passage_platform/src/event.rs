//! Stage events and listener plumbing

use std::sync::Arc;

use crate::stage::ElementId;

slotmap::new_key_type! {
    /// Handle to an attached listener
    pub struct ListenerId;
}

/// What a listener is attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenTarget {
    /// The whole page (pointer tracking, resize)
    Window,
    /// A specific element
    Element(ElementId),
}

/// Event classes a listener can subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerEnter,
    PointerLeave,
    Resize,
    /// Media element became playable
    MediaReady,
    /// Media element reached its end
    MediaEnded,
    /// Media playback position advanced
    MediaTimeUpdate,
}

/// A dispatched stage event
#[derive(Clone, Debug)]
pub enum StageEvent {
    PointerMove { x: f32, y: f32 },
    PointerEnter { target: ElementId },
    PointerLeave { target: ElementId },
    Resize { width: f32, height: f32 },
    MediaReady { target: ElementId },
    MediaEnded { target: ElementId },
    MediaTimeUpdate { target: ElementId, time: f64 },
}

impl StageEvent {
    /// The event class this event belongs to
    pub fn kind(&self) -> EventKind {
        match self {
            StageEvent::PointerMove { .. } => EventKind::PointerMove,
            StageEvent::PointerEnter { .. } => EventKind::PointerEnter,
            StageEvent::PointerLeave { .. } => EventKind::PointerLeave,
            StageEvent::Resize { .. } => EventKind::Resize,
            StageEvent::MediaReady { .. } => EventKind::MediaReady,
            StageEvent::MediaEnded { .. } => EventKind::MediaEnded,
            StageEvent::MediaTimeUpdate { .. } => EventKind::MediaTimeUpdate,
        }
    }
}

/// Shared listener callback
///
/// Callbacks are stored behind `Arc` so dispatch can clone them out of the
/// listener table and invoke them without holding any internal lock.
pub type ListenerCallback = Arc<dyn Fn(&StageEvent) + Send + Sync>;
