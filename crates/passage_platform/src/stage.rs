//! Stage trait - the page abstraction effects run against
//!
//! The stage models the externally-owned element tree: a fixed vocabulary of
//! selectors published by the page markup, inline styles, listeners, and a
//! handful of element-level facilities effects need (marker flags, transient
//! nodes, child duplication for marquees, media controls).
//!
//! Implementations are expected to be cheap to call from the UI thread; the
//! in-memory implementation in [`crate::memory`] backs all headless tests.

use crate::event::{EventKind, ListenTarget, ListenerCallback, ListenerId};

slotmap::new_key_type! {
    /// Handle to an element on the stage
    pub struct ElementId;
}

/// An inline style value
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    /// Numeric value (px, unitless opacity, degrees, ...)
    Number(f32),
    /// Keyword or compound value ("none", "flex", ...)
    Text(String),
}

impl StyleValue {
    /// Numeric payload, if this is a number
    pub fn as_number(&self) -> Option<f32> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(_) => None,
        }
    }
}

impl From<f32> for StyleValue {
    fn from(n: f32) -> Self {
        StyleValue::Number(n)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

/// The page abstraction
///
/// All query methods treat "nothing matches" as an empty result, never an
/// error; effects decide for themselves whether a missing target is a no-op.
pub trait Stage: Send + Sync {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All elements matching a selector, in document order
    fn query(&self, selector: &str) -> Vec<ElementId>;

    /// First element matching a selector
    fn query_one(&self, selector: &str) -> Option<ElementId> {
        self.query(selector).into_iter().next()
    }

    /// Elements matching a selector inside a subtree
    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId>;

    // ------------------------------------------------------------------
    // Inline styles
    // ------------------------------------------------------------------

    /// Set one inline style property
    fn set_style(&self, el: ElementId, prop: &str, value: StyleValue);

    /// Read back an inline style property
    fn style(&self, el: ElementId, prop: &str) -> Option<StyleValue>;

    /// Remove every inline style property from an element
    ///
    /// This is the "clearProps" reset transitions rely on so leftover
    /// animation styling never breaks default positioning.
    fn clear_styles(&self, el: ElementId);

    /// Number of inline style properties currently set on an element
    fn style_count(&self, el: ElementId) -> usize;

    // ------------------------------------------------------------------
    // Marker flags (per-element "already initialized" guards)
    // ------------------------------------------------------------------

    fn mark(&self, el: ElementId, key: &str);
    fn unmark(&self, el: ElementId, key: &str);
    fn is_marked(&self, el: ElementId, key: &str) -> bool;

    // ------------------------------------------------------------------
    // Transient nodes and marquee clones
    // ------------------------------------------------------------------

    /// Create a transient child node owned by the calling effect
    ///
    /// Transient nodes are the only nodes an effect may later remove.
    fn create_transient(&self, parent: ElementId) -> ElementId;

    /// Remove a transient node created by [`Stage::create_transient`]
    ///
    /// Removing a non-transient node is refused and logged.
    fn remove_transient(&self, el: ElementId);

    /// Append one tagged clone of every original (non-cloned) child
    ///
    /// Returns the number of clones appended.
    fn duplicate_children(&self, wrapper: ElementId) -> usize;

    /// Remove every tagged clone previously appended to a wrapper
    fn remove_cloned_children(&self, wrapper: ElementId);

    /// Current child count (originals plus clones)
    fn child_count(&self, wrapper: ElementId) -> usize;

    // ------------------------------------------------------------------
    // Metrics
    // ------------------------------------------------------------------

    fn viewport_width(&self) -> f32;
    fn viewport_height(&self) -> f32;

    /// Layout width of one element
    fn element_width(&self, el: ElementId) -> f32;

    /// Total scrollable content width of a wrapper (originals plus clones)
    fn content_width(&self, el: ElementId) -> f32;

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Attach a listener; the returned id detaches it
    fn listen(
        &self,
        target: ListenTarget,
        kind: EventKind,
        callback: ListenerCallback,
    ) -> ListenerId;

    /// Detach a listener (no-op if already detached)
    fn unlisten(&self, id: ListenerId);

    /// Number of currently attached listeners
    fn listener_count(&self) -> usize;

    // ------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------

    /// Whether a media element has buffered enough to play
    fn media_ready(&self, el: ElementId) -> bool;
    fn media_play(&self, el: ElementId);
    fn media_pause(&self, el: ElementId);
    fn media_seek(&self, el: ElementId, seconds: f64);
    fn media_time(&self, el: ElementId) -> f64;
    fn media_duration(&self, el: ElementId) -> Option<f64>;

    // ------------------------------------------------------------------
    // Page-level
    // ------------------------------------------------------------------

    /// Reset scroll position to the document origin
    fn scroll_to_origin(&self);

    /// The user's reduced-motion preference
    fn reduced_motion(&self) -> bool;
}
