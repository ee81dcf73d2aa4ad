//! In-memory stage - headless implementation backing all tests
//!
//! `MemoryStage` models a page as a flat arena of elements tagged with the
//! selectors they match. Tests build a page with [`MemoryStage::add_element`]
//! and friends, then drive effects by emitting synthetic events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::event::{EventKind, ListenTarget, ListenerCallback, ListenerId, StageEvent};
use crate::stage::{ElementId, Stage, StyleValue};

#[derive(Clone, Debug, Default)]
struct MediaState {
    ready: bool,
    playing: bool,
    time: f64,
    duration: Option<f64>,
}

struct ElementNode {
    selectors: Vec<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    styles: FxHashMap<String, StyleValue>,
    marks: FxHashSet<String>,
    width: f32,
    transient: bool,
    cloned: bool,
    media: Option<MediaState>,
}

impl ElementNode {
    fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            parent: None,
            children: Vec::new(),
            styles: FxHashMap::default(),
            marks: FxHashSet::default(),
            width: 0.0,
            transient: false,
            cloned: false,
            media: None,
        }
    }
}

struct Listener {
    target: ListenTarget,
    kind: EventKind,
    callback: ListenerCallback,
}

struct StageState {
    elements: SlotMap<ElementId, ElementNode>,
    /// Insertion order, used for document-order queries
    order: Vec<ElementId>,
    listeners: SlotMap<ListenerId, Listener>,
    viewport: (f32, f32),
    scroll_offset: f32,
}

/// In-memory [`Stage`] implementation
pub struct MemoryStage {
    state: Mutex<StageState>,
    reduced_motion: AtomicBool,
}

impl MemoryStage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StageState {
                elements: SlotMap::with_key(),
                order: Vec::new(),
                listeners: SlotMap::with_key(),
                viewport: (1280.0, 800.0),
                scroll_offset: 0.0,
            }),
            reduced_motion: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Page building
    // ------------------------------------------------------------------

    /// Add a root-level element matching the given selectors
    pub fn add_element(&self, selectors: &[&str]) -> ElementId {
        let mut state = self.state.lock().unwrap();
        let id = state.elements.insert(ElementNode::new(selectors));
        state.order.push(id);
        id
    }

    /// Add a child element under a parent
    pub fn add_child(&self, parent: ElementId, selectors: &[&str]) -> ElementId {
        let mut state = self.state.lock().unwrap();
        let mut node = ElementNode::new(selectors);
        node.parent = Some(parent);
        let id = state.elements.insert(node);
        state.order.push(id);
        if let Some(p) = state.elements.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Add a media child (video) with an optional known duration
    pub fn add_media(
        &self,
        parent: ElementId,
        selectors: &[&str],
        duration: Option<f64>,
    ) -> ElementId {
        let id = self.add_child(parent, selectors);
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.elements.get_mut(id) {
            node.media = Some(MediaState {
                duration,
                ..MediaState::default()
            });
        }
        id
    }

    /// Set the layout width of an element
    pub fn set_element_width(&self, el: ElementId, width: f32) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.elements.get_mut(el) {
            node.width = width;
        }
    }

    /// Remove an element and its whole subtree
    pub fn remove_element(&self, el: ElementId) {
        let mut state = self.state.lock().unwrap();
        remove_subtree(&mut state, el);
    }

    pub fn set_viewport(&self, width: f32, height: f32) {
        self.state.lock().unwrap().viewport = (width, height);
    }

    pub fn set_reduced_motion(&self, enabled: bool) {
        self.reduced_motion.store(enabled, Ordering::Relaxed);
    }

    pub fn set_scroll_offset(&self, offset: f32) {
        self.state.lock().unwrap().scroll_offset = offset;
    }

    pub fn scroll_offset(&self) -> f32 {
        self.state.lock().unwrap().scroll_offset
    }

    // ------------------------------------------------------------------
    // Synthetic events
    // ------------------------------------------------------------------

    /// Dispatch an event to every listener attached to a target and kind
    pub fn emit(&self, target: ListenTarget, event: StageEvent) {
        let kind = event.kind();
        // Clone the matching callbacks out, then invoke without the lock so
        // a callback may attach or detach listeners.
        let callbacks: Vec<ListenerCallback> = {
            let state = self.state.lock().unwrap();
            state
                .listeners
                .values()
                .filter(|l| l.target == target && l.kind == kind)
                .map(|l| l.callback.clone())
                .collect()
        };
        for cb in callbacks {
            cb(&event);
        }
    }

    /// Window-level pointer move
    pub fn emit_pointer_move(&self, x: f32, y: f32) {
        self.emit(ListenTarget::Window, StageEvent::PointerMove { x, y });
    }

    pub fn emit_pointer_enter(&self, el: ElementId) {
        self.emit(
            ListenTarget::Element(el),
            StageEvent::PointerEnter { target: el },
        );
    }

    pub fn emit_pointer_leave(&self, el: ElementId) {
        self.emit(
            ListenTarget::Element(el),
            StageEvent::PointerLeave { target: el },
        );
    }

    /// Resize the viewport and notify window resize listeners
    pub fn emit_resize(&self, width: f32, height: f32) {
        self.set_viewport(width, height);
        self.emit(ListenTarget::Window, StageEvent::Resize { width, height });
    }

    /// Mark a media element playable and notify its ready listeners
    pub fn set_media_ready(&self, el: ElementId) {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(media) = state.elements.get_mut(el).and_then(|n| n.media.as_mut()) {
                media.ready = true;
            }
        }
        self.emit(ListenTarget::Element(el), StageEvent::MediaReady { target: el });
    }

    /// Advance a playing media element, firing timeupdate and ended events
    pub fn advance_media(&self, el: ElementId, dt_seconds: f64) {
        let (time, ended) = {
            let mut state = self.state.lock().unwrap();
            let Some(media) = state.elements.get_mut(el).and_then(|n| n.media.as_mut()) else {
                return;
            };
            if !media.playing {
                return;
            }
            media.time += dt_seconds;
            let ended = media.duration.is_some_and(|d| media.time >= d);
            (media.time, ended)
        };
        self.emit(
            ListenTarget::Element(el),
            StageEvent::MediaTimeUpdate { target: el, time },
        );
        if ended {
            self.emit(ListenTarget::Element(el), StageEvent::MediaEnded { target: el });
        }
    }

    /// Whether a media element is currently playing
    pub fn media_playing(&self, el: ElementId) -> bool {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(el)
            .and_then(|n| n.media.as_ref())
            .is_some_and(|m| m.playing)
    }
}

impl Default for MemoryStage {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_subtree(state: &mut StageState, el: ElementId) {
    let children = match state.elements.get(el) {
        Some(node) => node.children.clone(),
        None => return,
    };
    for child in children {
        remove_subtree(state, child);
    }
    if let Some(node) = state.elements.remove(el) {
        if let Some(parent) = node.parent {
            if let Some(p) = state.elements.get_mut(parent) {
                p.children.retain(|c| *c != el);
            }
        }
    }
    state.order.retain(|e| *e != el);
}

impl Stage for MemoryStage {
    fn query(&self, selector: &str) -> Vec<ElementId> {
        let state = self.state.lock().unwrap();
        state
            .order
            .iter()
            .copied()
            .filter(|id| {
                state
                    .elements
                    .get(*id)
                    .is_some_and(|n| n.selectors.iter().any(|s| s == selector))
            })
            .collect()
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let state = self.state.lock().unwrap();
        state
            .order
            .iter()
            .copied()
            .filter(|id| {
                let Some(node) = state.elements.get(*id) else {
                    return false;
                };
                if !node.selectors.iter().any(|s| s == selector) {
                    return false;
                }
                // Walk the parent chain up to the root
                let mut current = node.parent;
                while let Some(p) = current {
                    if p == root {
                        return true;
                    }
                    current = state.elements.get(p).and_then(|n| n.parent);
                }
                false
            })
            .collect()
    }

    fn set_style(&self, el: ElementId, prop: &str, value: StyleValue) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.elements.get_mut(el) {
            node.styles.insert(prop.to_string(), value);
        }
    }

    fn style(&self, el: ElementId, prop: &str) -> Option<StyleValue> {
        let state = self.state.lock().unwrap();
        state.elements.get(el).and_then(|n| n.styles.get(prop).cloned())
    }

    fn clear_styles(&self, el: ElementId) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.elements.get_mut(el) {
            node.styles.clear();
        }
    }

    fn style_count(&self, el: ElementId) -> usize {
        let state = self.state.lock().unwrap();
        state.elements.get(el).map_or(0, |n| n.styles.len())
    }

    fn mark(&self, el: ElementId, key: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.elements.get_mut(el) {
            node.marks.insert(key.to_string());
        }
    }

    fn unmark(&self, el: ElementId, key: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.elements.get_mut(el) {
            node.marks.remove(key);
        }
    }

    fn is_marked(&self, el: ElementId, key: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.elements.get(el).is_some_and(|n| n.marks.contains(key))
    }

    fn create_transient(&self, parent: ElementId) -> ElementId {
        let mut state = self.state.lock().unwrap();
        let mut node = ElementNode::new(&[]);
        node.parent = Some(parent);
        node.transient = true;
        let id = state.elements.insert(node);
        state.order.push(id);
        if let Some(p) = state.elements.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    fn remove_transient(&self, el: ElementId) {
        let mut state = self.state.lock().unwrap();
        match state.elements.get(el) {
            Some(node) if node.transient => remove_subtree(&mut state, el),
            Some(_) => {
                tracing::warn!("refusing to remove non-transient element");
            }
            None => {}
        }
    }

    fn duplicate_children(&self, wrapper: ElementId) -> usize {
        let mut state = self.state.lock().unwrap();
        let originals: Vec<(Vec<String>, f32)> = match state.elements.get(wrapper) {
            Some(node) => node
                .children
                .iter()
                .filter_map(|c| state.elements.get(*c))
                .filter(|n| !n.cloned)
                .map(|n| (n.selectors.clone(), n.width))
                .collect(),
            None => return 0,
        };
        let count = originals.len();
        for (selectors, width) in originals {
            let refs: Vec<&str> = selectors.iter().map(String::as_str).collect();
            let mut node = ElementNode::new(&refs);
            node.parent = Some(wrapper);
            node.cloned = true;
            node.width = width;
            let id = state.elements.insert(node);
            state.order.push(id);
            if let Some(p) = state.elements.get_mut(wrapper) {
                p.children.push(id);
            }
        }
        count
    }

    fn remove_cloned_children(&self, wrapper: ElementId) {
        let mut state = self.state.lock().unwrap();
        let clones: Vec<ElementId> = match state.elements.get(wrapper) {
            Some(node) => node
                .children
                .iter()
                .copied()
                .filter(|c| state.elements.get(*c).is_some_and(|n| n.cloned))
                .collect(),
            None => return,
        };
        for clone in clones {
            remove_subtree(&mut state, clone);
        }
    }

    fn child_count(&self, wrapper: ElementId) -> usize {
        let state = self.state.lock().unwrap();
        state.elements.get(wrapper).map_or(0, |n| n.children.len())
    }

    fn viewport_width(&self) -> f32 {
        self.state.lock().unwrap().viewport.0
    }

    fn viewport_height(&self) -> f32 {
        self.state.lock().unwrap().viewport.1
    }

    fn element_width(&self, el: ElementId) -> f32 {
        let state = self.state.lock().unwrap();
        state.elements.get(el).map_or(0.0, |n| n.width)
    }

    fn content_width(&self, el: ElementId) -> f32 {
        let state = self.state.lock().unwrap();
        let Some(node) = state.elements.get(el) else {
            return 0.0;
        };
        if node.children.is_empty() {
            return node.width;
        }
        node.children
            .iter()
            .filter_map(|c| state.elements.get(*c))
            .map(|n| n.width)
            .sum()
    }

    fn listen(
        &self,
        target: ListenTarget,
        kind: EventKind,
        callback: ListenerCallback,
    ) -> ListenerId {
        let mut state = self.state.lock().unwrap();
        state.listeners.insert(Listener {
            target,
            kind,
            callback,
        })
    }

    fn unlisten(&self, id: ListenerId) {
        let mut state = self.state.lock().unwrap();
        state.listeners.remove(id);
    }

    fn listener_count(&self) -> usize {
        self.state.lock().unwrap().listeners.len()
    }

    fn media_ready(&self, el: ElementId) -> bool {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(el)
            .and_then(|n| n.media.as_ref())
            .is_some_and(|m| m.ready)
    }

    fn media_play(&self, el: ElementId) {
        let mut state = self.state.lock().unwrap();
        if let Some(media) = state.elements.get_mut(el).and_then(|n| n.media.as_mut()) {
            media.playing = true;
        }
    }

    fn media_pause(&self, el: ElementId) {
        let mut state = self.state.lock().unwrap();
        if let Some(media) = state.elements.get_mut(el).and_then(|n| n.media.as_mut()) {
            media.playing = false;
        }
    }

    fn media_seek(&self, el: ElementId, seconds: f64) {
        let mut state = self.state.lock().unwrap();
        if let Some(media) = state.elements.get_mut(el).and_then(|n| n.media.as_mut()) {
            media.time = seconds;
        }
    }

    fn media_time(&self, el: ElementId) -> f64 {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(el)
            .and_then(|n| n.media.as_ref())
            .map_or(0.0, |m| m.time)
    }

    fn media_duration(&self, el: ElementId) -> Option<f64> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(el)
            .and_then(|n| n.media.as_ref())
            .and_then(|m| m.duration)
    }

    fn scroll_to_origin(&self) {
        self.state.lock().unwrap().scroll_offset = 0.0;
    }

    fn reduced_motion(&self) -> bool {
        self.reduced_motion.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_query_by_selector() {
        let stage = MemoryStage::new();
        let a = stage.add_element(&[".swiper", ".is-loop-word"]);
        let _b = stage.add_element(&[".nav_component"]);

        assert_eq!(stage.query(".swiper"), vec![a]);
        assert!(stage.query(".missing").is_empty());
        assert_eq!(stage.query_one(".nav_component").is_some(), true);
    }

    #[test]
    fn test_query_within_subtree() {
        let stage = MemoryStage::new();
        let root = stage.add_element(&[".wrapper"]);
        let inner = stage.add_child(root, &[".slide"]);
        let _outside = stage.add_element(&[".slide"]);

        assert_eq!(stage.query_within(root, ".slide"), vec![inner]);
        assert_eq!(stage.query(".slide").len(), 2);
    }

    #[test]
    fn test_clone_lifecycle() {
        let stage = MemoryStage::new();
        let wrapper = stage.add_element(&[".swiper-wrapper"]);
        let slide = stage.add_child(wrapper, &[".swiper-slide"]);
        stage.set_element_width(slide, 200.0);

        assert_eq!(stage.duplicate_children(wrapper), 1);
        assert_eq!(stage.child_count(wrapper), 2);
        assert_eq!(stage.content_width(wrapper), 400.0);

        // Clones are not re-cloned
        assert_eq!(stage.duplicate_children(wrapper), 1);
        assert_eq!(stage.child_count(wrapper), 3);

        stage.remove_cloned_children(wrapper);
        assert_eq!(stage.child_count(wrapper), 1);
    }

    #[test]
    fn test_transient_nodes_only_removable_kind() {
        let stage = MemoryStage::new();
        let parent = stage.add_element(&[".trail-host"]);
        let child = stage.add_child(parent, &[".real-content"]);
        let transient = stage.create_transient(parent);
        assert_eq!(stage.child_count(parent), 2);

        stage.remove_transient(child);
        assert_eq!(stage.child_count(parent), 2); // refused

        stage.remove_transient(transient);
        assert_eq!(stage.child_count(parent), 1);
    }

    #[test]
    fn test_listener_dispatch_and_detach() {
        let stage = MemoryStage::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let id = stage.listen(
            ListenTarget::Window,
            EventKind::PointerMove,
            Arc::new(move |_| {
                hits2.fetch_add(1, Ordering::Relaxed);
            }),
        );
        assert_eq!(stage.listener_count(), 1);

        stage.emit_pointer_move(10.0, 20.0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        stage.unlisten(id);
        stage.emit_pointer_move(11.0, 21.0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(stage.listener_count(), 0);
    }

    #[test]
    fn test_media_playback() {
        let stage = MemoryStage::new();
        let wrapper = stage.add_element(&[".loop-word_dragon-wrapper"]);
        let video = stage.add_media(wrapper, &["video"], Some(2.0));

        assert!(!stage.media_ready(video));
        stage.set_media_ready(video);
        assert!(stage.media_ready(video));

        stage.media_play(video);
        stage.advance_media(video, 1.0);
        assert!((stage.media_time(video) - 1.0).abs() < f64::EPSILON);
    }
}
