//! Carousel engine contract
//!
//! `create(root, config) -> instance` / `destroy(instance)` mirrors the
//! slider library the page uses. Destruction may fail inside the library;
//! callers wrap each disposal so one broken instance never blocks the rest.

use std::sync::Mutex;

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use thiserror::Error;

use passage_platform::ElementId;

slotmap::new_key_type! {
    /// Handle to a live carousel instance
    pub struct CarouselId;
}

/// Carousel errors
#[derive(Error, Debug)]
pub enum CarouselError {
    #[error("Carousel creation failed: {0}")]
    Create(String),

    #[error("Carousel destruction failed: {0}")]
    Destroy(String),
}

/// How many slides are visible at once
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlidesPerView {
    /// Size slides by their content
    Auto,
    Count(f32),
}

/// Carousel configuration
#[derive(Clone, Debug)]
pub struct CarouselConfig {
    pub looped: bool,
    pub centered: bool,
    /// Transition duration in ms; marquees derive this from content width
    pub speed_ms: u32,
    pub space_between: f32,
    pub slides_per_view: SlidesPerView,
    /// Continuous autoplay with zero delay (marquee mode)
    pub autoplay: bool,
    pub allow_touch: bool,
    pub grab_cursor: bool,
    /// Force a linear timing function so marquee motion stays constant
    pub linear_timing: bool,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            looped: false,
            centered: false,
            speed_ms: 300,
            space_between: 0.0,
            slides_per_view: SlidesPerView::Auto,
            autoplay: false,
            allow_touch: true,
            grab_cursor: false,
            linear_timing: false,
        }
    }
}

/// The carousel engine contract (external collaborator)
pub trait CarouselBackend: Send + Sync {
    fn create(&self, root: ElementId, config: CarouselConfig) -> Result<CarouselId, CarouselError>;

    /// Destroy an instance, optionally cleaning injected styles and events
    fn destroy(
        &self,
        id: CarouselId,
        clean_styles: bool,
        clean_events: bool,
    ) -> Result<(), CarouselError>;

    /// Update the transition speed of a live instance (resize recalcs)
    fn update_speed(&self, id: CarouselId, speed_ms: u32);

    /// All currently live instances
    fn instances(&self) -> Vec<CarouselId>;
}

// ============================================================================
// Headless backend
// ============================================================================

struct InstanceRecord {
    root: ElementId,
    config: CarouselConfig,
}

struct RecordingInner {
    instances: SlotMap<CarouselId, InstanceRecord>,
    failing_destroys: FxHashSet<CarouselId>,
    created: usize,
    destroyed: usize,
}

/// Headless [`CarouselBackend`] that records create/destroy calls
///
/// Individual destroys can be made to fail to exercise disposal isolation.
pub struct RecordingCarousels {
    inner: Mutex<RecordingInner>,
}

impl RecordingCarousels {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RecordingInner {
                instances: SlotMap::with_key(),
                failing_destroys: FxHashSet::default(),
                created: 0,
                destroyed: 0,
            }),
        }
    }

    /// Make destroying this instance fail (it still counts as removed,
    /// matching libraries that throw mid-teardown with listeners detached)
    pub fn fail_destroy_of(&self, id: CarouselId) {
        self.inner.lock().unwrap().failing_destroys.insert(id);
    }

    pub fn created_count(&self) -> usize {
        self.inner.lock().unwrap().created
    }

    pub fn destroyed_count(&self) -> usize {
        self.inner.lock().unwrap().destroyed
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().unwrap().instances.len()
    }

    pub fn config_of(&self, id: CarouselId) -> Option<CarouselConfig> {
        self.inner
            .lock()
            .unwrap()
            .instances
            .get(id)
            .map(|r| r.config.clone())
    }

    pub fn root_of(&self, id: CarouselId) -> Option<ElementId> {
        self.inner.lock().unwrap().instances.get(id).map(|r| r.root)
    }
}

impl Default for RecordingCarousels {
    fn default() -> Self {
        Self::new()
    }
}

impl CarouselBackend for RecordingCarousels {
    fn create(&self, root: ElementId, config: CarouselConfig) -> Result<CarouselId, CarouselError> {
        let mut inner = self.inner.lock().unwrap();
        inner.created += 1;
        Ok(inner.instances.insert(InstanceRecord { root, config }))
    }

    fn destroy(
        &self,
        id: CarouselId,
        _clean_styles: bool,
        _clean_events: bool,
    ) -> Result<(), CarouselError> {
        let mut inner = self.inner.lock().unwrap();
        inner.instances.remove(id);
        if inner.failing_destroys.remove(&id) {
            return Err(CarouselError::Destroy("injected failure".into()));
        }
        inner.destroyed += 1;
        Ok(())
    }

    fn update_speed(&self, id: CarouselId, speed_ms: u32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(record) = inner.instances.get_mut(id) {
            record.config.speed_ms = speed_ms;
        }
    }

    fn instances(&self) -> Vec<CarouselId> {
        self.inner.lock().unwrap().instances.keys().collect()
    }
}
