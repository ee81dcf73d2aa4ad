//! Auxiliary page collaborators
//!
//! Small contracts for externally-owned machinery the coordinator must poke
//! after a navigation: scroll-linked trigger geometry and the host page
//! framework's enhancement layer. Both default to no-ops.

/// Scroll-linked animation geometry owned by the tween engine's scroll plugin
pub trait ScrollGeometry: Send + Sync {
    /// Layout may have changed size; recompute trigger positions
    fn refresh(&self);
}

/// The host page framework's own interactive enhancements
pub trait PageEnhancer: Send + Sync {
    /// Re-initialize after the page content was replaced
    fn restart(&self);
}

/// Default no-op scroll geometry
pub struct NoopScrollGeometry;

impl ScrollGeometry for NoopScrollGeometry {
    fn refresh(&self) {}
}

/// Default no-op page enhancer
pub struct NoopPageEnhancer;

impl PageEnhancer for NoopPageEnhancer {
    fn restart(&self) {}
}
