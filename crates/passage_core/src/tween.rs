//! Tween engine contract
//!
//! Effects request tweens keyed by target element and a property-value map;
//! the engine owns interpolation and timing. The coordinator only needs to
//! start tweens, hand the engine an awaitable ticket, and trust `clear_after`
//! to reset inline presentation state once a transition completes.

use std::sync::{Arc, Mutex};

use slotmap::SlotMap;
use smallvec::SmallVec;

use passage_platform::{ElementId, Stage, StyleValue};

slotmap::new_key_type! {
    /// Handle to a running tween
    pub struct TweenId;
}

/// Easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    Linear,
    PowerIn,
    #[default]
    PowerOut,
    PowerInOut,
}

/// One animated property
#[derive(Clone, Debug, PartialEq)]
pub struct PropTween {
    pub prop: &'static str,
    /// Starting value; `None` animates from the current value
    pub from: Option<f32>,
    pub to: f32,
}

/// A tween request
#[derive(Clone, Debug)]
pub struct TweenSpec {
    pub props: SmallVec<[PropTween; 4]>,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub ease: Ease,
    /// Clear every inline property on completion so leftover engine styling
    /// never breaks default layout (sticky positioning and the like)
    pub clear_after: bool,
}

impl TweenSpec {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            props: SmallVec::new(),
            duration_ms,
            delay_ms: 0,
            ease: Ease::default(),
            clear_after: false,
        }
    }

    /// Animate a property from its current value to a target
    pub fn to(mut self, prop: &'static str, value: f32) -> Self {
        self.props.push(PropTween {
            prop,
            from: None,
            to: value,
        });
        self
    }

    /// Animate a property from an explicit start value to a target
    pub fn from_to(mut self, prop: &'static str, from: f32, to: f32) -> Self {
        self.props.push(PropTween {
            prop,
            from: Some(from),
            to,
        });
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn clear_after(mut self) -> Self {
        self.clear_after = true;
        self
    }
}

/// The tween engine contract (external collaborator)
pub trait TweenBackend: Send + Sync {
    /// Apply property values immediately, no animation
    fn set(&self, target: ElementId, prop: &'static str, value: StyleValue);

    /// Start a tween
    fn animate(&self, target: ElementId, spec: TweenSpec) -> TweenId;

    /// Forcibly stop a tween, optionally reverting the target's inline state
    fn kill(&self, id: TweenId, revert: bool);

    /// Whether a tween has finished (unknown ids count as finished)
    fn is_complete(&self, id: TweenId) -> bool;

    /// Remove every inline property the engine set on a target
    fn clear_props(&self, target: ElementId);
}

/// Awaitable animation handle returned from the leave/enter hooks
///
/// The transition engine waits for completion before proceeding to its next
/// phase. [`AnimationTicket::done`] is the no-op ticket for phases with no
/// animation.
#[derive(Clone)]
pub struct AnimationTicket {
    inner: Option<(Arc<dyn TweenBackend>, TweenId)>,
}

impl AnimationTicket {
    pub fn done() -> Self {
        Self { inner: None }
    }

    pub fn for_tween(backend: Arc<dyn TweenBackend>, id: TweenId) -> Self {
        Self {
            inner: Some((backend, id)),
        }
    }

    pub fn is_complete(&self) -> bool {
        match &self.inner {
            Some((backend, id)) => backend.is_complete(*id),
            None => true,
        }
    }
}

// ============================================================================
// Headless backend
// ============================================================================

struct TweenRecord {
    target: ElementId,
    spec: TweenSpec,
}

struct InstantInner {
    tweens: SlotMap<TweenId, TweenRecord>,
    /// Every animate() call in order, for assertions
    log: Vec<(ElementId, TweenSpec)>,
}

/// Headless [`TweenBackend`] that completes every tween immediately
///
/// End values are applied to the stage synchronously and `clear_after`
/// fires right away, which preserves the observable ordering contract
/// (animation complete before the next phase) without real timing.
pub struct InstantTweens {
    stage: Arc<dyn Stage>,
    inner: Mutex<InstantInner>,
}

impl InstantTweens {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Self {
            stage,
            inner: Mutex::new(InstantInner {
                tweens: SlotMap::with_key(),
                log: Vec::new(),
            }),
        }
    }

    /// Number of animate() calls so far
    pub fn animation_count(&self) -> usize {
        self.inner.lock().unwrap().log.len()
    }

    /// Animate() calls recorded against one target
    pub fn animations_for(&self, target: ElementId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|(t, _)| *t == target)
            .count()
    }
}

impl TweenBackend for InstantTweens {
    fn set(&self, target: ElementId, prop: &'static str, value: StyleValue) {
        self.stage.set_style(target, prop, value);
    }

    fn animate(&self, target: ElementId, spec: TweenSpec) -> TweenId {
        for prop in &spec.props {
            self.stage
                .set_style(target, prop.prop, StyleValue::Number(prop.to));
        }
        if spec.clear_after {
            self.stage.clear_styles(target);
        }
        let mut inner = self.inner.lock().unwrap();
        inner.log.push((target, spec.clone()));
        inner.tweens.insert(TweenRecord { target, spec })
    }

    fn kill(&self, id: TweenId, revert: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(record) = inner.tweens.remove(id) {
            if revert {
                self.stage.clear_styles(record.target);
            }
        }
    }

    fn is_complete(&self, _id: TweenId) -> bool {
        true
    }

    fn clear_props(&self, target: ElementId) {
        self.stage.clear_styles(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_platform::MemoryStage;

    #[test]
    fn test_instant_backend_applies_end_values() {
        let stage = Arc::new(MemoryStage::new());
        let backend = InstantTweens::new(stage.clone());
        let el = stage.add_element(&[".box"]);

        let id = backend.animate(el, TweenSpec::new(500).to("opacity", 0.0));
        assert!(backend.is_complete(id));
        assert_eq!(stage.style(el, "opacity"), Some(StyleValue::Number(0.0)));
    }

    #[test]
    fn test_clear_after_resets_inline_state() {
        let stage = Arc::new(MemoryStage::new());
        let backend = InstantTweens::new(stage.clone());
        let el = stage.add_element(&[".container"]);

        backend.animate(
            el,
            TweenSpec::new(500)
                .from_to("y", -32.0, 0.0)
                .from_to("opacity", 0.0, 1.0)
                .clear_after(),
        );
        assert_eq!(stage.style_count(el), 0);
    }

    #[test]
    fn test_ticket_completion() {
        let stage = Arc::new(MemoryStage::new());
        let backend: Arc<dyn TweenBackend> = Arc::new(InstantTweens::new(stage.clone()));
        let el = stage.add_element(&[".box"]);

        assert!(AnimationTicket::done().is_complete());
        let id = backend.animate(el, TweenSpec::new(300).to("opacity", 0.0));
        assert!(AnimationTicket::for_tween(backend, id).is_complete());
    }
}
