//! Effect units
//!
//! An effect unit is a named setup routine: query the stage for targets,
//! no-op silently if they're absent, attach listeners/timers/tweens, and
//! optionally return an [`EffectHandle`] that reverses all of it. Units
//! marked decorative are short-circuited structurally when the user prefers
//! reduced motion, so individual setups don't need to remember the check.

use std::sync::Arc;

use passage_platform::Stage;

use crate::carousel::CarouselBackend;
use crate::handle::{run_isolated, EffectHandle};
use crate::scheduler::SchedulerHandle;
use crate::slots::SlotKey;
use crate::tween::TweenBackend;

/// Everything an effect setup may touch
#[derive(Clone)]
pub struct EffectContext {
    pub stage: Arc<dyn Stage>,
    pub tweens: Arc<dyn TweenBackend>,
    pub carousels: Arc<dyn CarouselBackend>,
    pub scheduler: SchedulerHandle,
}

impl EffectContext {
    pub fn new(
        stage: Arc<dyn Stage>,
        tweens: Arc<dyn TweenBackend>,
        carousels: Arc<dyn CarouselBackend>,
        scheduler: SchedulerHandle,
    ) -> Self {
        Self {
            stage,
            tweens,
            carousels,
            scheduler,
        }
    }
}

type SetupFn = dyn Fn(&EffectContext) -> Option<EffectHandle> + Send + Sync;

/// A named, registrable effect
#[derive(Clone)]
pub struct EffectUnit {
    name: &'static str,
    slot: Option<SlotKey>,
    decorative: bool,
    setup: Arc<SetupFn>,
}

impl EffectUnit {
    pub fn new(
        name: &'static str,
        setup: impl Fn(&EffectContext) -> Option<EffectHandle> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            slot: None,
            decorative: false,
            setup: Arc::new(setup),
        }
    }

    /// Bind the unit to a named slot for its returned handle
    pub fn with_slot(mut self, key: SlotKey) -> Self {
        self.slot = Some(key);
        self
    }

    /// Mark the unit purely decorative: skipped entirely under reduced motion
    pub fn decorative(mut self) -> Self {
        self.decorative = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The slot this unit's handle lives in (its name when unbound)
    pub fn slot_key(&self) -> SlotKey {
        self.slot.unwrap_or(self.name)
    }

    pub fn is_decorative(&self) -> bool {
        self.decorative
    }

    /// Invoke the setup, isolated, honoring the reduced-motion preference
    pub fn run(&self, ctx: &EffectContext) -> Option<EffectHandle> {
        if self.decorative && ctx.stage.reduced_motion() {
            tracing::debug!(unit = self.name, "skipped: reduced motion active");
            return None;
        }
        run_isolated(self.name, || (self.setup)(ctx)).flatten()
    }
}

impl std::fmt::Debug for EffectUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectUnit")
            .field("name", &self.name)
            .field("slot", &self.slot)
            .field("decorative", &self.decorative)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::RecordingCarousels;
    use crate::scheduler::FrameScheduler;
    use crate::tween::InstantTweens;
    use passage_platform::MemoryStage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_ctx(stage: Arc<MemoryStage>, scheduler: &FrameScheduler) -> EffectContext {
        EffectContext::new(
            stage.clone(),
            Arc::new(InstantTweens::new(stage.clone())),
            Arc::new(RecordingCarousels::new()),
            scheduler.handle(),
        )
    }

    #[test]
    fn test_decorative_short_circuits_under_reduced_motion() {
        let stage = Arc::new(MemoryStage::new());
        stage.set_reduced_motion(true);
        let scheduler = FrameScheduler::new();
        let ctx = test_ctx(stage.clone(), &scheduler);

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let unit = EffectUnit::new("sparkles", move |_| {
            c.fetch_add(1, Ordering::Relaxed);
            Some(EffectHandle::noop())
        })
        .decorative();

        assert!(unit.run(&ctx).is_none());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(stage.listener_count(), 0);
    }

    #[test]
    fn test_non_decorative_runs_under_reduced_motion() {
        let stage = Arc::new(MemoryStage::new());
        stage.set_reduced_motion(true);
        let scheduler = FrameScheduler::new();
        let ctx = test_ctx(stage, &scheduler);

        let unit = EffectUnit::new("essential", |_| Some(EffectHandle::noop()));
        assert!(unit.run(&ctx).is_some());
    }

    #[test]
    fn test_panicking_setup_yields_none() {
        let stage = Arc::new(MemoryStage::new());
        let scheduler = FrameScheduler::new();
        let ctx = test_ctx(stage, &scheduler);

        let unit = EffectUnit::new("broken", |_| panic!("setup failure"));
        assert!(unit.run(&ctx).is_none());
    }

    #[test]
    fn test_slot_key_defaults_to_name() {
        let unit = EffectUnit::new("marquee", |_| None);
        assert_eq!(unit.slot_key(), "marquee");
        let bound = EffectUnit::new("marquee", |_| None).with_slot("marqueeCleanup");
        assert_eq!(bound.slot_key(), "marqueeCleanup");
    }
}
