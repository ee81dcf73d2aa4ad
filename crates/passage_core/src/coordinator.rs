//! Transition lifecycle coordinator
//!
//! Guarantees that every navigation gets exactly one teardown pass and one
//! setup pass, in a fixed total order, with no leaked handles:
//!
//! ```text
//! Idle -> Leaving -> Swapping -> Entering -> Settled
//! ```
//!
//! PreLeave runs the outgoing namespace's exit units, drains every named
//! effect slot, and disposes carousel instances (each disposal isolated).
//! The leave/enter hooks return awaitable tickets for the external
//! transition engine. Settled is deferred across two scheduler frames so
//! expensive effects never start on elements that are still animating, then
//! resets scroll, refreshes scroll geometry, and runs global plus
//! namespace-specific units in registry order.
//!
//! Nothing in these hooks propagates a failure to the engine: every unit
//! invocation and collaborator call is individually isolated.

use std::sync::{Arc, Mutex};

use passage_platform::{ElementId, Stage};

use crate::carousel::CarouselBackend;
use crate::effect::{EffectContext, EffectUnit};
use crate::handle::run_isolated;
use crate::registry::{Namespace, NamespaceRegistry};
use crate::scheduler::SchedulerHandle;
use crate::services::{NoopPageEnhancer, NoopScrollGeometry, PageEnhancer, ScrollGeometry};
use crate::slots::{EffectSlots, SlotKey};
use crate::tween::{AnimationTicket, Ease, TweenBackend, TweenSpec};
use crate::visit::VisitStore;

/// Lifecycle phase of the current navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Leaving,
    Swapping,
    Entering,
    Settled,
}

/// Incoming page metadata yielded by the transition engine at swap time
#[derive(Clone, Debug)]
pub struct NamespaceInfo {
    pub namespace: Namespace,
    pub container: ElementId,
}

impl NamespaceInfo {
    pub fn new(namespace: &str, container: ElementId) -> Self {
        Self {
            namespace: Namespace::from(namespace),
            container,
        }
    }
}

/// Configuration handed to the external transition engine
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Refuse a new navigation while one is in flight; the coordinator does
    /// not implement its own cancellation
    pub prevent_running: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prevent_running: true,
        }
    }
}

/// Transition animation parameters (replaceable configuration, not contract)
#[derive(Clone, Debug)]
pub struct TransitionStyle {
    pub leave_duration_ms: u32,
    pub leave_ease: Ease,
    pub enter_duration_ms: u32,
    pub enter_ease: Ease,
    /// Vertical offset the incoming container slides in from
    pub enter_offset_y: f32,
}

impl Default for TransitionStyle {
    fn default() -> Self {
        Self {
            leave_duration_ms: 500,
            leave_ease: Ease::PowerOut,
            enter_duration_ms: 500,
            enter_ease: Ease::PowerOut,
            enter_offset_y: -32.0,
        }
    }
}

/// The lifecycle-hook contract the transition engine drives
///
/// `leave`/`enter` return an [`AnimationTicket`] the engine awaits before
/// proceeding. The engine must not invoke `before_enter` before
/// `before_leave` has returned.
pub trait TransitionHooks {
    /// Initial page load (no transition)
    fn once(&self, initial: &NamespaceInfo);

    /// Immediately before the outgoing page starts leaving
    fn before_leave(&self);

    /// Exit animation for the outgoing container
    fn leave(&self, outgoing: ElementId) -> AnimationTicket;

    /// New container in the DOM, not yet revealed
    fn before_enter(&self, next: &NamespaceInfo);

    /// Entrance animation for the incoming container
    fn enter(&self, incoming: ElementId) -> AnimationTicket;

    /// Entrance animation finished; schedule setup
    fn after_enter(&self, next: &NamespaceInfo);
}

struct CoordinatorState {
    phase: Phase,
    active: Option<Namespace>,
    slots: EffectSlots,
}

struct Shared {
    stage: Arc<dyn Stage>,
    tweens: Arc<dyn TweenBackend>,
    carousels: Arc<dyn CarouselBackend>,
    scroll: Arc<dyn ScrollGeometry>,
    enhancer: Arc<dyn PageEnhancer>,
    scheduler: SchedulerHandle,
    registry: NamespaceRegistry,
    visits: Option<VisitStore>,
    style: TransitionStyle,
    // Mutable state lives behind one lock; collaborators stay outside so
    // effect setups never run while the lock is held.
    state: Mutex<CoordinatorState>,
}

/// The coordinator; clones share one underlying instance
#[derive(Clone)]
pub struct TransitionCoordinator {
    shared: Arc<Shared>,
}

impl TransitionCoordinator {
    pub fn builder(
        stage: Arc<dyn Stage>,
        tweens: Arc<dyn TweenBackend>,
        carousels: Arc<dyn CarouselBackend>,
        scheduler: SchedulerHandle,
        registry: NamespaceRegistry,
    ) -> CoordinatorBuilder {
        CoordinatorBuilder {
            stage,
            tweens,
            carousels,
            scheduler,
            registry,
            visits: None,
            scroll: Arc::new(NoopScrollGeometry),
            enhancer: Arc::new(NoopPageEnhancer),
            style: TransitionStyle::default(),
        }
    }

    /// Configuration to hand the external transition engine
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().unwrap().phase
    }

    pub fn active_namespace(&self) -> Option<Namespace> {
        self.shared.state.lock().unwrap().active.clone()
    }

    pub fn is_slot_live(&self, key: SlotKey) -> bool {
        self.shared.state.lock().unwrap().slots.is_live(key)
    }

    pub fn live_slot_count(&self) -> usize {
        self.shared.state.lock().unwrap().slots.live_count()
    }

    fn effect_ctx(&self) -> EffectContext {
        EffectContext::new(
            self.shared.stage.clone(),
            self.shared.tweens.clone(),
            self.shared.carousels.clone(),
            self.shared.scheduler.clone(),
        )
    }

    /// Run a unit and install its handle into the unit's slot
    fn run_and_install(&self, unit: &EffectUnit, ctx: &EffectContext) {
        if let Some(handle) = unit.run(ctx) {
            let mut state = self.shared.state.lock().unwrap();
            state.slots.install(unit.slot_key(), handle);
        }
    }

    /// Run a unit whose handle, if any, has no slot to live in
    fn run_transient(&self, unit: &EffectUnit, ctx: &EffectContext) {
        if let Some(handle) = unit.run(ctx) {
            tracing::debug!(unit = unit.name(), "discarding handle returned outside Settled");
            handle.teardown(unit.name());
        }
    }

    /// The Settled phase: scroll reset, geometry refresh, then setup
    fn settle(&self, next: &NamespaceInfo) {
        {
            let mut state = self.shared.state.lock().unwrap();
            match state.phase {
                Phase::Entering | Phase::Idle => {}
                phase => {
                    tracing::warn!(?phase, "stale Settled callback ignored");
                    return;
                }
            }
            state.phase = Phase::Settled;
            state.active = Some(next.namespace.clone());
        }

        self.shared.stage.scroll_to_origin();
        run_isolated("scroll_geometry.refresh", || self.shared.scroll.refresh());

        let ctx = self.effect_ctx();
        for unit in self.shared.registry.global_units() {
            self.run_and_install(unit, &ctx);
        }
        for unit in self.shared.registry.enter_units(&next.namespace) {
            self.run_and_install(unit, &ctx);
        }

        run_isolated("page_enhancer.restart", || self.shared.enhancer.restart());
        tracing::debug!(namespace = %next.namespace, "navigation settled");
    }
}

impl TransitionHooks for TransitionCoordinator {
    fn once(&self, initial: &NamespaceInfo) {
        if let (Some(visits), Some(intro)) = (
            self.shared.visits.as_ref(),
            self.shared.registry.intro_unit(),
        ) {
            if visits.is_first_visit() {
                tracing::debug!("first visit; running intro");
                let ctx = self.effect_ctx();
                self.run_and_install(intro, &ctx);
                visits.mark_visit_complete();
            }
        }
        self.settle(initial);
    }

    fn before_leave(&self) {
        let exit_units: Vec<EffectUnit> = {
            let mut state = self.shared.state.lock().unwrap();
            if state.phase == Phase::Leaving {
                tracing::warn!("duplicate PreLeave ignored");
                return;
            }
            state.phase = Phase::Leaving;
            state
                .active
                .as_ref()
                .map(|ns| self.shared.registry.exit_units(ns).to_vec())
                .unwrap_or_default()
        };

        let ctx = self.effect_ctx();
        for unit in &exit_units {
            self.run_transient(unit, &ctx);
        }

        // Global teardown: drain every named slot, then dispose carousel
        // instances one by one. A failed disposal is logged and must not
        // block the siblings.
        self.shared.state.lock().unwrap().slots.clear_all();
        for id in self.shared.carousels.instances() {
            run_isolated("carousel.destroy", || {
                if let Err(err) = self.shared.carousels.destroy(id, true, true) {
                    tracing::warn!(error = %err, "carousel disposal failed");
                }
            });
        }
    }

    fn leave(&self, outgoing: ElementId) -> AnimationTicket {
        let style = &self.shared.style;
        let spec = TweenSpec::new(style.leave_duration_ms)
            .to("opacity", 0.0)
            .ease(style.leave_ease)
            .clear_after();
        let id = self.shared.tweens.animate(outgoing, spec);
        self.shared.state.lock().unwrap().phase = Phase::Swapping;
        AnimationTicket::for_tween(self.shared.tweens.clone(), id)
    }

    fn before_enter(&self, next: &NamespaceInfo) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.phase == Phase::Entering {
                tracing::warn!("duplicate PreEnter ignored");
                return;
            }
            state.phase = Phase::Entering;
        }

        // Restore globally-scoped elements a previous page may have left in
        // a non-default state, unless the incoming namespace owns that state.
        let ctx = self.effect_ctx();
        for rule in self.shared.registry.restore_rules() {
            if rule.except != next.namespace {
                self.run_transient(&rule.unit, &ctx);
            }
        }

        // Safety net for handles that predate this navigation (initial-load
        // effects): clear anything the incoming namespace does not declare.
        let mut state = self.shared.state.lock().unwrap();
        for key in state.slots.live_keys() {
            if !self.shared.registry.declares_slot(&next.namespace, key) {
                state.slots.clear(key);
            }
        }
    }

    fn enter(&self, incoming: ElementId) -> AnimationTicket {
        let style = &self.shared.style;
        let spec = TweenSpec::new(style.enter_duration_ms)
            .from_to("y", style.enter_offset_y, 0.0)
            .from_to("opacity", 0.0, 1.0)
            .ease(style.enter_ease)
            .clear_after();
        let id = self.shared.tweens.animate(incoming, spec);
        AnimationTicket::for_tween(self.shared.tweens.clone(), id)
    }

    fn after_enter(&self, next: &NamespaceInfo) {
        // Two nested frame deferrals, not a fixed delay: Settled must run
        // after layout has stabilized once, and never concurrently with the
        // entrance animation's final frame.
        let coordinator = self.clone();
        let info = next.clone();
        let scheduled = self
            .shared
            .scheduler
            .after_frames(2, move || coordinator.settle(&info));
        if scheduled.is_none() {
            tracing::warn!("scheduler gone; settling synchronously");
            self.settle(next);
        }
    }
}

/// Builder for [`TransitionCoordinator`]
pub struct CoordinatorBuilder {
    stage: Arc<dyn Stage>,
    tweens: Arc<dyn TweenBackend>,
    carousels: Arc<dyn CarouselBackend>,
    scheduler: SchedulerHandle,
    registry: NamespaceRegistry,
    visits: Option<VisitStore>,
    scroll: Arc<dyn ScrollGeometry>,
    enhancer: Arc<dyn PageEnhancer>,
    style: TransitionStyle,
}

impl CoordinatorBuilder {
    pub fn visit_store(mut self, visits: VisitStore) -> Self {
        self.visits = Some(visits);
        self
    }

    pub fn scroll_geometry(mut self, scroll: Arc<dyn ScrollGeometry>) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn page_enhancer(mut self, enhancer: Arc<dyn PageEnhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn style(mut self, style: TransitionStyle) -> Self {
        self.style = style;
        self
    }

    pub fn build(self) -> TransitionCoordinator {
        TransitionCoordinator {
            shared: Arc::new(Shared {
                stage: self.stage,
                tweens: self.tweens,
                carousels: self.carousels,
                scroll: self.scroll,
                enhancer: self.enhancer,
                scheduler: self.scheduler,
                registry: self.registry,
                visits: self.visits,
                style: self.style,
                state: Mutex::new(CoordinatorState {
                    phase: Phase::Idle,
                    active: None,
                    slots: EffectSlots::new(),
                }),
            }),
        }
    }
}
