//! Breakpoint-aware project slider
//!
//! One carousel root, two configurations: a multi-slide desktop layout and a
//! near-single-slide touch layout below the breakpoint. Resize re-evaluation
//! is debounced, and switching modes always destroys the old instance before
//! creating the new one, so the root never hosts two live instances.

use std::sync::{Arc, Mutex};

use passage_core::{
    CarouselBackend, CarouselConfig, CarouselId, EffectHandle, EffectUnit, SlidesPerView, TaskId,
};
use passage_platform::{ElementId, EventKind, ListenTarget, Stage, StageEvent};

const INIT_MARK: &str = "slider-init";

/// One of the two slider layouts
#[derive(Clone, Debug)]
pub struct SliderProfile {
    pub slides_per_view: SlidesPerView,
    pub space_between: f32,
    pub speed_ms: u32,
    pub grab_cursor: bool,
}

/// Responsive slider tuning
#[derive(Clone, Debug)]
pub struct ResponsiveSliderConfig {
    pub root_selector: &'static str,
    pub breakpoint_px: f32,
    pub debounce_ms: f64,
    pub wide: SliderProfile,
    pub narrow: SliderProfile,
}

impl Default for ResponsiveSliderConfig {
    fn default() -> Self {
        Self {
            root_selector: ".swiper.is-projects-other",
            breakpoint_px: 992.0,
            debounce_ms: 200.0,
            wide: SliderProfile {
                slides_per_view: SlidesPerView::Count(3.0),
                space_between: 48.0,
                speed_ms: 1000,
                grab_cursor: true,
            },
            narrow: SliderProfile {
                slides_per_view: SlidesPerView::Count(1.2),
                space_between: 16.0,
                speed_ms: 600,
                grab_cursor: false,
            },
        }
    }
}

fn carousel_for(profile: &SliderProfile) -> CarouselConfig {
    CarouselConfig {
        looped: false,
        centered: true,
        speed_ms: profile.speed_ms,
        space_between: profile.space_between,
        slides_per_view: profile.slides_per_view,
        autoplay: false,
        allow_touch: true,
        grab_cursor: profile.grab_cursor,
        linear_timing: false,
    }
}

/// Destroy the current instance (if the mode changed) and create the new one
fn apply_mode(
    carousels: &Arc<dyn CarouselBackend>,
    root: ElementId,
    config: &ResponsiveSliderConfig,
    current: &Mutex<Option<(CarouselId, bool)>>,
    viewport_width: f32,
) {
    let wide = viewport_width >= config.breakpoint_px;
    let mut slot = current.lock().unwrap();
    if let Some((_, active_wide)) = *slot {
        if active_wide == wide {
            return;
        }
    }
    if let Some((old, _)) = slot.take() {
        if let Err(err) = carousels.destroy(old, true, true) {
            tracing::warn!(error = %err, "slider disposal failed");
        }
    }
    let profile = if wide { &config.wide } else { &config.narrow };
    match carousels.create(root, carousel_for(profile)) {
        Ok(id) => *slot = Some((id, wide)),
        Err(err) => tracing::warn!(error = %err, "slider creation failed"),
    }
}

/// Build the responsive slider unit
pub fn responsive_slider_unit(name: &'static str, config: ResponsiveSliderConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        let root = ctx.stage.query_one(config.root_selector)?;
        if ctx.stage.is_marked(root, INIT_MARK) {
            return None;
        }
        ctx.stage.mark(root, INIT_MARK);

        let current: Arc<Mutex<Option<(CarouselId, bool)>>> = Arc::new(Mutex::new(None));
        apply_mode(
            &ctx.carousels,
            root,
            &config,
            &current,
            ctx.stage.viewport_width(),
        );

        let pending: Arc<Mutex<Option<TaskId>>> = Arc::new(Mutex::new(None));
        let carousels = ctx.carousels.clone();
        let scheduler = ctx.scheduler.clone();
        let resize_current = current.clone();
        let resize_pending = pending.clone();
        let resize_config = config.clone();
        let resize_listener = ctx.stage.listen(
            ListenTarget::Window,
            EventKind::Resize,
            Arc::new(move |event: &StageEvent| {
                let StageEvent::Resize { width, .. } = event else {
                    return;
                };
                let width = *width;
                let mut slot = resize_pending.lock().unwrap();
                if let Some(prev) = slot.take() {
                    scheduler.cancel(prev);
                }
                let carousels = carousels.clone();
                let current = resize_current.clone();
                let config = resize_config.clone();
                *slot = scheduler.after_ms(config.debounce_ms, move || {
                    apply_mode(&carousels, root, &config, &current, width);
                });
            }),
        );

        let stage = ctx.stage.clone();
        let carousels = ctx.carousels.clone();
        let scheduler = ctx.scheduler.clone();
        Some(EffectHandle::new(move || {
            stage.unlisten(resize_listener);
            if let Some(task) = pending.lock().unwrap().take() {
                scheduler.cancel(task);
            }
            if let Some((id, _)) = current.lock().unwrap().take() {
                if carousels.instances().contains(&id) {
                    if let Err(err) = carousels.destroy(id, true, true) {
                        tracing::warn!(error = %err, "slider disposal failed");
                    }
                }
            }
            stage.unmark(root, INIT_MARK);
        }))
    })
}
