//! Constant-velocity marquee carousels
//!
//! Every marquee on the page scrolls at the same pixel velocity regardless
//! of its content: slides are duplicated (as tagged clones) until the strip
//! covers several viewport widths, then the carousel speed is derived from
//! the resulting content width. Stale clones from an earlier init are
//! removed before duplicating again, so repeated navigations never grow the
//! strip without bound.

use std::sync::{Arc, Mutex};

use passage_core::{
    CarouselBackend, CarouselConfig, CarouselId, EffectHandle, EffectUnit, SlidesPerView, TaskId,
};
use passage_platform::{ElementId, EventKind, ListenTarget, Stage, StageEvent};

const INIT_MARK: &str = "marquee-init";

/// Marquee tuning
#[derive(Clone, Debug)]
pub struct MarqueeConfig {
    pub root_selector: &'static str,
    pub wrapper_selector: &'static str,
    /// Scroll velocity shared by every marquee, in pixels per second
    pub pixels_per_second: f32,
    pub space_between: f32,
    /// Content must cover this many viewport widths for a seamless loop
    pub duplication_multiplier: f32,
    /// Hard cap on duplication passes for pathological layouts
    pub max_duplication_passes: usize,
    /// Resize debounce before speeds are recomputed
    pub debounce_ms: f64,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            root_selector: ".swiper.is-loop-word",
            wrapper_selector: ".swiper-wrapper",
            pixels_per_second: 50.0,
            space_between: 20.0,
            duplication_multiplier: 4.0,
            max_duplication_passes: 100,
            debounce_ms: 200.0,
        }
    }
}

/// Transition duration that yields the configured velocity, floored at 1s
fn speed_for(content_width: f32, pixels_per_second: f32) -> u32 {
    ((content_width / pixels_per_second) * 1000.0).max(1000.0) as u32
}

/// Clean stale clones, then duplicate slides until the strip is wide enough
fn fill_wrapper(stage: &dyn Stage, root: ElementId, wrapper: ElementId, config: &MarqueeConfig) {
    stage.remove_cloned_children(wrapper);
    let target = stage.viewport_width().max(stage.element_width(root))
        * config.duplication_multiplier;
    let mut passes = 0;
    while stage.content_width(wrapper) < target && passes < config.max_duplication_passes {
        if stage.duplicate_children(wrapper) == 0 {
            break;
        }
        passes += 1;
    }
}

/// Build a marquee unit for every root matching the configured selector
pub fn marquee_unit(name: &'static str, config: MarqueeConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        let roots = ctx.stage.query(config.root_selector);
        if roots.is_empty() {
            return None;
        }

        let mut built: Vec<(ElementId, ElementId, CarouselId)> = Vec::new();
        for root in roots {
            if ctx.stage.is_marked(root, INIT_MARK) {
                continue;
            }
            let Some(wrapper) = ctx
                .stage
                .query_within(root, config.wrapper_selector)
                .into_iter()
                .next()
            else {
                continue;
            };
            fill_wrapper(&*ctx.stage, root, wrapper, &config);

            let carousel = CarouselConfig {
                looped: true,
                centered: true,
                speed_ms: speed_for(ctx.stage.content_width(wrapper), config.pixels_per_second),
                space_between: config.space_between,
                slides_per_view: SlidesPerView::Auto,
                autoplay: true,
                allow_touch: false,
                grab_cursor: false,
                linear_timing: true,
            };
            match ctx.carousels.create(root, carousel) {
                Ok(id) => {
                    ctx.stage.mark(root, INIT_MARK);
                    built.push((root, wrapper, id));
                }
                Err(err) => tracing::warn!(unit = name, error = %err, "marquee creation failed"),
            }
        }
        if built.is_empty() {
            return None;
        }

        let built = Arc::new(built);
        let pending: Arc<Mutex<Option<TaskId>>> = Arc::new(Mutex::new(None));

        // Debounced resize: recompute every marquee's speed from its strip width
        let stage = ctx.stage.clone();
        let carousels = ctx.carousels.clone();
        let scheduler = ctx.scheduler.clone();
        let resize_built = built.clone();
        let resize_pending = pending.clone();
        let pixels_per_second = config.pixels_per_second;
        let debounce_ms = config.debounce_ms;
        let resize_listener = ctx.stage.listen(
            ListenTarget::Window,
            EventKind::Resize,
            Arc::new(move |_: &StageEvent| {
                let mut slot = resize_pending.lock().unwrap();
                if let Some(prev) = slot.take() {
                    scheduler.cancel(prev);
                }
                let stage = stage.clone();
                let carousels = carousels.clone();
                let built = resize_built.clone();
                *slot = scheduler.after_ms(debounce_ms, move || {
                    for (_, wrapper, id) in built.iter() {
                        let speed = speed_for(stage.content_width(*wrapper), pixels_per_second);
                        carousels.update_speed(*id, speed);
                    }
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
            for (root, wrapper, id) in built.iter() {
                // The coordinator may have disposed the instance already
                if carousels.instances().contains(id) {
                    if let Err(err) = carousels.destroy(*id, true, true) {
                        tracing::warn!(error = %err, "marquee disposal failed");
                    }
                }
                stage.remove_cloned_children(*wrapper);
                stage.unmark(*root, INIT_MARK);
            }
        }))
    })
}
