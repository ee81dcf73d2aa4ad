//! Heartbeat pulse
//!
//! Infinite scale pulse on the projects heart. A marker flag keeps a second
//! init from stacking a second pulse on the same element.

use passage_core::{EffectHandle, EffectUnit, TweenBackend, TweenSpec};
use passage_platform::{Stage, StyleValue};

const INIT_MARK: &str = "heart-beat-init";

/// Heartbeat tuning
#[derive(Clone, Debug)]
pub struct HeartbeatConfig {
    pub selector: &'static str,
    pub pulse_ms: u32,
    pub min_scale: f32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            selector: ".home_projects_heart",
            pulse_ms: 1000,
            min_scale: 0.8,
        }
    }
}

/// Build the heartbeat unit (decorative)
pub fn heartbeat_unit(name: &'static str, config: HeartbeatConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        let heart = ctx.stage.query_one(config.selector)?;
        if ctx.stage.is_marked(heart, INIT_MARK) {
            return None;
        }
        ctx.stage.mark(heart, INIT_MARK);

        let pulse = move |tweens: &dyn TweenBackend| {
            tweens.animate(
                heart,
                TweenSpec::new(config.pulse_ms).from_to("scale", config.min_scale, 1.0),
            );
        };
        pulse(&*ctx.tweens);

        let tweens = ctx.tweens.clone();
        let beat_task = ctx
            .scheduler
            .every_ms(config.pulse_ms as f64, move || pulse(&*tweens));

        let stage = ctx.stage.clone();
        let tweens = ctx.tweens.clone();
        let scheduler = ctx.scheduler.clone();
        Some(EffectHandle::new(move || {
            if let Some(task) = beat_task {
                scheduler.cancel(task);
            }
            stage.unmark(heart, INIT_MARK);
            tweens.clear_props(heart);
            tweens.set(heart, "scale", StyleValue::Number(1.0));
        }))
    })
    .decorative()
}
