//! Per-navigation logo spin
//!
//! One full rotation of the nav logo on every page entry. The tween clears
//! its inline state on completion so the logo always rests at its default
//! orientation, ready for the next navigation.

use passage_core::{EffectUnit, TweenBackend, TweenSpec};
use passage_platform::{Stage, StyleValue};

/// Logo spin tuning
#[derive(Clone, Debug)]
pub struct LogoConfig {
    pub selector: &'static str,
    pub duration_ms: u32,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            selector: ".logo-svg.is-s",
            duration_ms: 1000,
        }
    }
}

/// Build the logo rotation unit (fire and forget, no handle)
pub fn logo_rotate_unit(name: &'static str, config: LogoConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        let logo = ctx.stage.query_one(config.selector)?;
        // Normalize the starting state in case a previous spin was cut short
        ctx.tweens.set(logo, "rotationY", StyleValue::Number(0.0));
        ctx.tweens.animate(
            logo,
            TweenSpec::new(config.duration_ms)
                .from_to("rotationY", 0.0, 360.0)
                .clear_after(),
        );
        None
    })
}
