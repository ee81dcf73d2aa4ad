//! Network card gradients
//!
//! Composes each gradient container's background from the colors of its two
//! source elements. Containers missing either source are skipped. Pure
//! style application, nothing to tear down.

use passage_core::EffectUnit;
use passage_platform::{Stage, StyleValue};

/// Gradient composition tuning
#[derive(Clone, Debug)]
pub struct GradientConfig {
    pub container_selector: &'static str,
    pub first_selector: &'static str,
    pub second_selector: &'static str,
    pub fallback_color: &'static str,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            container_selector: ".network_cards-background-gradient",
            first_selector: ".network_cards-background.is-1",
            second_selector: ".network_cards-background.is-2",
            fallback_color: "#000000",
        }
    }
}

fn color_of(stage: &dyn Stage, container: passage_platform::ElementId, selector: &str, fallback: &str) -> Option<String> {
    let source = stage.query_within(container, selector).into_iter().next()?;
    match stage.style(source, "background-color") {
        Some(StyleValue::Text(color)) => Some(color),
        _ => Some(fallback.to_string()),
    }
}

/// Build the network gradient unit (fire and forget, no handle)
pub fn gradient_unit(name: &'static str, config: GradientConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        for container in ctx.stage.query(config.container_selector) {
            let Some(first) = color_of(
                &*ctx.stage,
                container,
                config.first_selector,
                config.fallback_color,
            ) else {
                continue;
            };
            let Some(second) = color_of(
                &*ctx.stage,
                container,
                config.second_selector,
                config.fallback_color,
            ) else {
                continue;
            };
            ctx.stage.set_style(
                container,
                "background",
                StyleValue::Text(format!("linear-gradient(180deg, {first} 0%, {second} 100%)")),
            );
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_core::{EffectContext, FrameScheduler, InstantTweens, RecordingCarousels};
    use passage_platform::MemoryStage;
    use std::sync::Arc;

    fn ctx(stage: Arc<MemoryStage>) -> (FrameScheduler, EffectContext) {
        let scheduler = FrameScheduler::new();
        let ctx = EffectContext::new(
            stage.clone(),
            Arc::new(InstantTweens::new(stage)),
            Arc::new(RecordingCarousels::new()),
            scheduler.handle(),
        );
        (scheduler, ctx)
    }

    #[test]
    fn test_composes_gradient_from_source_colors() {
        let stage = Arc::new(MemoryStage::new());
        let container = stage.add_element(&[".network_cards-background-gradient"]);
        let first = stage.add_child(container, &[".network_cards-background.is-1"]);
        let second = stage.add_child(container, &[".network_cards-background.is-2"]);
        stage.set_style(first, "background-color", "#DB0617".into());
        stage.set_style(second, "background-color", "#1500FF".into());
        let (_scheduler, ctx) = ctx(stage.clone());

        gradient_unit("networkGradient", GradientConfig::default()).run(&ctx);
        assert_eq!(
            stage.style(container, "background"),
            Some(StyleValue::Text(
                "linear-gradient(180deg, #DB0617 0%, #1500FF 100%)".into()
            ))
        );
    }

    #[test]
    fn test_missing_source_color_uses_fallback() {
        let stage = Arc::new(MemoryStage::new());
        let container = stage.add_element(&[".network_cards-background-gradient"]);
        stage.add_child(container, &[".network_cards-background.is-1"]);
        stage.add_child(container, &[".network_cards-background.is-2"]);
        let (_scheduler, ctx) = ctx(stage.clone());

        gradient_unit("networkGradient", GradientConfig::default()).run(&ctx);
        assert_eq!(
            stage.style(container, "background"),
            Some(StyleValue::Text(
                "linear-gradient(180deg, #000000 0%, #000000 100%)".into()
            ))
        );
    }

    #[test]
    fn test_container_without_sources_is_skipped() {
        let stage = Arc::new(MemoryStage::new());
        let container = stage.add_element(&[".network_cards-background-gradient"]);
        let (_scheduler, ctx) = ctx(stage.clone());

        gradient_unit("networkGradient", GradientConfig::default()).run(&ctx);
        assert_eq!(stage.style(container, "background"), None);
    }
}
