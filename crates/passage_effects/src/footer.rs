//! Footer card tilt
//!
//! Decorative 3D tilt on the footer card while the pointer moves inside the
//! trigger region: pointer deltas drive rotation, and a short settle timer
//! eases the card back to rest once the pointer stops. Desktop only, with a
//! marker guard against double initialization.

use std::sync::{Arc, Mutex};

use passage_core::{EffectHandle, EffectUnit, SchedulerHandle, TaskId, TweenBackend};
use passage_platform::{
    ElementId, EventKind, ListenTarget, Stage, StageEvent, StyleValue,
};

const INIT_MARK: &str = "footer-tilt-init";

/// Footer tilt tuning
#[derive(Clone, Debug)]
pub struct FooterTiltConfig {
    pub root_selector: &'static str,
    pub card_selector: &'static str,
    pub media_selector: &'static str,
    pub trigger_selector: &'static str,
    pub breakpoint_px: f32,
    /// Pointer delta to rotation degrees
    pub rotation_factor: f32,
    /// Pointer idle time before the card settles back
    pub settle_delay_ms: f64,
    /// Media zoom while the card is at rest
    pub rest_scale: f32,
}

impl Default for FooterTiltConfig {
    fn default() -> Self {
        Self {
            root_selector: ".footer-2_content",
            card_selector: ".footer-2_cards",
            media_selector: ".footer-2_cards-asset",
            trigger_selector: ".footer-2_cards-trigger",
            breakpoint_px: 992.0,
            rotation_factor: 2.5,
            settle_delay_ms: 66.0,
            rest_scale: 1.2,
        }
    }
}

struct TiltState {
    inside: bool,
    last: Option<(f32, f32)>,
    settle_task: Option<TaskId>,
}

fn settle(tweens: &Arc<dyn TweenBackend>, card: ElementId, media: ElementId, rest_scale: f32) {
    tweens.set(card, "rotationX", StyleValue::Number(0.0));
    tweens.set(card, "rotationY", StyleValue::Number(0.0));
    tweens.set(media, "scale", StyleValue::Number(rest_scale));
}

fn schedule_settle(
    scheduler: &SchedulerHandle,
    tweens: &Arc<dyn TweenBackend>,
    state: &Arc<Mutex<TiltState>>,
    card: ElementId,
    media: ElementId,
    config: &FooterTiltConfig,
) {
    let mut s = state.lock().unwrap();
    if let Some(prev) = s.settle_task.take() {
        scheduler.cancel(prev);
    }
    let tweens = tweens.clone();
    let rest_scale = config.rest_scale;
    s.settle_task = scheduler.after_ms(config.settle_delay_ms, move || {
        settle(&tweens, card, media, rest_scale);
    });
}

/// Build the footer tilt unit (decorative)
pub fn footer_tilt_unit(name: &'static str, config: FooterTiltConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        if ctx.stage.viewport_width() < config.breakpoint_px {
            return None;
        }
        let root = ctx.stage.query_one(config.root_selector)?;
        if ctx.stage.is_marked(root, INIT_MARK) {
            return None;
        }
        let card = ctx
            .stage
            .query_within(root, config.card_selector)
            .into_iter()
            .next()?;
        let media = ctx
            .stage
            .query_within(root, config.media_selector)
            .into_iter()
            .next()?;
        let trigger = ctx.stage.query_one(config.trigger_selector)?;
        ctx.stage.mark(root, INIT_MARK);

        settle(&ctx.tweens, card, media, config.rest_scale);

        let state = Arc::new(Mutex::new(TiltState {
            inside: false,
            last: None,
            settle_task: None,
        }));

        let mut listeners = Vec::new();
        let enter_state = state.clone();
        listeners.push(ctx.stage.listen(
            ListenTarget::Element(trigger),
            EventKind::PointerEnter,
            Arc::new(move |_| {
                let mut s = enter_state.lock().unwrap();
                s.inside = true;
                s.last = None;
            }),
        ));

        let leave_state = state.clone();
        let leave_tweens = ctx.tweens.clone();
        let rest_scale = config.rest_scale;
        listeners.push(ctx.stage.listen(
            ListenTarget::Element(trigger),
            EventKind::PointerLeave,
            Arc::new(move |_| {
                let mut s = leave_state.lock().unwrap();
                s.inside = false;
                s.last = None;
                settle(&leave_tweens, card, media, rest_scale);
            }),
        ));

        let move_state = state.clone();
        let move_tweens = ctx.tweens.clone();
        let move_scheduler = ctx.scheduler.clone();
        let move_config = config.clone();
        listeners.push(ctx.stage.listen(
            ListenTarget::Window,
            EventKind::PointerMove,
            Arc::new(move |event: &StageEvent| {
                let StageEvent::PointerMove { x, y } = event else {
                    return;
                };
                let delta = {
                    let mut s = move_state.lock().unwrap();
                    if !s.inside {
                        return;
                    }
                    let delta = s.last.map(|(lx, ly)| (*x - lx, *y - ly));
                    s.last = Some((*x, *y));
                    delta
                };
                let Some((dx, dy)) = delta else {
                    return;
                };
                move_tweens.set(
                    card,
                    "rotationY",
                    StyleValue::Number(dx * move_config.rotation_factor),
                );
                move_tweens.set(
                    card,
                    "rotationX",
                    StyleValue::Number(-dy * move_config.rotation_factor),
                );
                move_tweens.set(media, "scale", StyleValue::Number(1.0));
                schedule_settle(
                    &move_scheduler,
                    &move_tweens,
                    &move_state,
                    card,
                    media,
                    &move_config,
                );
            }),
        ));

        let stage = ctx.stage.clone();
        let tweens = ctx.tweens.clone();
        let scheduler = ctx.scheduler.clone();
        Some(EffectHandle::new(move || {
            for id in listeners {
                stage.unlisten(id);
            }
            if let Some(task) = state.lock().unwrap().settle_task.take() {
                scheduler.cancel(task);
            }
            stage.unmark(root, INIT_MARK);
            tweens.clear_props(card);
            tweens.clear_props(media);
        }))
    })
    .decorative()
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_core::{EffectContext, FrameScheduler, InstantTweens, RecordingCarousels};
    use passage_platform::MemoryStage;

    fn setup() -> (
        Arc<MemoryStage>,
        FrameScheduler,
        EffectContext,
        ElementId,
        ElementId,
    ) {
        let stage = Arc::new(MemoryStage::new());
        stage.set_viewport(1280.0, 800.0);
        let root = stage.add_element(&[".footer-2_content"]);
        let card = stage.add_child(root, &[".footer-2_cards"]);
        stage.add_child(root, &[".footer-2_cards-asset"]);
        let trigger = stage.add_element(&[".footer-2_cards-trigger"]);
        let scheduler = FrameScheduler::new();
        let ctx = EffectContext::new(
            stage.clone(),
            Arc::new(InstantTweens::new(stage.clone())),
            Arc::new(RecordingCarousels::new()),
            scheduler.handle(),
        );
        (stage, scheduler, ctx, card, trigger)
    }

    #[test]
    fn test_tilt_follows_pointer_deltas_inside_trigger() {
        let (stage, _scheduler, ctx, card, trigger) = setup();
        let _handle = footer_tilt_unit("footerTilt", FooterTiltConfig::default())
            .run(&ctx)
            .expect("handle");

        stage.emit_pointer_enter(trigger);
        stage.emit_pointer_move(100.0, 100.0); // establishes the reference point
        stage.emit_pointer_move(110.0, 96.0);

        assert_eq!(
            stage.style(card, "rotationY"),
            Some(StyleValue::Number(25.0))
        );
        assert_eq!(
            stage.style(card, "rotationX"),
            Some(StyleValue::Number(10.0))
        );
    }

    #[test]
    fn test_settles_after_pointer_stops() {
        let (stage, scheduler, ctx, card, trigger) = setup();
        let _handle = footer_tilt_unit("footerTilt", FooterTiltConfig::default())
            .run(&ctx)
            .expect("handle");

        stage.emit_pointer_enter(trigger);
        stage.emit_pointer_move(100.0, 100.0);
        stage.emit_pointer_move(120.0, 100.0);
        scheduler.tick(70.0);

        assert_eq!(stage.style(card, "rotationY"), Some(StyleValue::Number(0.0)));
    }

    #[test]
    fn test_moves_outside_trigger_are_ignored() {
        let (stage, _scheduler, ctx, card, _trigger) = setup();
        let _handle = footer_tilt_unit("footerTilt", FooterTiltConfig::default())
            .run(&ctx)
            .expect("handle");

        stage.emit_pointer_move(100.0, 100.0);
        stage.emit_pointer_move(150.0, 100.0);
        assert_eq!(stage.style(card, "rotationY"), Some(StyleValue::Number(0.0)));
    }

    #[test]
    fn test_marker_guard_prevents_double_init() {
        let (stage, _scheduler, ctx, _card, _trigger) = setup();
        let unit = footer_tilt_unit("footerTilt", FooterTiltConfig::default());
        let first = unit.run(&ctx);
        assert!(first.is_some());
        let listeners = stage.listener_count();

        assert!(unit.run(&ctx).is_none());
        assert_eq!(stage.listener_count(), listeners);
    }

    #[test]
    fn test_narrow_viewport_is_a_noop() {
        let (stage, _scheduler, ctx, _card, _trigger) = setup();
        stage.set_viewport(700.0, 800.0);
        assert!(footer_tilt_unit("footerTilt", FooterTiltConfig::default())
            .run(&ctx)
            .is_none());
        assert_eq!(stage.listener_count(), 0);
    }

    #[test]
    fn test_teardown_clears_marker_and_transforms() {
        let (stage, _scheduler, ctx, card, trigger) = setup();
        let handle = footer_tilt_unit("footerTilt", FooterTiltConfig::default())
            .run(&ctx)
            .expect("handle");

        stage.emit_pointer_enter(trigger);
        stage.emit_pointer_move(100.0, 100.0);
        stage.emit_pointer_move(120.0, 110.0);
        handle.teardown("footerTilt");

        assert_eq!(stage.listener_count(), 0);
        assert_eq!(stage.style_count(card), 0);
        let root = stage.query_one(".footer-2_content").unwrap();
        assert!(!stage.is_marked(root, INIT_MARK));
    }
}
