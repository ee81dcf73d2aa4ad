//! First-visit preloader
//!
//! Shown once per retention window. A progress counter ramps toward 95%
//! over a minimum on-screen duration, then snaps to 100% and the preloader
//! fades out. While it is visible, the cards element drifts after the
//! pointer with lerp smoothing. Whether the intro runs at all is the
//! coordinator's decision; this unit only owns the presentation.

use std::sync::{Arc, Mutex};

use passage_core::{
    EffectContext, EffectHandle, EffectUnit, SchedulerHandle, TaskId, TweenBackend, TweenSpec,
};
use passage_platform::{
    ElementId, EventKind, ListenTarget, ListenerId, Stage, StageEvent, StyleValue,
};

const INIT_MARK: &str = "preloader-init";

/// Preloader tuning
#[derive(Clone, Debug)]
pub struct IntroConfig {
    pub preloader_selector: &'static str,
    pub counter_selector: &'static str,
    pub cards_selector: &'static str,
    /// Minimum time the preloader stays on screen
    pub min_duration_ms: f64,
    pub counter_tick_ms: f64,
    pub finish_tick_ms: f64,
    /// Lerp factor for the cards pointer follow
    pub follow_factor: f32,
    /// Pointer offset attenuation for the cards drift
    pub follow_intensity: f32,
    pub exit_fade_ms: u32,
    pub exit_scale: f32,
    /// Pause between the fade completing and the preloader being hidden
    pub exit_delay_ms: f64,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            preloader_selector: ".preloader_component",
            counter_selector: ".preloader_cards-loading-count",
            cards_selector: ".preloader_cards",
            min_duration_ms: 2000.0,
            counter_tick_ms: 50.0,
            finish_tick_ms: 30.0,
            follow_factor: 0.1,
            follow_intensity: 0.5,
            exit_fade_ms: 500,
            exit_scale: 0.9,
            exit_delay_ms: 500.0,
        }
    }
}

struct IntroState {
    progress: f32,
    mouse: (f32, f32),
    current: (f32, f32),
    counter_task: Option<TaskId>,
    follow_task: Option<TaskId>,
    pointer_listener: Option<ListenerId>,
    finish_delay: Option<TaskId>,
    finish_loop: Option<TaskId>,
    hide_task: Option<TaskId>,
}

/// One live preloader run
struct IntroRun {
    stage: Arc<dyn Stage>,
    tweens: Arc<dyn TweenBackend>,
    scheduler: SchedulerHandle,
    preloader: ElementId,
    counter: Option<ElementId>,
    cards: Option<ElementId>,
    config: IntroConfig,
    state: Mutex<IntroState>,
}

impl IntroRun {
    fn begin(self: &Arc<Self>) {
        self.stage
            .set_style(self.preloader, "display", "flex".into());
        self.stage
            .set_style(self.preloader, "opacity", StyleValue::Number(1.0));

        if let Some(cards) = self.cards {
            self.start_follow(cards);
        }

        if let Some(counter) = self.counter {
            self.set_counter(counter, 0.0);
            let run = self.clone();
            let step =
                95.0 * (self.config.counter_tick_ms / self.config.min_duration_ms) as f32;
            let task = self.scheduler.every_ms(self.config.counter_tick_ms, move || {
                let progress = {
                    let mut state = run.state.lock().unwrap();
                    state.progress = (state.progress + step).min(95.0);
                    state.progress
                };
                run.set_counter(counter, progress);
            });
            self.state.lock().unwrap().counter_task = task;
        }

        let run = self.clone();
        let task = self
            .scheduler
            .after_ms(self.config.min_duration_ms, move || run.finish());
        self.state.lock().unwrap().finish_delay = task;
    }

    fn start_follow(self: &Arc<Self>, cards: ElementId) {
        let listen_run = self.clone();
        let listener = self.stage.listen(
            ListenTarget::Window,
            EventKind::PointerMove,
            Arc::new(move |event: &StageEvent| {
                if let StageEvent::PointerMove { x, y } = event {
                    let half_w = listen_run.stage.viewport_width() / 2.0;
                    let half_h = listen_run.stage.viewport_height() / 2.0;
                    let intensity = listen_run.config.follow_intensity;
                    listen_run.state.lock().unwrap().mouse =
                        ((*x - half_w) * intensity, (*y - half_h) * intensity);
                }
            }),
        );

        let frame_run = self.clone();
        let task = self.scheduler.every_ms(1000.0 / 60.0, move || {
            let (x, y) = {
                let mut state = frame_run.state.lock().unwrap();
                let factor = frame_run.config.follow_factor;
                state.current.0 += (state.mouse.0 - state.current.0) * factor;
                state.current.1 += (state.mouse.1 - state.current.1) * factor;
                state.current
            };
            frame_run.tweens.set(cards, "x", StyleValue::Number(x));
            frame_run.tweens.set(cards, "y", StyleValue::Number(y));
        });

        let mut state = self.state.lock().unwrap();
        state.pointer_listener = Some(listener);
        state.follow_task = task;
    }

    fn set_counter(&self, counter: ElementId, progress: f32) {
        self.stage.set_style(
            counter,
            "content",
            StyleValue::Text(format!("{}%", progress.floor() as u32)),
        );
    }

    /// Minimum duration elapsed: drive the counter to 100%, then exit
    fn finish(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(task) = state.counter_task.take() {
                self.scheduler.cancel(task);
            }
        }
        let Some(counter) = self.counter else {
            self.exit();
            return;
        };
        let run = self.clone();
        let task = self.scheduler.every_ms(self.config.finish_tick_ms, move || {
            let progress = {
                let mut state = run.state.lock().unwrap();
                state.progress = (state.progress + 2.0).min(100.0);
                state.progress
            };
            run.set_counter(counter, progress);
            if progress >= 100.0 {
                if let Some(task) = run.state.lock().unwrap().finish_loop.take() {
                    run.scheduler.cancel(task);
                }
                run.exit();
            }
        });
        self.state.lock().unwrap().finish_loop = task;
    }

    /// Fade the preloader out, then hide it entirely
    fn exit(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(listener) = state.pointer_listener.take() {
                self.stage.unlisten(listener);
            }
            if let Some(task) = state.follow_task.take() {
                self.scheduler.cancel(task);
            }
        }

        self.tweens.animate(
            self.preloader,
            TweenSpec::new(self.config.exit_fade_ms).to("opacity", 0.0),
        );
        if let Some(cards) = self.cards {
            self.tweens.animate(
                cards,
                TweenSpec::new(self.config.exit_fade_ms).to("scale", self.config.exit_scale),
            );
        }

        let run = self.clone();
        let delay = self.config.exit_fade_ms as f64 + self.config.exit_delay_ms;
        let task = self.scheduler.after_ms(delay, move || run.hide());
        self.state.lock().unwrap().hide_task = task;
    }

    fn hide(&self) {
        self.stage
            .set_style(self.preloader, "display", "none".into());
        tracing::debug!("preloader dismissed");
    }

    /// Cancel everything, whatever phase the run is in
    fn teardown(&self) {
        let mut state = self.state.lock().unwrap();
        for task in [
            state.counter_task.take(),
            state.follow_task.take(),
            state.finish_delay.take(),
            state.finish_loop.take(),
            state.hide_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(task);
        }
        if let Some(listener) = state.pointer_listener.take() {
            self.stage.unlisten(listener);
        }
        drop(state);
        self.stage.unmark(self.preloader, INIT_MARK);
        self.hide();
    }
}

/// Build the first-visit preloader unit
pub fn intro_unit(name: &'static str, config: IntroConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx: &EffectContext| {
        let preloader = ctx.stage.query_one(config.preloader_selector)?;
        if ctx.stage.is_marked(preloader, INIT_MARK) {
            return None;
        }
        ctx.stage.mark(preloader, INIT_MARK);
        let run = Arc::new(IntroRun {
            stage: ctx.stage.clone(),
            tweens: ctx.tweens.clone(),
            scheduler: ctx.scheduler.clone(),
            preloader,
            counter: ctx.stage.query_one(config.counter_selector),
            cards: ctx.stage.query_one(config.cards_selector),
            config: config.clone(),
            state: Mutex::new(IntroState {
                progress: 0.0,
                mouse: (0.0, 0.0),
                current: (0.0, 0.0),
                counter_task: None,
                follow_task: None,
                pointer_listener: None,
                finish_delay: None,
                finish_loop: None,
                hide_task: None,
            }),
        });
        run.begin();

        Some(EffectHandle::new(move || run.teardown()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_core::{FrameScheduler, InstantTweens, RecordingCarousels};
    use passage_platform::MemoryStage;

    fn setup() -> (
        Arc<MemoryStage>,
        FrameScheduler,
        EffectContext,
        ElementId,
        ElementId,
    ) {
        let stage = Arc::new(MemoryStage::new());
        let preloader = stage.add_element(&[".preloader_component"]);
        let counter = stage.add_child(preloader, &[".preloader_cards-loading-count"]);
        stage.add_child(preloader, &[".preloader_cards"]);
        let scheduler = FrameScheduler::new();
        let ctx = EffectContext::new(
            stage.clone(),
            Arc::new(InstantTweens::new(stage.clone())),
            Arc::new(RecordingCarousels::new()),
            scheduler.handle(),
        );
        (stage, scheduler, ctx, preloader, counter)
    }

    fn counter_text(stage: &MemoryStage, counter: ElementId) -> String {
        match stage.style(counter, "content") {
            Some(StyleValue::Text(text)) => text,
            other => panic!("unexpected counter value: {other:?}"),
        }
    }

    #[test]
    fn test_counter_ramps_then_snaps_to_completion() {
        let (stage, scheduler, ctx, preloader, counter) = setup();
        let _handle = intro_unit("intro", IntroConfig::default())
            .run(&ctx)
            .expect("handle");
        assert_eq!(
            stage.style(preloader, "display"),
            Some(StyleValue::Text("flex".into()))
        );
        assert_eq!(counter_text(&stage, counter), "0%");

        // Ramp phase: capped at 95% until the minimum duration elapses
        for _ in 0..40 {
            scheduler.tick(50.0);
        }
        assert_eq!(counter_text(&stage, counter), "95%");

        // Past the minimum: the finishing loop drives it to 100%
        scheduler.tick(50.0);
        for _ in 0..3 {
            scheduler.tick(30.0);
        }
        assert_eq!(counter_text(&stage, counter), "100%");

        // Fade plus dismissal delay, then the preloader is hidden
        scheduler.tick(1100.0);
        assert_eq!(
            stage.style(preloader, "display"),
            Some(StyleValue::Text("none".into()))
        );
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cards_drift_after_the_pointer() {
        let (stage, scheduler, ctx, _preloader, _counter) = setup();
        let _handle = intro_unit("intro", IntroConfig::default())
            .run(&ctx)
            .expect("handle");
        let cards = stage.query_one(".preloader_cards").unwrap();

        // 1280x800 viewport: pointer at the right edge pulls the cards
        // toward (+320, +200) at half intensity
        stage.emit_pointer_move(1280.0, 800.0);
        for _ in 0..200 {
            scheduler.tick(1000.0 / 60.0);
        }
        let x = stage.style(cards, "x").unwrap().as_number().unwrap();
        let y = stage.style(cards, "y").unwrap().as_number().unwrap();
        assert!((x - 320.0).abs() < 1.0);
        assert!((y - 200.0).abs() < 1.0);
    }

    #[test]
    fn test_teardown_cancels_everything_mid_run() {
        let (stage, scheduler, ctx, preloader, _counter) = setup();
        let handle = intro_unit("intro", IntroConfig::default())
            .run(&ctx)
            .expect("handle");
        scheduler.tick(500.0);
        handle.teardown("intro");

        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(stage.listener_count(), 0);
        assert_eq!(
            stage.style(preloader, "display"),
            Some(StyleValue::Text("none".into()))
        );
        assert!(!stage.is_marked(preloader, INIT_MARK));
    }

    #[test]
    fn test_marker_guard_prevents_double_init() {
        let (stage, scheduler, ctx, _preloader, _counter) = setup();
        let unit = intro_unit("intro", IntroConfig::default());
        let first = unit.run(&ctx);
        assert!(first.is_some());
        let listeners = stage.listener_count();
        let pending = scheduler.pending_count();

        assert!(unit.run(&ctx).is_none());
        assert_eq!(stage.listener_count(), listeners);
        assert_eq!(scheduler.pending_count(), pending);
    }

    #[test]
    fn test_missing_preloader_is_a_noop() {
        let stage = Arc::new(MemoryStage::new());
        let scheduler = FrameScheduler::new();
        let ctx = EffectContext::new(
            stage.clone(),
            Arc::new(InstantTweens::new(stage.clone())),
            Arc::new(RecordingCarousels::new()),
            scheduler.handle(),
        );
        assert!(intro_unit("intro", IntroConfig::default()).run(&ctx).is_none());
        assert_eq!(scheduler.pending_count(), 0);
    }
}
