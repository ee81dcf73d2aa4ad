//! Looping video synchronization
//!
//! Each wrapper hosts several videos that must play in lockstep. Playback
//! starts only once every video has buffered enough, with a bounded fallback
//! timer that force-starts the group if one never does. A periodic resync
//! loop snaps any video drifting past the tolerance back to the master, and
//! when any video reaches its end the whole group restarts from zero.

use std::sync::{Arc, Mutex};

use passage_core::{EffectHandle, EffectUnit, SchedulerHandle, TaskId};
use passage_platform::{ElementId, EventKind, ListenTarget, ListenerId, Stage, StageEvent};

const INIT_MARK: &str = "video-sync-init";

/// Video synchronization tuning
#[derive(Clone, Debug)]
pub struct VideoSyncConfig {
    pub wrapper_selector: &'static str,
    pub video_selector: &'static str,
    /// Force-start after this long even if some videos never report ready
    pub max_wait_ms: f64,
    pub resync_interval_ms: f64,
    /// Drift beyond this many seconds snaps a video back to the master
    pub drift_tolerance_s: f64,
}

impl Default for VideoSyncConfig {
    fn default() -> Self {
        Self {
            wrapper_selector: ".loop-word_dragon-wrapper",
            video_selector: "video",
            max_wait_ms: 5000.0,
            resync_interval_ms: 100.0,
            drift_tolerance_s: 0.1,
        }
    }
}

struct SyncState {
    ready: usize,
    started: bool,
    resync_task: Option<TaskId>,
}

/// Synchronization for one wrapper's video group
struct WrapperSync {
    stage: Arc<dyn Stage>,
    scheduler: SchedulerHandle,
    videos: Vec<ElementId>,
    config: VideoSyncConfig,
    state: Mutex<SyncState>,
}

impl WrapperSync {
    fn new(
        stage: Arc<dyn Stage>,
        scheduler: SchedulerHandle,
        videos: Vec<ElementId>,
        config: VideoSyncConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            stage,
            scheduler,
            videos,
            config,
            state: Mutex::new(SyncState {
                ready: 0,
                started: false,
                resync_task: None,
            }),
        })
    }

    fn video_ready(self: &Arc<Self>) {
        let all_ready = {
            let mut state = self.state.lock().unwrap();
            state.ready += 1;
            state.ready >= self.videos.len()
        };
        if all_ready {
            self.start();
        }
    }

    /// Start the whole group from zero and begin the resync loop
    fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if state.started {
                return;
            }
            state.started = true;
        }
        for &video in &self.videos {
            self.stage.media_seek(video, 0.0);
            self.stage.media_play(video);
        }
        let sync = self.clone();
        let task = self
            .scheduler
            .every_ms(self.config.resync_interval_ms, move || sync.resync());
        self.state.lock().unwrap().resync_task = task;
        tracing::debug!(videos = self.videos.len(), "video group started");
    }

    /// Snap drifting videos back to the master's position
    fn resync(&self) {
        let master = self
            .videos
            .iter()
            .copied()
            .find(|&v| self.stage.media_ready(v))
            .or_else(|| self.videos.first().copied());
        let Some(master) = master else {
            return;
        };
        let master_time = self.stage.media_time(master);
        for &video in &self.videos {
            if video == master {
                continue;
            }
            let drift = (self.stage.media_time(video) - master_time).abs();
            if drift > self.config.drift_tolerance_s {
                self.stage.media_seek(video, master_time);
            }
        }
    }

    /// A video hit its end: restart the whole group together
    fn restart_loop(&self) {
        if !self.state.lock().unwrap().started {
            return;
        }
        for &video in &self.videos {
            self.stage.media_seek(video, 0.0);
        }
    }

    fn near_end(&self, video: ElementId, time: f64) -> bool {
        self.stage
            .media_duration(video)
            .is_some_and(|d| time >= d - self.config.drift_tolerance_s)
    }

    /// Stop the resync loop and park every video at zero
    fn stop(&self) {
        if let Some(task) = self.state.lock().unwrap().resync_task.take() {
            self.scheduler.cancel(task);
        }
        for &video in &self.videos {
            self.stage.media_pause(video);
            self.stage.media_seek(video, 0.0);
        }
    }
}

/// Build the video synchronization unit
pub fn video_sync_unit(name: &'static str, config: VideoSyncConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        let wrappers = ctx.stage.query(config.wrapper_selector);
        if wrappers.is_empty() {
            return None;
        }

        let mut groups: Vec<Arc<WrapperSync>> = Vec::new();
        let mut marked: Vec<ElementId> = Vec::new();
        let mut listeners: Vec<ListenerId> = Vec::new();
        let mut fallbacks: Vec<TaskId> = Vec::new();

        for wrapper in wrappers {
            if ctx.stage.is_marked(wrapper, INIT_MARK) {
                continue;
            }
            let videos = ctx.stage.query_within(wrapper, config.video_selector);
            if videos.is_empty() {
                continue;
            }
            ctx.stage.mark(wrapper, INIT_MARK);
            marked.push(wrapper);
            let sync = WrapperSync::new(
                ctx.stage.clone(),
                ctx.scheduler.clone(),
                videos.clone(),
                config.clone(),
            );

            for &video in &videos {
                // Park everything before the synchronized start
                ctx.stage.media_pause(video);
                ctx.stage.media_seek(video, 0.0);

                let ready_sync = sync.clone();
                listeners.push(ctx.stage.listen(
                    ListenTarget::Element(video),
                    EventKind::MediaReady,
                    Arc::new(move |_| ready_sync.video_ready()),
                ));
                let ended_sync = sync.clone();
                listeners.push(ctx.stage.listen(
                    ListenTarget::Element(video),
                    EventKind::MediaEnded,
                    Arc::new(move |_| ended_sync.restart_loop()),
                ));
                let tick_sync = sync.clone();
                listeners.push(ctx.stage.listen(
                    ListenTarget::Element(video),
                    EventKind::MediaTimeUpdate,
                    Arc::new(move |event: &StageEvent| {
                        if let StageEvent::MediaTimeUpdate { target, time } = event {
                            if tick_sync.near_end(*target, *time) {
                                tick_sync.restart_loop();
                            }
                        }
                    }),
                ));

                // Already buffered before we attached the listener
                if ctx.stage.media_ready(video) {
                    sync.video_ready();
                }
            }

            // Bounded wait: never hold the group hostage to one stalled video
            let fallback_sync = sync.clone();
            if let Some(task) = ctx
                .scheduler
                .after_ms(config.max_wait_ms, move || fallback_sync.start())
            {
                fallbacks.push(task);
            }
            groups.push(sync);
        }
        if groups.is_empty() {
            return None;
        }

        let stage = ctx.stage.clone();
        let scheduler = ctx.scheduler.clone();
        Some(EffectHandle::new(move || {
            for task in &fallbacks {
                scheduler.cancel(*task);
            }
            for id in &listeners {
                stage.unlisten(*id);
            }
            for group in &groups {
                group.stop();
            }
            for &wrapper in &marked {
                stage.unmark(wrapper, INIT_MARK);
            }
        }))
    })
}
