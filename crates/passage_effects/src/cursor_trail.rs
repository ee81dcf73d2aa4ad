//! Pointer-following particle trail
//!
//! Purely decorative: a chain of transient nodes where the head chases the
//! pointer and every particle chases its predecessor, all with the same lerp
//! factor. The nodes are created by the effect and removed by its handle;
//! nothing else on the page may touch them.

use std::sync::{Arc, Mutex};

use passage_core::{EffectHandle, EffectUnit};
use passage_platform::{EventKind, ListenTarget, Stage, StageEvent, StyleValue};

const INIT_MARK: &str = "cursor-trail-init";

/// Trail tuning
#[derive(Clone, Debug)]
pub struct TrailConfig {
    /// Element the transient particle nodes are parented to
    pub host_selector: &'static str,
    pub particle_count: usize,
    /// Lerp factor per frame for each link of the chain
    pub trail_speed: f32,
    pub particle_size: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            host_selector: ".page_wrapper",
            particle_count: 20,
            trail_speed: 0.4,
            particle_size: 10.0,
        }
    }
}

struct TrailState {
    cursor: (f32, f32),
    points: Vec<(f32, f32)>,
    initialized: bool,
}

/// Build the cursor trail unit (decorative, skipped under reduced motion)
pub fn cursor_trail_unit(name: &'static str, config: TrailConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx| {
        let host = ctx.stage.query_one(config.host_selector)?;
        if ctx.stage.is_marked(host, INIT_MARK) {
            return None;
        }
        ctx.stage.mark(host, INIT_MARK);

        let nodes: Vec<_> = (0..config.particle_count)
            .map(|_| ctx.stage.create_transient(host))
            .collect();
        for &node in &nodes {
            ctx.stage
                .set_style(node, "width", StyleValue::Number(config.particle_size));
            ctx.stage
                .set_style(node, "height", StyleValue::Number(config.particle_size));
        }

        let state = Arc::new(Mutex::new(TrailState {
            cursor: (0.0, 0.0),
            points: vec![(0.0, 0.0); config.particle_count],
            initialized: false,
        }));

        // The first pointer event snaps the whole chain onto the cursor
        let move_state = state.clone();
        let pointer_listener = ctx.stage.listen(
            ListenTarget::Window,
            EventKind::PointerMove,
            Arc::new(move |event: &StageEvent| {
                if let StageEvent::PointerMove { x, y } = event {
                    let mut s = move_state.lock().unwrap();
                    s.cursor = (*x, *y);
                    if !s.initialized {
                        s.initialized = true;
                        for point in s.points.iter_mut() {
                            *point = (*x, *y);
                        }
                    }
                }
            }),
        );

        let frame_stage = ctx.stage.clone();
        let frame_nodes = nodes.clone();
        let frame_state = state;
        let speed = config.trail_speed;
        let frame_task = ctx.scheduler.every_ms(1000.0 / 60.0, move || {
            let points: Vec<(f32, f32)> = {
                let mut s = frame_state.lock().unwrap();
                if !s.initialized {
                    return;
                }
                let mut chase = s.cursor;
                for point in s.points.iter_mut() {
                    point.0 += (chase.0 - point.0) * speed;
                    point.1 += (chase.1 - point.1) * speed;
                    chase = *point;
                }
                s.points.clone()
            };
            for (&node, &(x, y)) in frame_nodes.iter().zip(points.iter()) {
                frame_stage.set_style(node, "left", StyleValue::Number(x));
                frame_stage.set_style(node, "top", StyleValue::Number(y));
            }
        });

        let stage = ctx.stage.clone();
        let scheduler = ctx.scheduler.clone();
        Some(EffectHandle::new(move || {
            stage.unlisten(pointer_listener);
            if let Some(task) = frame_task {
                scheduler.cancel(task);
            }
            for &node in &nodes {
                stage.remove_transient(node);
            }
            stage.unmark(host, INIT_MARK);
        }))
    })
    .decorative()
}
