//! Frame scheduler
//!
//! The single deferred-execution primitive of the framework. Everything that
//! used to be ad-hoc "wait a frame, then wait another frame" or bare timeout
//! sequencing goes through here, so the ordering contract is testable by
//! ticking the scheduler by hand instead of running a real renderer.
//!
//! The scheduler is driven by the host: call [`FrameScheduler::tick`] once
//! per visual frame with the elapsed time. Components hold a weak
//! [`SchedulerHandle`] that won't keep the scheduler alive.

use slotmap::SlotMap;
use std::sync::{Arc, Mutex, Weak};

slotmap::new_key_type! {
    /// Handle to a scheduled task
    pub struct TaskId;
}

enum TaskKind {
    /// Fire after N ticks
    Frames(u32),
    /// Fire once after a delay
    Timer { remaining_ms: f64 },
    /// Fire repeatedly at an interval
    Interval { interval_ms: f64, elapsed_ms: f64 },
}

enum TaskAction {
    Once(Option<Box<dyn FnOnce() + Send>>),
    Repeat(Option<Box<dyn FnMut() + Send>>),
}

struct Task {
    kind: TaskKind,
    action: TaskAction,
}

struct SchedulerInner {
    tasks: SlotMap<TaskId, Task>,
}

/// The frame scheduler driven by the host's frame loop
pub struct FrameScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                tasks: SlotMap::with_key(),
            })),
        }
    }

    /// Get a weak handle for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of tasks currently scheduled
    pub fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().tasks.len()
    }

    /// Advance one frame
    ///
    /// Due callbacks run outside the internal lock, so they may freely
    /// schedule or cancel further tasks.
    pub fn tick(&self, dt_ms: f64) {
        enum Due {
            Once(TaskId, Box<dyn FnOnce() + Send>),
            Repeat(TaskId, Box<dyn FnMut() + Send>),
        }

        let due: Vec<Due> = {
            let mut inner = self.inner.lock().unwrap();
            let ids: Vec<TaskId> = inner.tasks.keys().collect();
            let mut due = Vec::new();
            for id in ids {
                let fire = {
                    let Some(task) = inner.tasks.get_mut(id) else {
                        continue;
                    };
                    match &mut task.kind {
                        TaskKind::Frames(n) => {
                            *n = n.saturating_sub(1);
                            *n == 0
                        }
                        TaskKind::Timer { remaining_ms } => {
                            *remaining_ms -= dt_ms;
                            *remaining_ms <= 0.0
                        }
                        TaskKind::Interval {
                            interval_ms,
                            elapsed_ms,
                        } => {
                            *elapsed_ms += dt_ms;
                            if *elapsed_ms >= *interval_ms {
                                *elapsed_ms -= *interval_ms;
                                true
                            } else {
                                false
                            }
                        }
                    }
                };
                if !fire {
                    continue;
                }
                let repeating = matches!(
                    inner.tasks.get(id).map(|t| &t.action),
                    Some(TaskAction::Repeat(_))
                );
                if repeating {
                    if let Some(TaskAction::Repeat(slot)) =
                        inner.tasks.get_mut(id).map(|t| &mut t.action)
                    {
                        if let Some(callback) = slot.take() {
                            due.push(Due::Repeat(id, callback));
                        }
                    }
                } else if let Some(task) = inner.tasks.remove(id) {
                    if let TaskAction::Once(Some(callback)) = task.action {
                        due.push(Due::Once(id, callback));
                    }
                }
            }
            due
        };

        for entry in due {
            match entry {
                Due::Once(_, callback) => callback(),
                Due::Repeat(id, mut callback) => {
                    callback();
                    // Hand the callback back unless the task was cancelled
                    // from within its own invocation.
                    let mut inner = self.inner.lock().unwrap();
                    if let Some(TaskAction::Repeat(slot)) =
                        inner.tasks.get_mut(id).map(|t| &mut t.action)
                    {
                        *slot = Some(callback);
                    }
                }
            }
        }
    }

    /// Tick N frames at a nominal 60fps step (test convenience)
    pub fn run_frames(&self, frames: u32) {
        for _ in 0..frames {
            self.tick(1000.0 / 60.0);
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the frame scheduler
///
/// Scheduling through a dead scheduler is a silent no-op returning `None`,
/// mirroring how effects behave once the page that owned them is gone.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Run a callback on the next frame
    pub fn next_frame(&self, f: impl FnOnce() + Send + 'static) -> Option<TaskId> {
        self.after_frames(1, f)
    }

    /// Run a callback after N frames
    pub fn after_frames(&self, frames: u32, f: impl FnOnce() + Send + 'static) -> Option<TaskId> {
        self.inner.upgrade().map(|inner| {
            inner.lock().unwrap().tasks.insert(Task {
                kind: TaskKind::Frames(frames.max(1)),
                action: TaskAction::Once(Some(Box::new(f))),
            })
        })
    }

    /// Run a callback once after a delay in milliseconds
    pub fn after_ms(&self, delay_ms: f64, f: impl FnOnce() + Send + 'static) -> Option<TaskId> {
        self.inner.upgrade().map(|inner| {
            inner.lock().unwrap().tasks.insert(Task {
                kind: TaskKind::Timer {
                    remaining_ms: delay_ms,
                },
                action: TaskAction::Once(Some(Box::new(f))),
            })
        })
    }

    /// Run a callback repeatedly at an interval in milliseconds
    pub fn every_ms(&self, interval_ms: f64, f: impl FnMut() + Send + 'static) -> Option<TaskId> {
        self.inner.upgrade().map(|inner| {
            inner.lock().unwrap().tasks.insert(Task {
                kind: TaskKind::Interval {
                    interval_ms,
                    elapsed_ms: 0.0,
                },
                action: TaskAction::Repeat(Some(Box::new(f))),
            })
        })
    }

    /// Cancel a scheduled task (no-op if already fired or cancelled)
    pub fn cancel(&self, id: TaskId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().unwrap().tasks.remove(id);
        }
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
