//! Custom cursor for the works listing
//!
//! Replaces the native cursor with a floating component that trails the
//! pointer with lerp smoothing, expands over collection items, and hides
//! itself over the footer and the shared nav. Active only on wide
//! viewports; a resize listener activates and deactivates the whole thing
//! as the breakpoint is crossed.

use std::sync::{Arc, Mutex};

use passage_core::{EffectContext, EffectHandle, EffectUnit, SchedulerHandle, TaskId};
use passage_platform::{
    ElementId, EventKind, ListenTarget, ListenerId, Stage, StageEvent, StyleValue,
};

const INIT_MARK: &str = "works-mouse-init";

/// Hover cursor tuning
#[derive(Clone, Debug)]
pub struct HoverCursorConfig {
    pub component_selector: &'static str,
    pub item_selector: &'static str,
    pub nav_selector: &'static str,
    pub footer_selector: &'static str,
    pub text_selector: &'static str,
    pub icon_selector: &'static str,
    /// Minimum viewport width for the custom cursor
    pub breakpoint_px: f32,
    /// Lerp factor per frame
    pub follow_factor: f32,
    pub expanded_width: &'static str,
    pub rest_width: &'static str,
}

impl Default for HoverCursorConfig {
    fn default() -> Self {
        Self {
            component_selector: ".works-mouse_component",
            item_selector: ".works_collection-item",
            nav_selector: ".nav_component",
            footer_selector: ".section_footer",
            text_selector: ".works-mouse_text-wrapper",
            icon_selector: ".works-mouse_icon",
            breakpoint_px: 992.0,
            follow_factor: 0.15,
            expanded_width: "8rem",
            rest_width: "2.5rem",
        }
    }
}

struct Follow {
    mouse: (f32, f32),
    current: (f32, f32),
}

/// Everything attached while the cursor is active on a wide viewport
struct ActiveCursor {
    listeners: Vec<ListenerId>,
    frame_task: Option<TaskId>,
}

fn activate(
    stage: &Arc<dyn Stage>,
    scheduler: &SchedulerHandle,
    component: ElementId,
    config: &HoverCursorConfig,
) -> ActiveCursor {
    let follow = Arc::new(Mutex::new(Follow {
        mouse: (stage.viewport_width() / 2.0, stage.viewport_height() / 2.0),
        current: (stage.viewport_width() / 2.0, stage.viewport_height() / 2.0),
    }));

    stage.set_style(component, "position", "fixed".into());
    stage.set_style(component, "pointer-events", "none".into());
    stage.set_style(component, "opacity", StyleValue::Number(1.0));
    stage.set_style(component, "width", config.rest_width.into());
    if let Some(text) = stage.query_one(config.text_selector) {
        stage.set_style(text, "width", StyleValue::Number(0.0));
    }

    let mut listeners = Vec::new();

    // Pointer tracking
    let track_follow = follow.clone();
    let track_stage = stage.clone();
    listeners.push(stage.listen(
        ListenTarget::Window,
        EventKind::PointerMove,
        Arc::new(move |event: &StageEvent| {
            if let StageEvent::PointerMove { x, y } = event {
                track_follow.lock().unwrap().mouse = (*x, *y);
                track_stage.set_style(component, "opacity", StyleValue::Number(1.0));
            }
        }),
    ));

    // Hide over the footer and the nav, where the native cursor returns
    for hide_selector in [config.footer_selector, config.nav_selector] {
        let Some(region) = stage.query_one(hide_selector) else {
            continue;
        };
        let enter_stage = stage.clone();
        listeners.push(stage.listen(
            ListenTarget::Element(region),
            EventKind::PointerEnter,
            Arc::new(move |_| {
                enter_stage.set_style(component, "opacity", StyleValue::Number(0.0));
            }),
        ));
        let leave_stage = stage.clone();
        listeners.push(stage.listen(
            ListenTarget::Element(region),
            EventKind::PointerLeave,
            Arc::new(move |_| {
                leave_stage.set_style(component, "opacity", StyleValue::Number(1.0));
            }),
        ));
    }

    // Expand over collection items
    let text = stage.query_one(config.text_selector);
    let icon = stage.query_one(config.icon_selector);
    let expanded_width = config.expanded_width;
    let rest_width = config.rest_width;
    for item in stage.query(config.item_selector) {
        let enter_stage = stage.clone();
        listeners.push(stage.listen(
            ListenTarget::Element(item),
            EventKind::PointerEnter,
            Arc::new(move |_| {
                enter_stage.set_style(component, "width", expanded_width.into());
                if let Some(text) = text {
                    enter_stage.set_style(text, "width", "100%".into());
                }
                if let Some(icon) = icon {
                    enter_stage.set_style(icon, "rotation", StyleValue::Number(360.0));
                }
            }),
        ));
        let leave_stage = stage.clone();
        listeners.push(stage.listen(
            ListenTarget::Element(item),
            EventKind::PointerLeave,
            Arc::new(move |_| {
                leave_stage.set_style(component, "width", rest_width.into());
                if let Some(text) = text {
                    leave_stage.set_style(text, "width", StyleValue::Number(0.0));
                }
                if let Some(icon) = icon {
                    leave_stage.set_style(icon, "rotation", StyleValue::Number(0.0));
                }
            }),
        ));
    }

    // Per-frame lerp follow, centered on the component
    let frame_follow = follow;
    let frame_stage = stage.clone();
    let factor = config.follow_factor;
    let frame_task = scheduler.every_ms(1000.0 / 60.0, move || {
        let (x, y) = {
            let mut f = frame_follow.lock().unwrap();
            f.current.0 += (f.mouse.0 - f.current.0) * factor;
            f.current.1 += (f.mouse.1 - f.current.1) * factor;
            f.current
        };
        let half = frame_stage.element_width(component) / 2.0;
        frame_stage.set_style(component, "left", StyleValue::Number(x - half));
        frame_stage.set_style(component, "top", StyleValue::Number(y - half));
    });

    ActiveCursor {
        listeners,
        frame_task,
    }
}

fn deactivate(
    stage: &Arc<dyn Stage>,
    scheduler: &SchedulerHandle,
    component: ElementId,
    active: ActiveCursor,
) {
    for id in active.listeners {
        stage.unlisten(id);
    }
    if let Some(task) = active.frame_task {
        scheduler.cancel(task);
    }
    stage.clear_styles(component);
    stage.set_style(component, "opacity", StyleValue::Number(0.0));
}

fn check_breakpoint(
    ctx_stage: &Arc<dyn Stage>,
    scheduler: &SchedulerHandle,
    component: ElementId,
    config: &HoverCursorConfig,
    state: &Mutex<Option<ActiveCursor>>,
    viewport_width: f32,
) {
    let should_be_active = viewport_width >= config.breakpoint_px;
    let mut slot = state.lock().unwrap();
    match (&*slot, should_be_active) {
        (None, true) => {
            *slot = Some(activate(ctx_stage, scheduler, component, config));
        }
        (Some(_), false) => {
            if let Some(active) = slot.take() {
                deactivate(ctx_stage, scheduler, component, active);
            }
        }
        _ => {}
    }
}

/// Build the hover cursor unit
pub fn hover_cursor_unit(name: &'static str, config: HoverCursorConfig) -> EffectUnit {
    EffectUnit::new(name, move |ctx: &EffectContext| {
        let component = ctx.stage.query_one(config.component_selector)?;
        if ctx.stage.is_marked(component, INIT_MARK) {
            return None;
        }
        ctx.stage.mark(component, INIT_MARK);

        let state: Arc<Mutex<Option<ActiveCursor>>> = Arc::new(Mutex::new(None));
        check_breakpoint(
            &ctx.stage,
            &ctx.scheduler,
            component,
            &config,
            &state,
            ctx.stage.viewport_width(),
        );

        let resize_stage = ctx.stage.clone();
        let resize_scheduler = ctx.scheduler.clone();
        let resize_state = state.clone();
        let resize_config = config.clone();
        let resize_listener = ctx.stage.listen(
            ListenTarget::Window,
            EventKind::Resize,
            Arc::new(move |event: &StageEvent| {
                if let StageEvent::Resize { width, .. } = event {
                    check_breakpoint(
                        &resize_stage,
                        &resize_scheduler,
                        component,
                        &resize_config,
                        &resize_state,
                        *width,
                    );
                }
            }),
        );

        let stage = ctx.stage.clone();
        let scheduler = ctx.scheduler.clone();
        Some(EffectHandle::new(move || {
            stage.unlisten(resize_listener);
            if let Some(active) = state.lock().unwrap().take() {
                deactivate(&stage, &scheduler, component, active);
            }
            stage.unmark(component, INIT_MARK);
        }))
    })
}
