//! Default site wiring
//!
//! The declarative table tying every effect unit to the pages it belongs
//! to. Adding an effect to a page is an edit here, not a new branch in any
//! dispatcher.

use passage_core::{EffectUnit, NamespaceRegistry};
use passage_platform::{Stage, StyleValue};

use crate::cursor_trail::{cursor_trail_unit, TrailConfig};
use crate::footer::{footer_tilt_unit, FooterTiltConfig};
use crate::gradient::{gradient_unit, GradientConfig};
use crate::heartbeat::{heartbeat_unit, HeartbeatConfig};
use crate::hover_cursor::{hover_cursor_unit, HoverCursorConfig};
use crate::intro::{intro_unit, IntroConfig};
use crate::logo::{logo_rotate_unit, LogoConfig};
use crate::marquee::{marquee_unit, MarqueeConfig};
use crate::slider::{responsive_slider_unit, ResponsiveSliderConfig};
use crate::video_sync::{video_sync_unit, VideoSyncConfig};

/// Slot for the works hover cursor, shared with the PreEnter hygiene pass
pub const WORKS_MOUSE_SLOT: &str = "worksMouse";

/// Reset the shared nav to its default presentation
///
/// The works page hides the native cursor over the nav; entering any other
/// namespace must restore the default, because the previous namespace is
/// unknown at that point.
fn nav_restore_unit() -> EffectUnit {
    EffectUnit::new("navRestore", |ctx| {
        if let Some(nav) = ctx.stage.query_one(".nav_component") {
            ctx.stage.clear_styles(nav);
            ctx.stage.set_style(nav, "cursor", StyleValue::Text("auto".into()));
        }
        None
    })
}

/// The full effect wiring for the default site
pub fn default_registry() -> NamespaceRegistry {
    NamespaceRegistry::builder()
        // Every navigation, regardless of destination
        .global(marquee_unit("loopWordMarquee", MarqueeConfig::default()))
        .global(video_sync_unit("videoSync", VideoSyncConfig::default()))
        .global(logo_rotate_unit("logoRotate", LogoConfig::default()))
        .global(footer_tilt_unit("footerTilt", FooterTiltConfig::default()))
        .global(heartbeat_unit("heartBeat", HeartbeatConfig::default()))
        // Per-page effect sets
        .on_enter("home", cursor_trail_unit("rainbowTrail", TrailConfig::default()))
        .on_enter(
            "home",
            marquee_unit(
                "studiosMarquee",
                MarqueeConfig {
                    root_selector: ".swiper.is-studios-loop",
                    ..MarqueeConfig::default()
                },
            ),
        )
        .on_enter("network", gradient_unit("networkGradient", GradientConfig::default()))
        .namespace("skills")
        .on_enter(
            "works",
            hover_cursor_unit("worksMouse", HoverCursorConfig::default())
                .with_slot(WORKS_MOUSE_SLOT),
        )
        .on_enter(
            "works",
            responsive_slider_unit("otherProjects", ResponsiveSliderConfig::default()),
        )
        // Shared-state hygiene and the one-time intro
        .restore_unless("works", nav_restore_unit())
        .intro(intro_unit("preloader", IntroConfig::default()))
        .build()
}
