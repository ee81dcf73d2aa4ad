//! Passage Effects
//!
//! The concrete effect units of the default site, built on the contracts in
//! `passage_core`: marquee carousels, the breakpoint-aware project slider,
//! pointer-driven cursors and tilts, looping video synchronization, and the
//! first-visit preloader. [`site::default_registry`] wires them to their
//! pages.
//!
//! Every unit follows the same shape: query the stage for its targets,
//! no-op silently when they are missing, and hand back an [`EffectHandle`]
//! that detaches every listener, cancels every timer, and removes every
//! node the setup created.
//!
//! [`EffectHandle`]: passage_core::EffectHandle

pub mod cursor_trail;
pub mod footer;
pub mod gradient;
pub mod heartbeat;
pub mod hover_cursor;
pub mod intro;
pub mod logo;
pub mod marquee;
pub mod site;
pub mod slider;
pub mod video_sync;

pub use cursor_trail::{cursor_trail_unit, TrailConfig};
pub use footer::{footer_tilt_unit, FooterTiltConfig};
pub use gradient::{gradient_unit, GradientConfig};
pub use heartbeat::{heartbeat_unit, HeartbeatConfig};
pub use hover_cursor::{hover_cursor_unit, HoverCursorConfig};
pub use intro::{intro_unit, IntroConfig};
pub use logo::{logo_rotate_unit, LogoConfig};
pub use marquee::{marquee_unit, MarqueeConfig};
pub use site::{default_registry, WORKS_MOUSE_SLOT};
pub use slider::{responsive_slider_unit, ResponsiveSliderConfig, SliderProfile};
pub use video_sync::{video_sync_unit, VideoSyncConfig};
