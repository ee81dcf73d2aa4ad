//! Passage Core
//!
//! Lifecycle coordination for page-transition sites:
//!
//! - **Transition Coordinator**: drives teardown / leave / swap / enter /
//!   setup for every navigation, with no leaked handles and no double-init
//! - **Named Effect Slots**: at most one live handle per effect kind
//! - **Namespace Registry**: declarative page-to-effects mapping
//! - **Frame Scheduler**: the single deferred-execution primitive
//! - **Visit Store**: the persisted first-visit marker behind the one-time
//!   intro sequence
//! - **Engine contracts**: tween and carousel backends as trait objects,
//!   with headless implementations for renderer-free testing
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use passage_core::{
//!     EffectHandle, EffectUnit, FrameScheduler, InstantTweens, NamespaceInfo,
//!     NamespaceRegistry, RecordingCarousels, TransitionCoordinator, TransitionHooks,
//! };
//! use passage_platform::MemoryStage;
//!
//! let stage = Arc::new(MemoryStage::new());
//! let scheduler = FrameScheduler::new();
//! let registry = NamespaceRegistry::builder()
//!     .on_enter("home", EffectUnit::new("hello", |_| Some(EffectHandle::noop())))
//!     .build();
//!
//! let coordinator = TransitionCoordinator::builder(
//!     stage.clone(),
//!     Arc::new(InstantTweens::new(stage.clone())),
//!     Arc::new(RecordingCarousels::new()),
//!     scheduler.handle(),
//!     registry,
//! )
//! .build();
//!
//! let container = stage.add_element(&["[data-container]"]);
//! coordinator.once(&NamespaceInfo::new("home", container));
//! assert!(coordinator.is_slot_live("hello"));
//! ```

pub mod carousel;
pub mod coordinator;
pub mod effect;
pub mod handle;
pub mod registry;
pub mod scheduler;
pub mod services;
pub mod slots;
pub mod tween;
pub mod visit;

pub use carousel::{
    CarouselBackend, CarouselConfig, CarouselError, CarouselId, RecordingCarousels, SlidesPerView,
};
pub use coordinator::{
    EngineConfig, NamespaceInfo, Phase, TransitionCoordinator, TransitionHooks, TransitionStyle,
};
pub use effect::{EffectContext, EffectUnit};
pub use handle::{run_isolated, EffectHandle};
pub use registry::{Namespace, NamespaceRegistry, RegistryBuilder, RestoreRule};
pub use scheduler::{FrameScheduler, SchedulerHandle, TaskId};
pub use services::{NoopPageEnhancer, NoopScrollGeometry, PageEnhancer, ScrollGeometry};
pub use slots::{EffectSlots, SlotKey};
pub use tween::{
    AnimationTicket, Ease, InstantTweens, PropTween, TweenBackend, TweenId, TweenSpec,
};
pub use visit::{VisitStore, FIRST_VISIT_KEY, RETENTION_WINDOW_MS};
