//! End-to-end lifecycle tests driven by a scripted transition engine
//!
//! The "engine" here is the test itself: it invokes the coordinator's hooks
//! in the order the real transition engine guarantees, awaits the returned
//! tickets, and ticks the frame scheduler by hand.

use std::sync::{Arc, Mutex};

use passage_core::{
    CarouselBackend, CarouselConfig, EffectHandle, EffectUnit, FrameScheduler, InstantTweens,
    NamespaceInfo, NamespaceRegistry, Phase, RecordingCarousels, TransitionCoordinator,
    TransitionHooks, VisitStore,
};
use passage_platform::{MemoryStage, MemoryStore, Stage};

type Log = Arc<Mutex<Vec<String>>>;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn logging_unit(name: &'static str, log: &Log, with_teardown: bool) -> EffectUnit {
    let log = log.clone();
    EffectUnit::new(name, move |_| {
        log.lock().unwrap().push(format!("{name}-setup"));
        if with_teardown {
            let log = log.clone();
            Some(EffectHandle::new(move || {
                log.lock().unwrap().push(format!("{name}-teardown"));
            }))
        } else {
            None
        }
    })
}

struct Harness {
    stage: Arc<MemoryStage>,
    tweens: Arc<InstantTweens>,
    carousels: Arc<RecordingCarousels>,
    scheduler: FrameScheduler,
    coordinator: TransitionCoordinator,
}

impl Harness {
    fn new(registry: NamespaceRegistry) -> Self {
        Self::with_visits(registry, None)
    }

    fn with_visits(registry: NamespaceRegistry, visits: Option<VisitStore>) -> Self {
        init_logging();
        let stage = Arc::new(MemoryStage::new());
        let tweens = Arc::new(InstantTweens::new(stage.clone()));
        let carousels = Arc::new(RecordingCarousels::new());
        let scheduler = FrameScheduler::new();

        let mut builder = TransitionCoordinator::builder(
            stage.clone(),
            tweens.clone(),
            carousels.clone(),
            scheduler.handle(),
            registry,
        );
        if let Some(visits) = visits {
            builder = builder.visit_store(visits);
        }
        let coordinator = builder.build();

        Self {
            stage,
            tweens,
            carousels,
            scheduler,
            coordinator,
        }
    }

    /// Drive one full navigation the way the transition engine would
    fn navigate(&self, outgoing: passage_platform::ElementId, next: &NamespaceInfo) {
        self.coordinator.before_leave();
        let leave = self.coordinator.leave(outgoing);
        assert!(leave.is_complete());
        // The engine swaps DOM content here, then resolves the namespace.
        self.coordinator.before_enter(next);
        let enter = self.coordinator.enter(next.container);
        assert!(enter.is_complete());
        self.coordinator.after_enter(next);
        self.scheduler.run_frames(2);
    }
}

#[test]
fn phase_order_end_to_end() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let registry = NamespaceRegistry::builder()
        .global(logging_unit("global", &log, false))
        .on_enter("a", logging_unit("a-effect", &log, true))
        .on_enter("b", logging_unit("b-effect", &log, true))
        .build();
    let harness = Harness::new(registry);

    let container_a = harness.stage.add_element(&["[data-container=a]"]);
    let container_b = harness.stage.add_element(&["[data-container=b]"]);

    harness
        .coordinator
        .once(&NamespaceInfo::new("a", container_a));
    log.lock().unwrap().clear();

    // Record leave completion between the teardown and the incoming setup
    harness.coordinator.before_leave();
    let leave = harness.coordinator.leave(container_a);
    assert!(leave.is_complete());
    log.lock().unwrap().push("leave-complete".into());

    let next = NamespaceInfo::new("b", container_b);
    harness.coordinator.before_enter(&next);
    let enter = harness.coordinator.enter(container_b);
    assert!(enter.is_complete());
    harness.coordinator.after_enter(&next);

    // Settled is deferred across two frames; nothing runs before them
    assert!(!log.lock().unwrap().iter().any(|t| t.contains("setup")));
    harness.scheduler.run_frames(2);

    let recorded = log.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            "a-effect-teardown",
            "leave-complete",
            "global-setup",
            "b-effect-setup",
        ]
    );
    assert_eq!(harness.coordinator.phase(), Phase::Settled);
    assert!(harness.coordinator.is_slot_live("b-effect"));
    assert!(!harness.coordinator.is_slot_live("a-effect"));
}

#[test]
fn settled_waits_for_both_deferred_frames() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = NamespaceRegistry::builder()
        .on_enter("b", logging_unit("b-effect", &log, false))
        .build();
    let harness = Harness::new(registry);

    let a = harness.stage.add_element(&["[data-container=a]"]);
    let b = harness.stage.add_element(&["[data-container=b]"]);
    harness.coordinator.once(&NamespaceInfo::new("a", a));

    let next = NamespaceInfo::new("b", b);
    harness.coordinator.before_leave();
    harness.coordinator.leave(a);
    harness.coordinator.before_enter(&next);
    harness.coordinator.enter(b);
    harness.coordinator.after_enter(&next);

    harness.scheduler.run_frames(1);
    assert!(log.lock().unwrap().is_empty());
    harness.scheduler.run_frames(1);
    assert_eq!(log.lock().unwrap().as_slice(), ["b-effect-setup"]);
}

#[test]
fn isolation_a_failing_unit_does_not_block_siblings() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = NamespaceRegistry::builder()
        .on_enter("home", EffectUnit::new("broken", |_| panic!("setup failure")))
        .on_enter("home", logging_unit("healthy", &log, true))
        .build();
    let harness = Harness::new(registry);

    let container = harness.stage.add_element(&["[data-container]"]);
    harness
        .coordinator
        .once(&NamespaceInfo::new("home", container));

    assert_eq!(log.lock().unwrap().as_slice(), ["healthy-setup"]);
    assert!(harness.coordinator.is_slot_live("healthy"));
    assert!(!harness.coordinator.is_slot_live("broken"));
}

#[test]
fn global_teardown_is_idempotent() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = NamespaceRegistry::builder()
        .on_enter("a", logging_unit("a-effect", &log, true))
        .build();
    let harness = Harness::new(registry);

    let a = harness.stage.add_element(&["[data-container=a]"]);
    harness.coordinator.once(&NamespaceInfo::new("a", a));

    harness.coordinator.before_leave();
    harness.coordinator.before_leave(); // engine bug: duplicate hook

    let teardowns = log
        .lock()
        .unwrap()
        .iter()
        .filter(|t| t.ends_with("teardown"))
        .count();
    assert_eq!(teardowns, 1);
}

#[test]
fn carousel_disposal_failure_does_not_block_siblings() {
    let registry = NamespaceRegistry::builder().build();
    let harness = Harness::new(registry);

    let root_a = harness.stage.add_element(&[".swiper"]);
    let root_b = harness.stage.add_element(&[".swiper"]);
    let bad = harness
        .carousels
        .create(root_a, CarouselConfig::default())
        .unwrap();
    harness
        .carousels
        .create(root_b, CarouselConfig::default())
        .unwrap();
    harness.carousels.fail_destroy_of(bad);

    harness.coordinator.before_leave();
    assert_eq!(harness.carousels.live_count(), 0);
}

#[test]
fn restore_rules_skip_the_owning_namespace() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = NamespaceRegistry::builder()
        .namespace("works")
        .namespace("home")
        .restore_unless("works", logging_unit("nav-restore", &log, false))
        .build();
    let harness = Harness::new(registry);

    let a = harness.stage.add_element(&["[data-container=a]"]);
    let b = harness.stage.add_element(&["[data-container=b]"]);
    harness.coordinator.once(&NamespaceInfo::new("home", a));
    log.lock().unwrap().clear();

    // Entering the owner: no restore
    harness.navigate(a, &NamespaceInfo::new("works", b));
    assert!(log.lock().unwrap().is_empty());

    // Entering anyone else: restore runs
    harness.navigate(b, &NamespaceInfo::new("home", a));
    assert_eq!(log.lock().unwrap().as_slice(), ["nav-restore-setup"]);
}

#[test]
fn undeclared_slots_are_cleared_on_enter() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = NamespaceRegistry::builder()
        .on_enter("works", logging_unit("works-mouse", &log, true))
        .namespace("home")
        .build();
    let harness = Harness::new(registry);

    let works = harness.stage.add_element(&["[data-container=works]"]);
    let home = harness.stage.add_element(&["[data-container=home]"]);
    harness.coordinator.once(&NamespaceInfo::new("works", works));
    assert!(harness.coordinator.is_slot_live("works-mouse"));

    // PreEnter alone must already drop the undeclared slot, even if a
    // PreLeave never ran (initial-load leftovers).
    harness
        .coordinator
        .before_enter(&NamespaceInfo::new("home", home));
    assert!(!harness.coordinator.is_slot_live("works-mouse"));
    assert_eq!(
        log.lock().unwrap().as_slice(),
        ["works-mouse-setup", "works-mouse-teardown"]
    );
}

#[test]
fn stale_settle_after_new_navigation_is_ignored() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = NamespaceRegistry::builder()
        .on_enter("b", logging_unit("b-effect", &log, false))
        .build();
    let harness = Harness::new(registry);

    let a = harness.stage.add_element(&["[data-container=a]"]);
    let b = harness.stage.add_element(&["[data-container=b]"]);
    harness.coordinator.once(&NamespaceInfo::new("a", a));

    let next = NamespaceInfo::new("b", b);
    harness.coordinator.before_leave();
    harness.coordinator.leave(a);
    harness.coordinator.before_enter(&next);
    harness.coordinator.enter(b);
    harness.coordinator.after_enter(&next);

    // A new navigation begins before the deferred Settled fires
    harness.coordinator.before_leave();
    harness.scheduler.run_frames(2);

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(harness.coordinator.phase(), Phase::Leaving);
}

#[test]
fn settled_resets_scroll_position() {
    let registry = NamespaceRegistry::builder().namespace("home").build();
    let harness = Harness::new(registry);

    let a = harness.stage.add_element(&["[data-container=a]"]);
    let b = harness.stage.add_element(&["[data-container=b]"]);
    harness.coordinator.once(&NamespaceInfo::new("home", a));

    harness.stage.set_scroll_offset(1200.0);
    harness.navigate(a, &NamespaceInfo::new("home", b));
    assert_eq!(harness.stage.scroll_offset(), 0.0);
}

#[test]
fn transition_animations_reset_inline_state() {
    let registry = NamespaceRegistry::builder().namespace("home").build();
    let harness = Harness::new(registry);

    let a = harness.stage.add_element(&["[data-container=a]"]);
    let b = harness.stage.add_element(&["[data-container=b]"]);
    harness.coordinator.once(&NamespaceInfo::new("home", a));
    harness.navigate(a, &NamespaceInfo::new("home", b));

    // clear_after wipes both containers' inline styles once tweens finish
    assert_eq!(harness.stage.style_count(a), 0);
    assert_eq!(harness.stage.style_count(b), 0);
    assert_eq!(harness.tweens.animations_for(a), 1);
    assert_eq!(harness.tweens.animations_for(b), 1);
}

#[test]
fn missing_target_unit_attaches_nothing() {
    let registry = NamespaceRegistry::builder()
        .on_enter(
            "home",
            EffectUnit::new("needs-target", |ctx| {
                let _el = ctx.stage.query_one(".does-not-exist")?;
                unreachable!("setup must not proceed without its target");
            }),
        )
        .build();
    let harness = Harness::new(registry);

    let container = harness.stage.add_element(&["[data-container]"]);
    let before = harness.stage.listener_count();
    harness
        .coordinator
        .once(&NamespaceInfo::new("home", container));

    assert_eq!(harness.stage.listener_count(), before);
    assert!(!harness.coordinator.is_slot_live("needs-target"));
}

#[test]
fn intro_runs_on_first_visit_only() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let backing = Arc::new(MemoryStore::new());

    let build = |log: &Log, backing: &Arc<MemoryStore>| {
        let registry = NamespaceRegistry::builder()
            .namespace("home")
            .intro(logging_unit("intro", log, false))
            .build();
        Harness::with_visits(registry, Some(VisitStore::new(backing.clone())))
    };

    // First load: intro runs and the visit is recorded
    let harness = build(&log, &backing);
    let container = harness.stage.add_element(&["[data-container]"]);
    harness
        .coordinator
        .once(&NamespaceInfo::new("home", container));
    assert_eq!(log.lock().unwrap().as_slice(), ["intro-setup"]);

    // Second load within the retention window: intro skipped
    log.lock().unwrap().clear();
    let harness = build(&log, &backing);
    let container = harness.stage.add_element(&["[data-container]"]);
    harness
        .coordinator
        .once(&NamespaceInfo::new("home", container));
    assert!(log.lock().unwrap().is_empty());
}
