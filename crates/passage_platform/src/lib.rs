//! Passage Platform
//!
//! Host abstraction for the Passage transition framework: the element stage
//! effects run against, listener plumbing, and persisted key-value storage.
//!
//! The real page (markup, styling, media decoding) is externally owned; this
//! crate only defines the contracts Passage consumes, plus complete in-memory
//! implementations so the whole lifecycle is testable without a renderer.

pub mod event;
pub mod memory;
pub mod stage;
pub mod store;

pub use event::{EventKind, ListenTarget, ListenerCallback, ListenerId, StageEvent};
pub use memory::MemoryStage;
pub use stage::{ElementId, Stage, StyleValue};
pub use store::{KeyValueStore, MemoryStore, StoreError};
