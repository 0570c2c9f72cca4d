//! # presence-engine
//!
//! The presence-lighting state machine: maps camera channels onto lights,
//! gates triggers by time-of-day windows, and keeps each light on a
//! debounced auto-off timer that re-triggering extends rather than stacks.
//!
//! The engine consumes [`isapi_stream::EventRecord`]s through the
//! [`isapi_stream::EventHandler`] seam and drives hardware only through the
//! [`light_control::LightDriver`] capability, so both ends are swappable in
//! tests.

mod engine;
mod error;
mod mapping;
mod timer;

pub use engine::PresenceEngine;
pub use error::{EngineError, Result};
pub use mapping::{ActiveWindow, ChannelGroup, LightMapping, LightRule};
pub use timer::{Scheduler, TimerHandle, TokioScheduler};
