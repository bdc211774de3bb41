//! Service wiring and the per-frame tick.
//!
//! The engine owns no globals: every service is created here and handed to
//! its dependents explicitly, so several engines can coexist (tests do).

mod engine;

pub use engine::{Engine, EngineConfig, EngineTick};
