//! Cadence engine crate.
//!
//! A per-frame task scheduler: processes register against named phases and
//! run in declared phase order on every tick, with one-shot or recurring
//! execution, an optional fixed update rate, and pause/resume that excludes
//! paused time from delta math.

pub mod frame;
pub mod sched;
pub mod time;

pub mod logging;
mod phase;
