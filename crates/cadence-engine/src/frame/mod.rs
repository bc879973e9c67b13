//! Frame state and process primitives.
//!
//! One `FrameState` instance exists per scheduler. The driver is its only
//! writer and every process reads it through a shared reference, so all
//! callbacks within a tick observe the same snapshot.

mod process;
mod state;

pub use process::{Process, ProcessHandle, ScheduleOptions};
pub use state::FrameState;
