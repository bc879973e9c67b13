//! Scheduler driver and public control surface.
//!
//! [`FrameScheduler`] owns the declared phase list, the process registry, the
//! shared frame state, and the timing engine. [`FrameCtx`] is the buffered
//! command surface handed to every process invocation, so processes can
//! schedule, cancel, and control the loop without aliasing the scheduler.

mod config;
mod ctx;
mod driver;
mod error;

pub use config::SchedulerConfig;
pub use ctx::FrameCtx;
pub use driver::{FrameScheduler, TickOutcome};
pub use error::{ConfigError, ScheduleError};
