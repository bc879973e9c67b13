//! Tick delivery subsystem.
//!
//! The scheduler is clocked through the minimal [`TickSource`] capability
//! interface rather than any concrete timer. `SystemTicks` serves real-time
//! hosts, `ManualTicks` gives tests a hand-advanced clock, and `InertTicks`
//! covers headless environments where no tick can ever fire.

mod source;

pub use source::{InertTicks, ManualTicks, SystemTicks, TickHandle, TickSource};
