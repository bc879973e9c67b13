use crate::sched::FrameCtx;

use super::FrameState;

/// Boxed unit of work invoked during its phase's drain.
///
/// The [`FrameCtx`] parameter is the re-entrant control surface; calls made
/// through it are buffered and applied once the process returns.
pub type Process = Box<dyn FnMut(&FrameState, &mut FrameCtx<'_>)>;

/// Opaque registration key returned by the scheduler.
///
/// Ids are monotonic and never reused within a scheduler's lifetime, so a
/// stale handle cancels nothing instead of hitting an unrelated process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProcessHandle(u64);

impl ProcessHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Per-registration options.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// Re-arm the process for the next tick every time it finishes, until it
    /// is canceled.
    pub recurring: bool,

    /// If the target phase is draining when the registration is applied,
    /// append to the buffer being drained so the process executes before that
    /// drain completes. Otherwise the process waits for the phase's next
    /// drain as usual.
    pub immediate: bool,
}
