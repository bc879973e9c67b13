/// Shared per-tick timing snapshot.
///
/// The scheduler rewrites this at the start of every tick and passes it by
/// shared reference to each process. It is never reallocated mid-tick.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameState {
    /// Elapsed simulated time for this tick, in milliseconds.
    pub delta: f64,

    /// Absolute simulated time of this tick, in milliseconds.
    ///
    /// Monotonically non-decreasing while unpaused; paused duration is
    /// excluded.
    pub timestamp: f64,

    /// True only while the current tick's phases are executing.
    pub is_running: bool,

    /// True while the scheduler is paused.
    pub is_paused: bool,
}

impl FrameState {
    /// Restores the freshly-constructed values in place.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
