use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Opaque identifier for an armed tick request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TickHandle(u64);

impl TickHandle {
    /// Wraps a source-chosen raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Capability interface over the host's tick-delivery primitive.
///
/// The scheduler arms at most one tick at a time: `request_tick` is never
/// called while a previous handle is outstanding and uncanceled.
pub trait TickSource {
    /// Reference clock in milliseconds. Must not run backwards.
    fn now(&mut self) -> f64;

    /// Arms the next tick.
    ///
    /// Returns `None` when the source cannot deliver ticks at all; the
    /// scheduler then degrades to a no-op instead of raising.
    fn request_tick(&mut self) -> Option<TickHandle>;

    /// Cancels a previously armed tick.
    fn cancel_tick(&mut self, handle: TickHandle);

    /// Blocks until the armed tick is due.
    ///
    /// Only the blocking pump calls this. Sources that cannot block return
    /// immediately, which is the default.
    fn wait(&mut self) {}
}

/// Real-time source: a monotonic `Instant` clock plus a fixed-interval pump.
///
/// There is no ambient repeating-callback primitive to hook into, so delivery
/// is cooperative: `wait` sleeps until the armed tick is due and the host pump
/// then delivers it. The pump interval bounds the maximum achievable frame
/// rate; pair it with the scheduler's `fps` throttle for a fixed update rate.
#[derive(Debug)]
pub struct SystemTicks {
    epoch: Instant,
    interval: Duration,
    due: Option<Instant>,
    next_handle: u64,
}

impl SystemTicks {
    /// Default pump interval, roughly 240 Hz.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_micros(4167);

    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    /// Creates a source pumping at a custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            interval,
            due: None,
            next_handle: 0,
        }
    }
}

impl Default for SystemTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemTicks {
    fn now(&mut self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn request_tick(&mut self) -> Option<TickHandle> {
        let handle = TickHandle::new(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.due = Some(Instant::now() + self.interval);
        Some(handle)
    }

    fn cancel_tick(&mut self, _handle: TickHandle) {
        self.due = None;
    }

    fn wait(&mut self) {
        if let Some(due) = self.due {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
    }
}

/// Deterministic source for tests and offline stepping.
///
/// Clones share one underlying clock, so a test can keep a handle that
/// advances time and inspects request bookkeeping while the scheduler owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    inner: Rc<RefCell<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    now: f64,
    armed: Option<TickHandle>,
    next_handle: u64,
    requested: u64,
    canceled: u64,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `ms`.
    pub fn advance(&self, ms: f64) {
        self.inner.borrow_mut().now += ms;
    }

    /// Sets the clock to an absolute value.
    pub fn set_now(&self, ms: f64) {
        self.inner.borrow_mut().now = ms;
    }

    /// Total `request_tick` calls observed.
    pub fn requested(&self) -> u64 {
        self.inner.borrow().requested
    }

    /// Total `cancel_tick` calls observed.
    pub fn canceled(&self) -> u64 {
        self.inner.borrow().canceled
    }
}

impl TickSource for ManualTicks {
    fn now(&mut self) -> f64 {
        self.inner.borrow().now
    }

    fn request_tick(&mut self) -> Option<TickHandle> {
        let mut state = self.inner.borrow_mut();
        let handle = TickHandle::new(state.next_handle);
        state.next_handle = state.next_handle.wrapping_add(1);
        state.armed = Some(handle);
        state.requested += 1;
        Some(handle)
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let mut state = self.inner.borrow_mut();
        if state.armed == Some(handle) {
            state.armed = None;
        }
        state.canceled += 1;
    }
}

/// Source for environments with no tick delivery at all.
///
/// `request_tick` always declines, so a scheduler built on this source
/// accepts registrations but never runs a frame.
#[derive(Debug, Default, Copy, Clone)]
pub struct InertTicks;

impl TickSource for InertTicks {
    fn now(&mut self) -> f64 {
        0.0
    }

    fn request_tick(&mut self) -> Option<TickHandle> {
        None
    }

    fn cancel_tick(&mut self, _handle: TickHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let ticks = ManualTicks::new();
        let mut other = ticks.clone();

        ticks.advance(250.0);
        assert_eq!(other.now(), 250.0);

        ticks.set_now(100.0);
        assert_eq!(other.now(), 100.0);
    }

    #[test]
    fn manual_requests_and_cancels_are_counted() {
        let mut ticks = ManualTicks::new();

        let handle = ticks.request_tick().expect("manual source always arms");
        ticks.cancel_tick(handle);

        assert_eq!(ticks.requested(), 1);
        assert_eq!(ticks.canceled(), 1);
    }

    #[test]
    fn system_clock_does_not_run_backwards() {
        let mut ticks = SystemTicks::new();
        let a = ticks.now();
        let b = ticks.now();
        assert!(b >= a);
    }

    #[test]
    fn inert_source_never_arms() {
        let mut ticks = InertTicks;
        assert!(ticks.request_tick().is_none());
    }
}
