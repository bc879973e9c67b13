use std::collections::HashMap;

use crate::frame::{FrameState, Process, ProcessHandle, ScheduleOptions};
use crate::phase::PhaseQueue;
use crate::time::{SystemTicks, TickHandle, TickSource};

use super::config::SchedulerConfig;
use super::ctx::{Command, FrameCtx};
use super::error::{ConfigError, ScheduleError};

/// Fallback rate: first-tick delta and the interval restored when no fps
/// target is set.
const DEFAULT_FPS: f64 = 60.0;

/// Lower clamp for unthrottled deltas. Guards against zero or negative
/// values from clock quirks.
const MIN_DELTA_MS: f64 = 1.0;

/// Upper clamp for unthrottled deltas. Bounds the effect of long stalls on
/// delta-driven simulations.
const MAX_DELTA_MS: f64 = 40.0;

/// What a single [`FrameScheduler::tick`] delivery did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Phases executed.
    Ran,
    /// The tick arrived before the fps interval elapsed; nothing executed
    /// and the next tick was re-armed.
    Throttled,
    /// No tick was armed: nothing scheduled, paused, or an inert source.
    Idle,
}

/// Phase-ordered frame scheduler.
///
/// Owns the declared phase list, one double-buffered queue per phase, the
/// process registry, the shared [`FrameState`], and the timing source.
/// Hosts deliver ticks with [`tick`] (or the blocking [`run`] pump);
/// processes execute in declared phase order, in registration order within a
/// phase.
///
/// The scheduler is single-threaded and cooperative. Processes must not
/// block; the only suspension point is between ticks, waiting on the source.
///
/// [`tick`]: Self::tick
/// [`run`]: Self::run
pub struct FrameScheduler<S: TickSource = SystemTicks> {
    source: S,
    phases: Vec<String>,
    queues: Vec<PhaseQueue>,
    processes: HashMap<ProcessHandle, Process>,
    /// Mid-tick default-scheduled registrations, held back until the tick
    /// ends so they never run in the tick that registered them.
    deferred: Vec<(ProcessHandle, usize, ScheduleOptions)>,
    in_flight: Option<ProcessHandle>,
    next_id: u64,
    state: FrameState,
    armed: Option<TickHandle>,
    allow_loop: bool,
    target_fps: Option<f64>,
    frame_interval: f64,
    last_tick_time: f64,
    last_pause_time: f64,
    total_paused_time: f64,
    warned_inert: bool,
}

impl<S: TickSource> std::fmt::Debug for FrameScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("phases", &self.phases)
            .field("queues", &self.queues)
            .field("process_count", &self.processes.len())
            .field("deferred_count", &self.deferred.len())
            .field("in_flight", &self.in_flight)
            .field("next_id", &self.next_id)
            .field("state", &self.state)
            .field("armed", &self.armed)
            .field("allow_loop", &self.allow_loop)
            .field("target_fps", &self.target_fps)
            .field("frame_interval", &self.frame_interval)
            .field("last_tick_time", &self.last_tick_time)
            .field("last_pause_time", &self.last_pause_time)
            .field("total_paused_time", &self.total_paused_time)
            .field("warned_inert", &self.warned_inert)
            .finish()
    }
}

impl FrameScheduler<SystemTicks> {
    /// Scheduler with the default configuration and a real-time source.
    pub fn new() -> Self {
        // The default configuration is statically valid.
        Self::build(SchedulerConfig::default(), SystemTicks::new())
    }

    /// Scheduler with a validated configuration and a real-time source.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::with_source(config, SystemTicks::new())
    }
}

impl Default for FrameScheduler<SystemTicks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TickSource> FrameScheduler<S> {
    /// Scheduler with a validated configuration and an injected tick source.
    pub fn with_source(config: SchedulerConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, source))
    }

    fn build(config: SchedulerConfig, source: S) -> Self {
        let queues = config.phases.iter().map(|_| PhaseQueue::default()).collect();
        let mut scheduler = Self {
            source,
            phases: config.phases,
            queues,
            processes: HashMap::new(),
            deferred: Vec::new(),
            in_flight: None,
            next_id: 0,
            state: FrameState::default(),
            armed: None,
            allow_loop: config.allow_loop,
            target_fps: None,
            frame_interval: 1000.0 / DEFAULT_FPS,
            last_tick_time: 0.0,
            last_pause_time: 0.0,
            total_paused_time: 0.0,
            warned_inert: false,
        };
        scheduler.set_fps(config.fps);
        scheduler
    }

    /// Registers `process` on the default (first declared) phase with default
    /// options.
    pub fn register<F>(&mut self, process: F) -> ProcessHandle
    where
        F: FnMut(&FrameState, &mut FrameCtx<'_>) + 'static,
    {
        self.insert(0, Box::new(process), ScheduleOptions::default())
    }

    /// Registers `process` on a named phase.
    ///
    /// The process runs during the next completed tick's drain of that phase,
    /// in declared phase order relative to other phases, unless
    /// `opts.immediate` lands it in a drain already in progress. Unknown
    /// phase names fail fast.
    ///
    /// If no tick is armed, arms the source and records the current time as
    /// the timing baseline.
    pub fn register_at<F>(
        &mut self,
        phase: &str,
        process: F,
        opts: ScheduleOptions,
    ) -> Result<ProcessHandle, ScheduleError>
    where
        F: FnMut(&FrameState, &mut FrameCtx<'_>) + 'static,
    {
        let index = self
            .phases
            .iter()
            .position(|name| name == phase)
            .ok_or_else(|| ScheduleError::UnknownPhase(phase.to_string()))?;
        Ok(self.insert(index, Box::new(process), opts))
    }

    /// Cancels a process's future scheduling.
    ///
    /// An invocation already in flight completes, and an entry already
    /// swapped into the current tick's draining buffer still runs this tick.
    /// Unknown or already-finished handles are ignored.
    pub fn cancel(&mut self, handle: ProcessHandle) {
        for queue in &mut self.queues {
            queue.cancel(handle);
        }
        self.deferred.retain(|(queued, _, _)| *queued != handle);
        self.drop_if_orphaned(handle);
    }

    /// The full reset: every queue and registration is dropped, the frame
    /// state returns to its defaults, and ticking stops. The scheduler stays
    /// usable; a new registration starts it again.
    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
        self.processes.clear();
        self.deferred.clear();
        self.state.reset();
        self.last_tick_time = 0.0;
        self.last_pause_time = 0.0;
        self.total_paused_time = 0.0;
        if let Some(handle) = self.armed.take() {
            self.source.cancel_tick(handle);
        }
        log::debug!("scheduler cleared");
    }

    /// Stops arming ticks and cancels the one outstanding. Idempotent.
    pub fn pause(&mut self) {
        if self.state.is_paused {
            return;
        }
        self.state.is_paused = true;
        self.last_pause_time = self.source.now();
        if let Some(handle) = self.armed.take() {
            self.source.cancel_tick(handle);
        }
        log::debug!("scheduler paused");
    }

    /// Resumes ticking after [`pause`](Self::pause).
    ///
    /// The paused gap is folded into the pause accounting so subsequent
    /// timestamps and deltas are unaffected by it. A scheduler that is not
    /// paused, or has no outstanding work, is left untouched.
    pub fn resume(&mut self) {
        if !self.state.is_paused || !self.has_work() {
            return;
        }
        self.state.is_paused = false;
        let now = self.source.now();
        self.total_paused_time += now - self.last_pause_time;
        self.last_pause_time = 0.0;
        self.last_tick_time = now - self.total_paused_time;
        self.state.timestamp = self.last_tick_time;
        self.arm();
        log::debug!("scheduler resumed");
    }

    /// Read-only view of the shared frame state.
    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// The configured target rate, `None` when unbounded.
    pub fn fps(&self) -> Option<f64> {
        self.target_fps
    }

    /// Sets the target update rate.
    ///
    /// `None` or a non-positive rate removes the throttle and restores the
    /// default interval. Takes effect on the next delta computation.
    pub fn set_fps(&mut self, fps: Option<f64>) {
        match fps {
            Some(rate) if rate > 0.0 => {
                self.target_fps = Some(rate);
                self.frame_interval = 1000.0 / rate;
            }
            _ => {
                self.target_fps = None;
                self.frame_interval = 1000.0 / DEFAULT_FPS;
            }
        }
    }

    /// Whether a tick request is outstanding.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Arms the next tick if outstanding work exists, for single-stepping
    /// hosts running with `allow_loop: false`. Returns whether a tick is
    /// armed afterwards.
    pub fn request_tick(&mut self) -> bool {
        if !self.state.is_paused && self.has_work() {
            self.arm();
        }
        self.is_armed()
    }

    /// Delivers one tick from the timing source.
    ///
    /// Runs the timing algorithm and, unless the tick arrived ahead of the
    /// fps grid, drains every phase in declared order. Re-arms the source at
    /// the end while outstanding work remains (and `allow_loop` holds).
    pub fn tick(&mut self) -> TickOutcome {
        if self.armed.take().is_none() {
            return TickOutcome::Idle;
        }

        let now = self.source.now();
        let time = now - self.total_paused_time;

        if self.target_fps.is_some() {
            let elapsed = time - self.last_tick_time;
            if elapsed < self.frame_interval {
                // Ahead of the grid: skip the whole frame and wait for the
                // next delivery.
                self.arm();
                return TickOutcome::Throttled;
            }
            // Phase-lock to the grid so late deliveries do not drift it.
            self.last_tick_time = time - (elapsed % self.frame_interval);
            self.state.delta = self.frame_interval;
        } else {
            self.state.delta = if self.state.timestamp == 0.0 {
                self.frame_interval
            } else {
                (time - self.state.timestamp).clamp(MIN_DELTA_MS, MAX_DELTA_MS)
            };
            self.last_tick_time = time;
        }

        self.state.timestamp = time;
        self.state.is_running = true;
        for index in 0..self.queues.len() {
            self.run_phase(index);
        }
        self.state.is_running = false;
        self.flush_deferred();

        if self.allow_loop && !self.state.is_paused && self.has_work() {
            self.arm();
        }
        TickOutcome::Ran
    }

    /// Blocking pump: waits on the source and delivers ticks until nothing
    /// is armed.
    pub fn run(&mut self) {
        while self.is_armed() {
            self.source.wait();
            self.tick();
        }
    }

    fn run_phase(&mut self, index: usize) {
        loop {
            if !self.queues[index].begin_run() {
                return;
            }
            while let Some(handle) = self.queues[index].next_scheduled() {
                if self.queues[index].is_recurring(handle) {
                    // Re-arm before invoking; lands in the accumulating
                    // buffer for the next tick.
                    self.queues[index].schedule(handle, ScheduleOptions::default());
                }
                let Some(mut process) = self.processes.remove(&handle) else {
                    continue;
                };
                self.in_flight = Some(handle);
                let mut ctx = FrameCtx::new(&self.phases, self.next_id);
                process(&self.state, &mut ctx);
                let FrameCtx {
                    next_id, commands, ..
                } = ctx;
                self.next_id = next_id;
                self.in_flight = None;

                // A finished one-shot that nothing re-queued is dropped;
                // anything still due to run goes back into the registry.
                if self.queues.iter().any(|queue| queue.references(handle)) {
                    self.processes.insert(handle, process);
                }
                self.apply(commands);
            }
            if !self.queues[index].finish_run() {
                return;
            }
        }
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Schedule {
                    handle,
                    phase,
                    opts,
                    process,
                } => self.admit(handle, phase, process, opts),
                Command::Cancel(handle) => self.cancel(handle),
                Command::Clear => self.clear(),
                Command::Pause => self.pause(),
                Command::Resume => self.resume(),
                Command::SetFps(fps) => self.set_fps(fps),
            }
        }
    }

    fn insert(&mut self, phase: usize, process: Process, opts: ScheduleOptions) -> ProcessHandle {
        let handle = ProcessHandle::new(self.next_id);
        self.next_id += 1;
        self.admit(handle, phase, process, opts);
        handle
    }

    /// Shared tail of direct registration and ctx-command application.
    fn admit(&mut self, handle: ProcessHandle, phase: usize, process: Process, opts: ScheduleOptions) {
        self.processes.insert(handle, process);

        // Default-scheduled work registered mid-tick is held back until the
        // tick ends; draining a later phase must not pick it up this tick.
        // Immediate scheduling into the phase currently draining extends
        // that drain instead.
        let live = opts.immediate && self.queues[phase].is_running();
        if self.state.is_running && !live {
            self.deferred.push((handle, phase, opts));
        } else {
            self.queues[phase].schedule(handle, opts);
        }

        if self.armed.is_none() && !self.state.is_paused {
            if !self.state.is_running {
                // Arming from idle: baseline for the throttle grid.
                self.last_tick_time = self.source.now() - self.total_paused_time;
            }
            self.arm();
        }
    }

    fn flush_deferred(&mut self) {
        for (handle, phase, opts) in std::mem::take(&mut self.deferred) {
            self.queues[phase].schedule(handle, opts);
        }
    }

    fn arm(&mut self) {
        if self.armed.is_some() {
            return;
        }
        match self.source.request_tick() {
            Some(handle) => self.armed = Some(handle),
            None => {
                if !self.warned_inert {
                    self.warned_inert = true;
                    log::warn!("tick source cannot deliver ticks; scheduler is inert");
                }
            }
        }
    }

    fn drop_if_orphaned(&mut self, handle: ProcessHandle) {
        if self.in_flight == Some(handle) {
            return;
        }
        if self.queues.iter().any(|queue| queue.references(handle)) {
            return;
        }
        if self.deferred.iter().any(|(queued, _, _)| *queued == handle) {
            return;
        }
        self.processes.remove(&handle);
    }

    fn has_work(&self) -> bool {
        !self.deferred.is_empty() || self.queues.iter().any(PhaseQueue::has_work)
    }
}
