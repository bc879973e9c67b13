use crate::frame::{FrameState, Process, ProcessHandle, ScheduleOptions};

use super::error::ScheduleError;

/// Buffered control surface passed to every process invocation.
///
/// Calls made here are queued and applied after the current process returns,
/// which keeps mid-frame scheduling and cancellation safe while a phase is
/// draining. Handles returned from `schedule`/`schedule_at` are valid
/// immediately and can be canceled later like any other registration.
pub struct FrameCtx<'a> {
    pub(crate) phases: &'a [String],
    pub(crate) next_id: u64,
    pub(crate) commands: Vec<Command>,
}

pub(crate) enum Command {
    Schedule {
        handle: ProcessHandle,
        phase: usize,
        opts: ScheduleOptions,
        process: Process,
    },
    Cancel(ProcessHandle),
    Clear,
    Pause,
    Resume,
    SetFps(Option<f64>),
}

impl<'a> FrameCtx<'a> {
    pub(crate) fn new(phases: &'a [String], next_id: u64) -> Self {
        Self {
            phases,
            next_id,
            commands: Vec::new(),
        }
    }

    /// Schedules a process on the default (first declared) phase with default
    /// options.
    pub fn schedule<F>(&mut self, process: F) -> ProcessHandle
    where
        F: FnMut(&FrameState, &mut FrameCtx<'_>) + 'static,
    {
        self.push_schedule(0, Box::new(process), ScheduleOptions::default())
    }

    /// Schedules a process on a named phase. Unknown names fail immediately,
    /// before the command is queued.
    pub fn schedule_at<F>(
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
        Ok(self.push_schedule(index, Box::new(process), opts))
    }

    /// Cancels a process's future scheduling. An in-flight invocation still
    /// completes.
    pub fn cancel(&mut self, handle: ProcessHandle) {
        self.commands.push(Command::Cancel(handle));
    }

    /// Requests the full reset once the current process returns.
    pub fn clear(&mut self) {
        self.commands.push(Command::Clear);
    }

    pub fn pause(&mut self) {
        self.commands.push(Command::Pause);
    }

    pub fn resume(&mut self) {
        self.commands.push(Command::Resume);
    }

    /// Changes the target rate; `None` removes the throttle.
    pub fn set_fps(&mut self, fps: Option<f64>) {
        self.commands.push(Command::SetFps(fps));
    }

    fn push_schedule(
        &mut self,
        phase: usize,
        process: Process,
        opts: ScheduleOptions,
    ) -> ProcessHandle {
        let handle = ProcessHandle::new(self.next_id);
        self.next_id += 1;
        self.commands.push(Command::Schedule {
            handle,
            phase,
            opts,
            process,
        });
        handle
    }
}
