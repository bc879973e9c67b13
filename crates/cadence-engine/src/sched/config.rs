use super::error::ConfigError;

/// Scheduler construction options.
///
/// Every option has a stated default and validation runs once, at
/// construction, so registration and tick paths never re-check.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Ordered phase names. Phases execute in exactly this order every tick
    /// and the first entry is the default registration target.
    pub phases: Vec<String>,

    /// Optional fixed update rate. `None` runs at the natural rate of the
    /// tick source.
    pub fps: Option<f64>,

    /// Whether the scheduler re-arms itself at the end of a tick while work
    /// remains. With `false`, hosts single-step via
    /// [`FrameScheduler::request_tick`](super::FrameScheduler::request_tick).
    pub allow_loop: bool,
}

impl SchedulerConfig {
    /// Default phase set: read, then update, then render.
    pub const DEFAULT_PHASES: [&'static str; 3] = ["read", "update", "render"];

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }
        for (index, name) in self.phases.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::BlankPhase);
            }
            if self.phases[..index].contains(name) {
                return Err(ConfigError::DuplicatePhase(name.clone()));
            }
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            phases: Self::DEFAULT_PHASES.map(String::from).to_vec(),
            fps: None,
            allow_loop: true,
        }
    }
}
