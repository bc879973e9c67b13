use thiserror::Error;

/// Construction-time configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one phase must be declared")]
    NoPhases,

    #[error("phase `{0}` is declared more than once")]
    DuplicatePhase(String),

    #[error("phase names must not be blank")]
    BlankPhase,
}

/// Registration-time failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("unknown phase `{0}`")]
    UnknownPhase(String),
}
