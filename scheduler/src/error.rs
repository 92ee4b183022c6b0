use crate::config::ConfigError;
use crate::scheduler::{Priority, UnitHandle, UnitState};

/// Failures reported by an execution-unit provider. The dispatcher treats
/// every one of them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} does not exist")]
    UnknownUnit(UnitHandle),

    #[error("cannot {operation} {unit}: unit is {state}")]
    InvalidTransition {
        unit: UnitHandle,
        state: UnitState,
        operation: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("priority {priority} is outside the {levels} configured levels")]
    PriorityOutOfRange { priority: Priority, levels: u32 },

    #[error("execution unit provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
