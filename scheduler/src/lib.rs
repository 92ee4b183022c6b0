//! Multi-level feedback queue scheduling on a virtual clock.
//!
//! A [`Dispatcher`] owns a bank of FIFO ready queues, an arrival ledger and a
//! starvation monitor. Every tick it admits arrivals, evicts tasks that have
//! waited too long, and runs one task for a single quantum. Level 0 is the
//! real-time class: it always wins selection and is never demoted or evicted.

pub mod config;
pub mod error;
pub mod loader;
pub mod scheduler;
pub mod tracing_setup;

pub use config::{ConfigError, SimulationConfig};
pub use error::{ProviderError, SchedulerError, SchedulerResult};
pub use loader::{load_tasks, parse_line, parse_tasks, LoadError};
pub use scheduler::{
    Dispatcher, Event, EventKind, EventLog, EventSink, ExecutionProvider, SimulatedUnits,
    SimulationReport, TaskSpec, TickOutcome,
};
