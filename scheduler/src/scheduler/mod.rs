mod dispatcher;
mod display;
mod events;
mod ledger;
mod queues;
mod report;
mod runner;
mod starvation;
mod task;
mod units;

pub use dispatcher::{Dispatcher, SchedulerSnapshot, Submitter, TaskView, TickOutcome};
pub use display::{task_color_index, ConsoleSink, DisplayTerminal};
pub use events::{Event, EventKind, EventLog, EventSink};
pub use ledger::ArrivalLedger;
pub use queues::QueueBank;
pub use report::SimulationReport;
pub use runner::{RunnerError, RunnerEvent, SimulationRunner};
pub use starvation::StarvationMonitor;
pub use task::{Task, TaskSpec};
pub use units::{ExecutionProvider, SimulatedUnits, UnitHandle, UnitPriority, UnitState, UnitStats};

pub type TaskId = u32;
pub type Priority = u32;
/// A point on the virtual clock. One tick is one unit of work.
pub type Tick = u64;

pub const REAL_TIME_PRIORITY: Priority = 0;
pub const FIRST_FEEDBACK_LEVEL: Priority = 1;
