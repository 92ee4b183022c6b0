use super::{task::Task, Priority, TaskId, Tick};
use std::{collections::VecDeque, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Task was given the CPU, either fresh or resumed.
    Dispatched,
    /// Real-time task kept the CPU for another tick.
    Running,
    Completed,
    /// Task used its quantum and was moved to `demoted_to`.
    Suspended { demoted_to: Priority },
    /// Task was evicted for waiting too long.
    Terminated,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Dispatched => "dispatched",
            EventKind::Running => "running",
            EventKind::Completed => "completed",
            EventKind::Suspended { .. } => "suspended",
            EventKind::Terminated => "terminated",
        }
    }
}

/// One lifecycle transition as seen on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: Tick,
    pub kind: EventKind,
    pub task_id: TaskId,
    pub priority: Priority,
    pub remaining: u64,
}

impl Event {
    pub fn new(time: Tick, kind: EventKind, task: &Task) -> Self {
        let remaining = match kind {
            EventKind::Completed | EventKind::Terminated => 0,
            _ => task.remaining_time(),
        };
        Self {
            time,
            kind,
            task_id: task.id(),
            priority: task.priority(),
            remaining,
        }
    }

    /// Suspension events report the level the task ran at, not the one it
    /// was demoted to.
    pub fn suspended(time: Tick, task: &Task, old_priority: Priority) -> Self {
        Self {
            priority: old_priority,
            ..Self::new(
                time,
                EventKind::Suspended {
                    demoted_to: task.priority(),
                },
                task,
            )
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.0000 s task {:<10} (id:{:04} priority:{} remaining:{} s)",
            self.time,
            self.kind.label(),
            self.task_id,
            self.priority,
            self.remaining
        )
    }
}

/// Receives every transition the dispatcher makes.
pub trait EventSink {
    fn emit(&mut self, event: &Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: &Event) {
        self.push(*event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &Event) {
        (**self).emit(event);
    }
}

/// Keeps only the most recent events, for the live dashboard.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().rev()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &Event) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(*event);
    }
}
