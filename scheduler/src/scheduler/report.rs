use super::{task::Task, Tick};
use std::fmt;

/// Totals gathered over one simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub ticks: Tick,
    pub idle_ticks: Tick,
    pub completed: u64,
    pub terminated: u64,
    total_turnaround: Tick,
}

impl SimulationReport {
    pub(crate) fn record_completion(&mut self, task: &Task, now: Tick) {
        self.completed += 1;
        self.total_turnaround += now.saturating_sub(task.arrival_time());
    }

    pub(crate) fn record_termination(&mut self) {
        self.terminated += 1;
    }

    pub fn busy_ticks(&self) -> Tick {
        self.ticks - self.idle_ticks
    }

    /// Mean arrival-to-completion time of the tasks that finished.
    pub fn mean_turnaround(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.total_turnaround as f64 / self.completed as f64)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks ({} idle), {} completed, {} terminated",
            self.ticks, self.idle_ticks, self.completed, self.terminated
        )?;
        if let Some(mean) = self.mean_turnaround() {
            write!(f, ", mean turnaround {mean:.2} ticks")?;
        }
        Ok(())
    }
}
