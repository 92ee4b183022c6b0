use super::{queues::QueueBank, task::Task, Tick, FIRST_FEEDBACK_LEVEL};

/// Evicts feedback-level tasks that have sat in a ready queue for too long.
///
/// Evicted tasks are terminated, not promoted: once a task crosses the
/// threshold it never runs again. The real-time level is never scanned.
#[derive(Debug, Clone, Copy)]
pub struct StarvationMonitor {
    threshold: Tick,
}

impl StarvationMonitor {
    pub fn new(threshold: Tick) -> Self {
        Self { threshold }
    }

    pub fn is_starved(&self, task: &Task, now: Tick) -> bool {
        !task.is_real_time() && task.waited(now) >= self.threshold
    }

    /// Pulls every starved task out of `bank`. The caller owns the returned
    /// tasks and is responsible for tearing them down.
    pub fn evict(&self, bank: &mut QueueBank, now: Tick) -> Vec<Task> {
        bank.remove_where(FIRST_FEEDBACK_LEVEL, |task| self.is_starved(task, now))
    }
}
