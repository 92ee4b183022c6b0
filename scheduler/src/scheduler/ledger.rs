use super::{task::Task, Tick};

/// Staging area for tasks whose arrival time has not elapsed yet.
///
/// The ledger is unordered and every admission check scans all of it, which
/// is fine for batch sizes read from a text file.
#[derive(Debug, Default)]
pub struct ArrivalLedger {
    pending: Vec<Task>,
}

impl ArrivalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pending(&mut self, task: Task) {
        self.pending.push(task);
    }

    /// Removes and returns every task with `arrival_time <= now`, in the order
    /// they were added.
    pub fn take_arrived(&mut self, now: Tick) -> Vec<Task> {
        if !self.pending.iter().any(|task| task.arrival_time() <= now) {
            return Vec::new();
        }
        let (arrived, pending) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|task| task.arrival_time() <= now);
        self.pending = pending;
        arrived
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_arrival(&self) -> Option<Tick> {
        self.pending.iter().map(Task::arrival_time).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::TaskSpec;

    fn ledger_with(arrivals: &[Tick]) -> ArrivalLedger {
        let mut ledger = ArrivalLedger::new();
        for (id, arrival) in arrivals.iter().enumerate() {
            ledger.add_pending(Task::new(id as u32, TaskSpec::new(*arrival, 1, 1)));
        }
        ledger
    }

    #[test]
    fn only_due_tasks_leave_the_ledger() {
        let mut ledger = ledger_with(&[5, 0, 3, 0, 9]);

        let arrived: Vec<_> = ledger.take_arrived(3).iter().map(Task::id).collect();
        assert_eq!(arrived, vec![1, 2, 3]);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.next_arrival(), Some(5));

        assert!(ledger.take_arrived(4).is_empty());
        let arrived: Vec<_> = ledger.take_arrived(100).iter().map(Task::id).collect();
        assert_eq!(arrived, vec![0, 4]);
        assert!(ledger.is_empty());
        assert_eq!(ledger.next_arrival(), None);
    }
}
