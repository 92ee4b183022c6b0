use super::{task::Task, Priority, FIRST_FEEDBACK_LEVEL, REAL_TIME_PRIORITY};
use std::collections::VecDeque;

/// One FIFO ready queue per priority level. Level 0 is the real-time queue.
#[derive(Debug)]
pub struct QueueBank {
    queues: Vec<VecDeque<Task>>,
}

impl QueueBank {
    pub fn new(levels: u32) -> Self {
        debug_assert!(levels > FIRST_FEEDBACK_LEVEL, "bank needs a feedback level");
        Self {
            queues: (0..levels).map(|_| VecDeque::new()).collect(),
        }
    }

    pub fn levels(&self) -> u32 {
        self.queues.len() as u32
    }

    pub fn lowest_level(&self) -> Priority {
        self.levels() - 1
    }

    /// Appends `task` at the tail of `level`. A level outside the bank is
    /// refused and the task handed back.
    pub fn enqueue(&mut self, level: Priority, task: Task) -> Result<(), Task> {
        debug_assert_eq!(level, task.priority(), "{} queued off-level", task.name());
        match self.queues.get_mut(level as usize) {
            Some(queue) => {
                queue.push_back(task);
                Ok(())
            }
            None => Err(task),
        }
    }

    pub fn dequeue(&mut self, level: Priority) -> Option<Task> {
        self.queues.get_mut(level as usize)?.pop_front()
    }

    pub fn is_empty(&self, level: Priority) -> bool {
        self.len(level) == 0
    }

    pub fn len(&self, level: Priority) -> usize {
        self.queues.get(level as usize).map_or(0, VecDeque::len)
    }

    pub fn total_len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// True when no level holds a ready task.
    pub fn is_drained(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Takes the next task to run: the real-time head if there is one,
    /// otherwise the head of the highest non-empty feedback level.
    pub fn select_next(&mut self) -> Option<Task> {
        if let Some(task) = self.dequeue(REAL_TIME_PRIORITY) {
            return Some(task);
        }
        (FIRST_FEEDBACK_LEVEL..self.levels()).find_map(|level| self.dequeue(level))
    }

    /// Ready tasks in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.queues.iter().flatten()
    }

    pub fn level(&self, level: Priority) -> impl Iterator<Item = &Task> {
        self.queues.get(level as usize).into_iter().flatten()
    }

    /// Removes every task at `first_level` or below that matches `predicate`,
    /// keeping the survivors in their original order.
    pub fn remove_where<F>(&mut self, first_level: Priority, mut predicate: F) -> Vec<Task>
    where
        F: FnMut(&Task) -> bool,
    {
        let mut removed = Vec::new();
        for queue in self.queues.iter_mut().skip(first_level as usize) {
            if !queue.iter().any(&mut predicate) {
                continue;
            }
            let mut kept = VecDeque::with_capacity(queue.len());
            for task in queue.drain(..) {
                if predicate(&task) {
                    removed.push(task);
                } else {
                    kept.push_back(task);
                }
            }
            *queue = kept;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::TaskSpec;
    use proptest::prelude::*;

    fn task(id: u32, priority: Priority) -> Task {
        Task::new(id, TaskSpec::new(0, priority, 1))
    }

    fn enqueue(bank: &mut QueueBank, task: Task) {
        let level = task.priority();
        bank.enqueue(level, task).unwrap();
    }

    #[test]
    fn empty_bank_selects_nothing() {
        let mut bank = QueueBank::new(4);
        assert!(bank.is_drained());
        assert!(bank.is_empty(0));
        assert!(bank.dequeue(2).is_none());
        assert!(bank.select_next().is_none());
    }

    #[test]
    fn real_time_wins_over_older_feedback_tasks() {
        let mut bank = QueueBank::new(4);
        enqueue(&mut bank, task(0, 1));
        enqueue(&mut bank, task(1, 3));
        enqueue(&mut bank, task(2, 0));

        let order: Vec<_> = std::iter::from_fn(|| bank.select_next())
            .map(|task| task.id())
            .collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn out_of_range_level_hands_task_back() {
        let mut bank = QueueBank::new(3);
        let rejected = bank.enqueue(3, task(9, 3)).unwrap_err();
        assert_eq!(rejected.id(), 9);
        assert_eq!(bank.total_len(), 0);
        assert!(bank.is_empty(3));
    }

    #[test]
    fn remove_where_skips_real_time_and_keeps_order() {
        let mut bank = QueueBank::new(3);
        enqueue(&mut bank, task(0, 0));
        for id in 1..=5 {
            enqueue(&mut bank, task(id, 1));
        }

        let removed = bank.remove_where(FIRST_FEEDBACK_LEVEL, |task| task.id() % 2 == 0);
        let removed: Vec<_> = removed.iter().map(Task::id).collect();
        assert_eq!(removed, vec![2, 4]);

        let kept: Vec<_> = bank.level(1).map(Task::id).collect();
        assert_eq!(kept, vec![1, 3, 5]);
        assert_eq!(bank.len(0), 1);
    }

    proptest! {
        #[test]
        fn prop_each_level_is_fifo(levels in proptest::collection::vec(0u32..5, 0..64)) {
            let mut bank = QueueBank::new(5);
            for (id, level) in levels.iter().enumerate() {
                enqueue(&mut bank, task(id as u32, *level));
            }
            prop_assert_eq!(bank.total_len(), levels.len());

            for level in 0..5 {
                let expected: Vec<u32> = levels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| **l == level)
                    .map(|(id, _)| id as u32)
                    .collect();
                prop_assert_eq!(bank.len(level), expected.len());
                let drained: Vec<u32> = std::iter::from_fn(|| bank.dequeue(level))
                    .map(|task| task.id())
                    .collect();
                prop_assert_eq!(drained, expected);
            }
            prop_assert!(bank.is_drained());
        }
    }
}
