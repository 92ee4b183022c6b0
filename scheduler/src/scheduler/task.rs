use super::{units::UnitHandle, Priority, Tick, TaskId, REAL_TIME_PRIORITY};

/// A workload as described by the task source, before it has an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub arrival_time: Tick,
    pub priority: Priority,
    pub duration: u64,
}

impl TaskSpec {
    pub fn new(arrival_time: Tick, priority: Priority, duration: u64) -> Self {
        Self {
            arrival_time,
            priority,
            duration,
        }
    }
}

/// Schedulable state of a single workload.
///
/// A `Task` value is owned by exactly one container at a time (the arrival
/// ledger, one level of the queue bank, or the dispatcher's current slot), so
/// moving it between containers can never leave a stale link behind.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    name: String,
    arrival_time: Tick,
    priority: Priority,
    total_duration: u64,
    remaining_time: u64,
    creation_time: Option<Tick>,
    start_time: Option<Tick>,
    abs_wait_start: Tick,
    unit: Option<UnitHandle>,
}

impl Task {
    pub fn new(id: TaskId, spec: TaskSpec) -> Self {
        Self {
            id,
            name: format!("T{id}"),
            arrival_time: spec.arrival_time,
            priority: spec.priority,
            total_duration: spec.duration,
            remaining_time: spec.duration,
            creation_time: None,
            start_time: None,
            abs_wait_start: spec.arrival_time,
            unit: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arrival_time(&self) -> Tick {
        self.arrival_time
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    pub fn remaining_time(&self) -> u64 {
        self.remaining_time
    }

    pub fn creation_time(&self) -> Option<Tick> {
        self.creation_time
    }

    pub fn start_time(&self) -> Option<Tick> {
        self.start_time
    }

    pub fn abs_wait_start(&self) -> Tick {
        self.abs_wait_start
    }

    pub fn unit(&self) -> Option<UnitHandle> {
        self.unit
    }

    pub fn is_real_time(&self) -> bool {
        self.priority == REAL_TIME_PRIORITY
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_time == 0
    }

    /// Time spent in a ready queue since the task last entered one.
    pub fn waited(&self, now: Tick) -> Tick {
        now.saturating_sub(self.abs_wait_start)
    }

    /// Called when the task leaves the arrival ledger for a ready queue.
    pub fn admit(&mut self, now: Tick) {
        self.creation_time.get_or_insert(now);
        self.enter_ready(now);
    }

    /// Restarts the starvation clock. Only valid while the task is being put
    /// into a ready queue.
    pub fn enter_ready(&mut self, now: Tick) {
        self.abs_wait_start = now;
    }

    /// Binds a freshly created execution unit and stamps the first dispatch.
    pub fn attach_unit(&mut self, unit: UnitHandle, now: Tick) {
        debug_assert!(self.unit.is_none(), "{} already owns a unit", self.name);
        self.unit = Some(unit);
        self.creation_time.get_or_insert(now);
        self.start_time.get_or_insert(now);
        self.abs_wait_start = now;
    }

    pub fn take_unit(&mut self) -> Option<UnitHandle> {
        self.unit.take()
    }

    /// Consumes one unit of work. A zero-length task still occupies the tick
    /// it was dispatched in.
    pub fn run_tick(&mut self) {
        self.remaining_time = self.remaining_time.saturating_sub(1);
    }

    /// Drops the task one feedback level, never below `lowest`. Real-time
    /// tasks keep their level. Returns the level held before the call.
    pub fn demote(&mut self, lowest: Priority) -> Priority {
        let old_priority = self.priority;
        if !self.is_real_time() && self.priority < lowest {
            self.priority += 1;
        }
        old_priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_with_full_work_and_no_unit() {
        let task = Task::new(7, TaskSpec::new(3, 2, 5));
        assert_eq!(task.name(), "T7");
        assert_eq!(task.remaining_time(), 5);
        assert_eq!(task.total_duration(), 5);
        assert_eq!(task.abs_wait_start(), 3);
        assert_eq!(task.creation_time(), None);
        assert!(task.unit().is_none());
    }

    #[test]
    fn demotion_clamps_at_lowest_level() {
        let mut task = Task::new(0, TaskSpec::new(0, 3, 5));
        assert_eq!(task.demote(4), 3);
        assert_eq!(task.priority(), 4);
        assert_eq!(task.demote(4), 4);
        assert_eq!(task.priority(), 4);
    }

    #[test]
    fn real_time_priority_is_immutable() {
        let mut task = Task::new(0, TaskSpec::new(0, REAL_TIME_PRIORITY, 5));
        assert_eq!(task.demote(19), REAL_TIME_PRIORITY);
        assert_eq!(task.priority(), REAL_TIME_PRIORITY);
    }

    #[test]
    fn creation_time_is_set_once() {
        let mut task = Task::new(0, TaskSpec::new(2, 1, 1));
        task.admit(4);
        task.attach_unit(UnitHandle::from_raw(1), 9);
        assert_eq!(task.creation_time(), Some(4));
        assert_eq!(task.start_time(), Some(9));
        assert_eq!(task.abs_wait_start(), 9);
    }

    #[test]
    fn waited_never_underflows() {
        let mut task = Task::new(0, TaskSpec::new(0, 1, 1));
        task.enter_ready(10);
        assert_eq!(task.waited(4), 0);
        assert_eq!(task.waited(30), 20);
    }
}
