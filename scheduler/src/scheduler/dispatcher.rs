use super::{
    events::{Event, EventKind, EventSink},
    ledger::ArrivalLedger,
    queues::QueueBank,
    report::SimulationReport,
    starvation::StarvationMonitor,
    task::{Task, TaskSpec},
    units::{ExecutionProvider, UnitPriority},
    Priority, TaskId, Tick,
};
use crate::{
    config::SimulationConfig,
    error::{SchedulerError, SchedulerResult},
};
use parking_lot::Mutex;
use std::{sync::Arc, thread, time::Duration};
use tracing::{debug, info, warn};

/// Everything the dispatcher mutates. Lives behind a single lock.
#[derive(Debug)]
pub struct SchedulerState {
    bank: QueueBank,
    ledger: ArrivalLedger,
    clock: Tick,
    next_id: TaskId,
    current: Option<Task>,
}

impl SchedulerState {
    fn new(levels: u32) -> Self {
        Self {
            bank: QueueBank::new(levels),
            ledger: ArrivalLedger::new(),
            clock: 0,
            next_id: 0,
            current: None,
        }
    }

    fn submit(&mut self, spec: TaskSpec) -> SchedulerResult<TaskId> {
        let levels = self.bank.levels();
        if spec.priority >= levels {
            return Err(SchedulerError::PriorityOutOfRange {
                priority: spec.priority,
                levels,
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ledger.add_pending(Task::new(id, spec));
        Ok(id)
    }

    /// Moves every task whose arrival time has come into its ready queue.
    fn check_arrivals(&mut self) {
        let now = self.clock;
        for mut task in self.ledger.take_arrived(now) {
            task.admit(now);
            let level = task.priority();
            debug!(task = task.name(), level, now, "task admitted");
            if let Err(task) = self.bank.enqueue(level, task) {
                warn!(task = task.name(), level, "task outside the queue bank dropped");
            }
        }
    }

    /// The run is over once nothing is pending, ready or running.
    pub fn is_drained(&self) -> bool {
        self.bank.is_drained() && self.ledger.is_empty() && self.current.is_none()
    }
}

/// Read-only view of a task for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskView {
    pub id: TaskId,
    pub priority: Priority,
    pub remaining: u64,
    pub waited: Tick,
}

impl TaskView {
    fn ready(task: &Task, now: Tick) -> Self {
        Self {
            id: task.id(),
            priority: task.priority(),
            remaining: task.remaining_time(),
            waited: task.waited(now),
        }
    }

    fn running(task: &Task) -> Self {
        Self {
            waited: 0,
            ..Self::ready(task, 0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub clock: Tick,
    pub current: Option<TaskView>,
    /// Ready tasks in dispatch order.
    pub ready: Vec<TaskView>,
    pub pending: usize,
    pub next_arrival: Option<Tick>,
}

/// Cloneable handle for adding tasks while the dispatcher runs. Submissions
/// can only land while the dispatcher sleeps out a quantum.
#[derive(Debug, Clone)]
pub struct Submitter {
    state: Arc<Mutex<SchedulerState>>,
}

impl Submitter {
    pub fn submit(&self, spec: TaskSpec) -> SchedulerResult<TaskId> {
        let id = self.state.lock().submit(spec)?;
        debug!(id, arrival = spec.arrival_time, priority = spec.priority, "task submitted");
        Ok(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Finished,
}

/// The MLFQ control loop. Each [`tick`](Dispatcher::tick) admits arrivals,
/// evicts starved tasks, picks a task if the CPU is free, runs it for one
/// quantum and decides what happens to it next.
pub struct Dispatcher<P, S> {
    state: Arc<Mutex<SchedulerState>>,
    provider: P,
    sink: S,
    monitor: StarvationMonitor,
    config: SimulationConfig,
    report: SimulationReport,
}

impl<P: ExecutionProvider, S: EventSink> Dispatcher<P, S> {
    pub fn new(config: SimulationConfig, provider: P, sink: S) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(Mutex::new(SchedulerState::new(config.levels))),
            provider,
            sink,
            monitor: StarvationMonitor::new(config.starvation_threshold),
            config,
            report: SimulationReport::default(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn submitter(&self) -> Submitter {
        Submitter {
            state: Arc::clone(&self.state),
        }
    }

    pub fn submit(&self, spec: TaskSpec) -> SchedulerResult<TaskId> {
        self.submitter().submit(spec)
    }

    pub fn now(&self) -> Tick {
        self.state.lock().clock
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().is_drained()
    }

    pub fn report(&self) -> SimulationReport {
        self.report
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (P, S) {
        (self.provider, self.sink)
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        SchedulerSnapshot {
            clock: state.clock,
            current: state.current.as_ref().map(TaskView::running),
            ready: state
                .bank
                .iter()
                .map(|task| TaskView::ready(task, state.clock))
                .collect(),
            pending: state.ledger.len(),
            next_arrival: state.ledger.next_arrival(),
        }
    }

    /// Ticks until every task has completed or been evicted.
    pub fn run(&mut self) -> SchedulerResult<SimulationReport> {
        info!(
            levels = self.config.levels,
            threshold = self.config.starvation_threshold,
            "simulation started"
        );
        while self.tick()? == TickOutcome::Continue {}
        info!(
            ticks = self.report.ticks,
            completed = self.report.completed,
            terminated = self.report.terminated,
            "simulation finished"
        );
        pace(self.config.drain_delay);
        Ok(self.report)
    }

    pub fn tick(&mut self) -> SchedulerResult<TickOutcome> {
        let shared = Arc::clone(&self.state);
        let mut state = shared.lock();
        let now = state.clock;

        state.check_arrivals();
        self.check_timeouts(&mut state, now)?;

        let mut just_dispatched = false;
        if state.current.is_none() {
            if let Some(task) = state.bank.select_next() {
                state.current = Some(self.dispatch(task, now)?);
                just_dispatched = true;
            }
        }

        let busy = state.current.is_some();
        if busy {
            if let Some(task) = state.current.as_ref().filter(|_| !just_dispatched) {
                self.sink.emit(&Event::new(now, EventKind::Running, task));
            }
            self.check_timeouts(&mut state, now)?;
            if let Some(task) = state.current.as_mut() {
                task.run_tick();
            }
        }

        drop(state);
        pace(self.config.quantum);
        let mut state = shared.lock();

        state.clock += 1;
        let now = state.clock;
        self.report.ticks += 1;
        if busy {
            self.settle(&mut state, now)?;
        } else {
            self.report.idle_ticks += 1;
        }

        if state.is_drained() {
            Ok(TickOutcome::Finished)
        } else {
            Ok(TickOutcome::Continue)
        }
    }

    fn check_timeouts(&mut self, state: &mut SchedulerState, now: Tick) -> SchedulerResult<()> {
        for mut task in self.monitor.evict(&mut state.bank, now) {
            debug!(task = task.name(), waited = task.waited(now), now, "task starved");
            self.sink.emit(&Event::new(now, EventKind::Terminated, &task));
            if let Some(unit) = task.take_unit() {
                self.provider.destroy(unit)?;
            }
            self.report.record_termination();
        }
        Ok(())
    }

    fn dispatch(&mut self, mut task: Task, now: Tick) -> SchedulerResult<Task> {
        match task.unit() {
            Some(unit) => self.provider.resume(unit)?,
            None => {
                let unit = self.provider.create(&task, UnitPriority::for_task(&task))?;
                task.attach_unit(unit, now);
            }
        }
        debug!(task = task.name(), level = task.priority(), now, "task dispatched");
        self.sink.emit(&Event::new(now, EventKind::Dispatched, &task));
        Ok(task)
    }

    /// Decides the fate of the current task once its quantum is over.
    fn settle(&mut self, state: &mut SchedulerState, now: Tick) -> SchedulerResult<()> {
        let Some(mut task) = state.current.take() else {
            return Ok(());
        };

        if task.is_finished() {
            self.sink.emit(&Event::new(now, EventKind::Completed, &task));
            if let Some(unit) = task.take_unit() {
                self.provider.destroy(unit)?;
            }
            self.report.record_completion(&task, now);
        } else if !task.is_real_time() {
            let old_priority = task.demote(state.bank.lowest_level());
            if let Some(unit) = task.unit() {
                self.provider.suspend(unit)?;
            }
            task.enter_ready(now);
            let event = Event::suspended(now, &task, old_priority);
            let level = task.priority();
            let levels = state.bank.levels();
            state
                .bank
                .enqueue(level, task)
                .map_err(|task| SchedulerError::PriorityOutOfRange {
                    priority: task.priority(),
                    levels,
                })?;
            self.sink.emit(&event);
        } else {
            state.current = Some(task);
        }
        Ok(())
    }
}

fn pace(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
