use super::{
    dispatcher::{Dispatcher, TickOutcome},
    display::DisplayTerminal,
    events::EventLog,
    report::SimulationReport,
    units::ExecutionProvider,
};
use crate::error::SchedulerError;
use std::{io, thread, time::Duration};

pub enum RunnerEvent {
    Quit,
    Pause,
    Resume,
    Step,
    None,
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

/// Drives a dispatcher one tick per dashboard refresh, with pause and
/// single-step controls.
pub struct SimulationRunner<P> {
    terminal: DisplayTerminal,
    dispatcher: Dispatcher<P, EventLog>,
    paused: bool,
    finished: bool,
}

impl<P: ExecutionProvider> SimulationRunner<P> {
    pub fn new(
        dispatcher: Dispatcher<P, EventLog>,
        tick_rate: Duration,
    ) -> Result<Self, RunnerError> {
        let terminal = DisplayTerminal::new(tick_rate)?;

        Ok(Self {
            terminal,
            dispatcher,
            paused: false,
            finished: false,
        })
    }

    pub fn report(&self) -> SimulationReport {
        self.dispatcher.report()
    }

    fn step(&mut self) -> Result<(), SchedulerError> {
        if !self.finished && self.dispatcher.tick()? == TickOutcome::Finished {
            self.finished = true;
        }
        Ok(())
    }

    fn draw(&mut self) -> io::Result<()> {
        let status = if self.finished {
            "finished"
        } else if self.paused {
            "paused"
        } else {
            "running"
        };
        self.terminal.draw(
            &self.dispatcher.snapshot(),
            self.dispatcher.sink(),
            &self.dispatcher.report(),
            status,
        )
    }

    // Returns false if the program should quit
    pub fn run(&mut self) -> Result<bool, RunnerError> {
        if !self.paused {
            self.step()?;
        }
        self.draw()?;

        if self.finished {
            thread::sleep(self.dispatcher.config().drain_delay);
            return Ok(false);
        }

        match self.terminal.get_input() {
            RunnerEvent::Quit => return Ok(false),
            RunnerEvent::Pause if !self.paused => self.paused = true,
            RunnerEvent::Resume if self.paused => self.paused = false,
            RunnerEvent::Step if self.paused => {
                self.step()?;
                self.draw()?;
            }
            _ => {}
        }
        Ok(true)
    }
}
