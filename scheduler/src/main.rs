use clap::{ArgAction, Parser};
use feedback_queue_scheduler::{
    config::{SimulationConfig, DEFAULT_DRAIN_DELAY_MS, DEFAULT_QUANTUM_MS},
    load_tasks,
    scheduler::{
        ConsoleSink, Dispatcher, EventLog, EventSink, RunnerError, SimulatedUnits,
        SimulationRunner,
    },
    tracing_setup::{init_subscriber, Verbosity},
    LoadError, SchedulerError, SimulationReport, TaskSpec,
};
use std::{io, path::PathBuf, process::ExitCode, time::Duration};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "mlfq-sim", version, about = "Multi-level feedback queue scheduling simulator")]
struct Cli {
    /// Task file with `arrival, priority, duration` records
    #[arg(default_value = "giris.txt")]
    input: PathBuf,

    /// Number of priority levels, real-time level included
    #[arg(long, default_value_t = SimulationConfig::default().levels)]
    levels: u32,

    /// Ticks a non-real-time task may wait before it is evicted
    #[arg(long, default_value_t = SimulationConfig::default().starvation_threshold)]
    starvation_threshold: u64,

    /// Wall-clock length of one tick in milliseconds
    #[arg(long, default_value_t = DEFAULT_QUANTUM_MS)]
    quantum_ms: u64,

    /// Pause after the last task leaves, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DRAIN_DELAY_MS)]
    drain_ms: u64,

    /// Show a live dashboard instead of event lines
    #[arg(long, action = ArgAction::SetTrue)]
    tui: bool,

    /// Disable coloured output
    #[arg(long, action = ArgAction::SetTrue)]
    no_color: bool,

    /// Increase log verbosity
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        SimulationConfig::default()
            .with_levels(self.levels)
            .with_starvation_threshold(self.starvation_threshold)
            .with_quantum(Duration::from_millis(self.quantum_ms))
            .with_drain_delay(Duration::from_millis(self.drain_ms))
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("cannot write event output: {0}")]
    Output(#[source] io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Load(_) | CliError::Scheduler(SchedulerError::Config(_)) => 1,
            _ => 2,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Log lines would tear the dashboard apart
    let verbosity = if cli.tui {
        Verbosity::Quiet
    } else {
        Verbosity::from_flags(cli.verbose, cli.quiet)
    };
    init_subscriber(verbosity, cli.no_color);

    match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "simulation aborted");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<SimulationReport, CliError> {
    let tasks = load_tasks(&cli.input)?;
    let mut config = cli.config();

    if cli.tui {
        // The dashboard paces the ticks itself
        let tick_rate = config.quantum;
        config.quantum = Duration::ZERO;
        let dispatcher = Dispatcher::new(config, SimulatedUnits::new(), EventLog::default())?;
        submit_all(&dispatcher, &tasks)?;

        let mut runner = SimulationRunner::new(dispatcher, tick_rate)?;
        while runner.run()? {}
        return Ok(runner.report());
    }

    let sink = ConsoleSink::stdout(!cli.no_color);
    let mut dispatcher = Dispatcher::new(config, SimulatedUnits::new(), sink)?;
    submit_all(&dispatcher, &tasks)?;
    let report = dispatcher.run()?;

    let (_, mut sink) = dispatcher.into_parts();
    match sink.take_error() {
        Some(err) => Err(CliError::Output(err)),
        None => Ok(report),
    }
}

fn submit_all<S: EventSink>(
    dispatcher: &Dispatcher<SimulatedUnits, S>,
    tasks: &[TaskSpec],
) -> Result<(), SchedulerError> {
    let mut loaded = 0;
    for spec in tasks {
        match dispatcher.submit(*spec) {
            Ok(_) => loaded += 1,
            Err(err @ SchedulerError::PriorityOutOfRange { .. }) => {
                warn!(%err, arrival = spec.arrival_time, "task skipped");
            }
            Err(err) => return Err(err),
        }
    }
    info!(loaded, "tasks loaded");
    Ok(())
}
