use super::{
    dispatcher::{SchedulerSnapshot, TaskView},
    events::{Event, EventLog, EventSink},
    report::SimulationReport,
    runner::RunnerEvent,
    TaskId,
};
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEvent},
    execute, queue,
    style::{self, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::{
    io::{self, Stdout, Write},
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};
use tracing::warn;
use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Terminal,
};

/// 256-colour palette cycled by task id so interleaved tasks stay apart.
const TASK_PALETTE: [u8; 14] = [11, 12, 9, 10, 14, 13, 208, 129, 37, 205, 118, 94, 54, 19];

pub fn task_color_index(id: TaskId) -> u8 {
    TASK_PALETTE[id as usize % TASK_PALETTE.len()]
}

/// Writes one line per event, coloured by task. The first write failure is
/// kept and every later event is dropped.
pub struct ConsoleSink<W: Write = Stdout> {
    out: W,
    color: bool,
    error: Option<io::Error>,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            error: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Returns the write failure that stopped output, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn write_event(&mut self, event: &Event) -> io::Result<()> {
        if self.color {
            let color = style::Color::AnsiValue(task_color_index(event.task_id));
            queue!(
                self.out,
                SetForegroundColor(color),
                Print(event),
                ResetColor,
                Print("\n")
            )?;
        } else {
            writeln!(self.out, "{event}")?;
        }
        self.out.flush()
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: &Event) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_event(event) {
            warn!(%err, "event output failed, dropping further lines");
            self.error = Some(err);
        }
    }
}

pub enum DisplayEvent {
    Input(KeyEvent),
    Tick,
}

/// Full-screen dashboard: the running task, the ready queues and the most
/// recent transitions.
pub struct DisplayTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    input_rx: Receiver<DisplayEvent>,
}

impl DisplayTerminal {
    pub fn new(tick_rate: Duration) -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        execute!(io::stdout(), Clear(ClearType::All))?;

        // Input thread: forwards key presses and emits a tick every `tick_rate`
        let (input_tx, input_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);

                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(TermEvent::Key(key)) => {
                            if input_tx.send(DisplayEvent::Input(key)).is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(_) => return,
                    },
                    Ok(false) => {}
                    Err(_) => return,
                }

                if last_tick.elapsed() >= tick_rate {
                    if input_tx.send(DisplayEvent::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal, input_rx })
    }

    pub fn draw(
        &mut self,
        snapshot: &SchedulerSnapshot,
        log: &EventLog,
        report: &SimulationReport,
        status: &str,
    ) -> io::Result<()> {
        self.terminal
            .draw(|f| {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(3),
                    ])
                    .split(f.size());
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .split(rows[1]);

                let current = Paragraph::new(match snapshot.current {
                    Some(task) => format!(
                        "t={} | T{} | priority {} | remaining {} s",
                        snapshot.clock, task.id, task.priority, task.remaining
                    ),
                    None => format!("t={} | CPU idle", snapshot.clock),
                })
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .fg(Color::LightBlue),
                )
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Current Task")
                        .border_type(BorderType::Rounded),
                );
                f.render_widget(current, rows[0]);

                let ready = snapshot.ready.iter().map(ready_row);
                let table = Table::new(ready)
                    .header(
                        Row::new(vec!["ID", "|", "Level", "|", "Left", "|", "Waited"])
                            .style(Style::default().add_modifier(Modifier::BOLD)),
                    )
                    .widths(&[
                        Constraint::Length(5),
                        Constraint::Length(1),
                        Constraint::Length(5),
                        Constraint::Length(1),
                        Constraint::Length(5),
                        Constraint::Length(1),
                        Constraint::Length(6),
                    ])
                    .block(
                        Block::default()
                            .title(ready_title(snapshot))
                            .borders(Borders::ALL),
                    )
                    .column_spacing(1);
                f.render_widget(table, columns[0]);

                let events: Vec<ListItem> = log
                    .recent()
                    .map(|event| {
                        ListItem::new(event.to_string()).style(
                            Style::default().fg(Color::Indexed(task_color_index(event.task_id))),
                        )
                    })
                    .collect();
                let events = List::new(events)
                    .block(Block::default().title("Events").borders(Borders::ALL));
                f.render_widget(events, columns[1]);

                let footer = Paragraph::new(format!(
                    "{status} | {report} | q quit  p pause  r resume  s step"
                ))
                .style(Style::default().fg(Color::LightGreen))
                .block(Block::default().borders(Borders::ALL));
                f.render_widget(footer, rows[2]);
            })
            .map(|_| ())
    }

    pub fn get_input(&self) -> RunnerEvent {
        let Ok(event) = self.input_rx.recv() else {
            // The input thread only exits when the terminal is unusable
            return RunnerEvent::Quit;
        };
        match event {
            DisplayEvent::Input(key) if key.modifiers.is_empty() => match key.code {
                KeyCode::Char('q') => RunnerEvent::Quit,
                KeyCode::Char('p') => RunnerEvent::Pause,
                KeyCode::Char('r') => RunnerEvent::Resume,
                KeyCode::Char('s') => RunnerEvent::Step,
                _ => RunnerEvent::None,
            },
            _ => RunnerEvent::None,
        }
    }
}

impl Drop for DisplayTerminal {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), Clear(ClearType::All));
    }
}

fn ready_title(snapshot: &SchedulerSnapshot) -> String {
    let mut title = format!(
        "Ready Queues ({} ready, {} pending",
        snapshot.ready.len(),
        snapshot.pending
    );
    if let Some(arrival) = snapshot.next_arrival {
        title.push_str(&format!(", next at t={arrival}"));
    }
    title.push(')');
    title
}

fn ready_row(task: &TaskView) -> Row<'static> {
    Row::new(vec![
        Cell::from(format!("{:04}", task.id)).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("|"),
        Cell::from(task.priority.to_string()),
        Cell::from("|"),
        Cell::from(task.remaining.to_string()),
        Cell::from("|"),
        Cell::from(task.waited.to_string()),
    ])
    .style(Style::default().fg(Color::Indexed(task_color_index(task.id))))
}
