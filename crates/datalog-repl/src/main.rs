//! Interactive Datalog shell.
//!
//! Statements end with `.` (assert), `~` (retract), or `?` (query). Files
//! named on the command line are bulk-loaded before the prompt appears.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use datalog_core::Equals;
use datalog_engine::{Engine, Report, Response};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

struct App {
    engine: Engine,
    input: String,
    cursor_pos: usize,
    history: Vec<HistoryEntry>,
    scroll_offset: usize,
    show_help: bool,
    totals: Report,
}

struct HistoryEntry {
    statement: String,
    result: String,
    is_error: bool,
}

impl App {
    fn new() -> Self {
        let mut engine = Engine::new();
        engine.register_primitive(Equals::pred());
        Self {
            engine,
            input: String::new(),
            cursor_pos: 0,
            history: Vec::new(),
            scroll_offset: 0,
            show_help: false,
            totals: Report::default(),
        }
    }

    fn load_file(&mut self, path: &str) {
        let entry = match std::fs::read_to_string(path) {
            Ok(text) => match self.engine.batch(path, &text) {
                Ok((assertions, retractions)) => HistoryEntry {
                    statement: format!("load {}", path),
                    result: format!("{} assertions, {} retractions", assertions, retractions),
                    is_error: false,
                },
                Err(error) => HistoryEntry {
                    statement: format!("load {}", path),
                    result: error.to_string(),
                    is_error: true,
                },
            },
            Err(error) => HistoryEntry {
                statement: format!("load {}", path),
                result: error.to_string(),
                is_error: true,
            },
        };
        self.history.push(entry);
    }

    fn execute_input(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        let input = self.input.clone();
        let (report, responses) = self.engine.process("repl", &input);
        self.totals.assertions += report.assertions;
        self.totals.retractions += report.retractions;
        self.totals.queries += report.queries;
        self.totals.errors += report.errors;

        for response in responses {
            self.history.push(match response {
                Response::Asserted { clause } => HistoryEntry {
                    statement: format!("Assert: {}", clause),
                    result: "OK".to_string(),
                    is_error: false,
                },
                Response::Retracted { clause, removed } => HistoryEntry {
                    statement: format!("Retract: {}", clause),
                    result: format!("OK, removed {}", removed),
                    is_error: false,
                },
                Response::Resolved { query, answers } => HistoryEntry {
                    statement: format!("Query: {}", query),
                    result: answers.to_string(),
                    is_error: false,
                },
                Response::Failed { statement, error } => HistoryEntry {
                    statement,
                    result: error.to_string(),
                    is_error: true,
                },
            });
        }

        self.input.clear();
        self.cursor_pos = 0;
        self.scroll_offset = 0;
    }

    fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    fn delete_char(&mut self) {
        if self.cursor_pos > 0 {
            let previous = self.input[..self.cursor_pos]
                .chars()
                .next_back()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor_pos -= previous;
            self.input.remove(self.cursor_pos);
        }
    }

    fn delete_char_forward(&mut self) {
        if self.cursor_pos < self.input.len() {
            self.input.remove(self.cursor_pos);
        }
    }

    fn move_cursor_left(&mut self) {
        if self.cursor_pos > 0 {
            let previous = self.input[..self.cursor_pos]
                .chars()
                .next_back()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor_pos -= previous;
        }
    }

    fn move_cursor_right(&mut self) {
        if self.cursor_pos < self.input.len() {
            let next = self.input[self.cursor_pos..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor_pos += next;
        }
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }
}

fn main() -> Result<()> {
    let mut app = App::new();
    for path in std::env::args().skip(1) {
        app.load_file(&path);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        if let Event::Key(key) = event::read()? {
            if app.show_help {
                app.show_help = false;
                continue;
            }
            let control = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if control => return Ok(()),
                KeyCode::Char('h') if control => app.show_help = true,
                KeyCode::Char('u') if control => app.clear_input(),
                KeyCode::Enter => app.execute_input(),
                KeyCode::Backspace => app.delete_char(),
                KeyCode::Delete => app.delete_char_forward(),
                KeyCode::Left => app.move_cursor_left(),
                KeyCode::Right => app.move_cursor_right(),
                KeyCode::Home => app.cursor_pos = 0,
                KeyCode::End => app.cursor_pos = app.input.len(),
                KeyCode::Up => app.scroll_offset += 1,
                KeyCode::Down => app.scroll_offset = app.scroll_offset.saturating_sub(1),
                KeyCode::Char(c) => app.insert_char(c),
                _ => {}
            }
        }
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_history(frame, app, chunks[0]);
    draw_input(frame, app, chunks[1]);
    draw_status(frame, app, chunks[2]);

    if app.show_help {
        draw_help(frame);
    }
}

fn draw_history(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for entry in &app.history {
        lines.push(Line::from(Span::styled(
            entry.statement.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let style = if entry.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        for result_line in entry.result.lines() {
            lines.push(Line::from(Span::styled(result_line.to_string(), style)));
        }
        lines.push(Line::from(""));
    }

    let visible = area.height.saturating_sub(2) as usize;
    let top = lines
        .len()
        .saturating_sub(visible)
        .saturating_sub(app.scroll_offset);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" datalog "))
        .wrap(Wrap { trim: false })
        .scroll((top as u16, 0));
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let paragraph = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(" statement "));
    frame.render_widget(paragraph, area);

    let cursor_column = app.input[..app.cursor_pos].chars().count() as u16;
    frame.set_cursor_position((area.x + 1 + cursor_column, area.y + 1));
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = format!(
        " {} asserted | {} retracted | {} queried | {} errors | ctrl-h help | esc quit",
        app.totals.assertions, app.totals.retractions, app.totals.queries, app.totals.errors
    );
    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn draw_help(frame: &mut Frame) {
    let text = vec![
        Line::from("ancestor(alice, bob).       assert a fact"),
        Line::from("path(X, Z) :- edge(X, Y), path(Y, Z).   assert a rule"),
        Line::from("ancestor(alice, bob)~       retract all matching clauses"),
        Line::from("ancestor(X, Y)?             query"),
        Line::from("% comment to end of line"),
        Line::from(""),
        Line::from("enter: run | ctrl-u: clear | up/down: scroll | esc: quit"),
        Line::from(""),
        Line::from("press any key to close"),
    ];
    let area = centered(70, 13, frame.area());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(" help "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
