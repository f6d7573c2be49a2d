//! TUI application state and main loop

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::events::InputMode;
use super::ui;
use crate::catalog::default_command;
use crate::error::LensError;
use crate::view::{AppRequest, Dispatch, Exporter, KeyOutcome, Router};
use crate::Config;

/// Maximum number of history entries to persist
const MAX_HISTORY_SIZE: usize = 1000;

/// Main application state
pub struct App {
    /// Current prompt buffer
    pub input: String,
    /// Cursor position in input
    pub cursor_position: usize,
    pub input_mode: InputMode,
    /// Command history
    pub history: Vec<String>,
    /// Current position in history (for navigation)
    pub history_index: Option<usize>,
    /// Status message
    pub status_message: Option<(String, Instant)>,
    pub should_quit: bool,
    router: Router,
    exporter: Option<Arc<dyn Exporter>>,
    status_ttl: Duration,
    history_path: PathBuf,
}

impl App {
    pub fn new(router: Router, config: &Config, exporter: Option<Arc<dyn Exporter>>) -> Self {
        let history_path = config.history_file();
        let history = Self::load_history(&history_path).unwrap_or_default();
        Self {
            input: String::new(),
            cursor_position: 0,
            input_mode: InputMode::Normal,
            history,
            history_index: None,
            status_message: None,
            should_quit: false,
            router,
            exporter,
            status_ttl: config.status_ttl(),
            history_path,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    fn load_history(path: &Path) -> Result<Vec<String>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = io::BufReader::new(std::fs::File::open(path)?);
        let mut history: Vec<String> = reader
            .lines()
            .map_while(|line| line.ok())
            .filter(|line| !line.is_empty())
            .collect();
        let excess = history.len().saturating_sub(MAX_HISTORY_SIZE);
        history.drain(..excess);
        Ok(history)
    }

    /// Persist the most recent prompt commands, one per line
    pub fn save_history(&self) -> Result<()> {
        if let Some(parent) = self.history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&self.history_path)
            .with_context(|| format!("cannot write {}", self.history_path.display()))?;

        let start = self.history.len().saturating_sub(MAX_HISTORY_SIZE);
        for entry in &self.history[start..] {
            writeln!(file, "{}", entry)?;
        }
        Ok(())
    }

    fn prompt_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Byte offset of the cursor; the cursor counts chars
    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor_position += 1;
    }

    fn backspace(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let at = self.byte_index();
        self.input.remove(at);
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.history_index = None;
    }

    fn recall(&mut self, index: Option<usize>) {
        self.history_index = index;
        self.input = index.map(|i| self.history[i].clone()).unwrap_or_default();
        self.cursor_position = self.prompt_len();
    }

    /// Step back through prompt history, stopping at the oldest entry
    fn history_previous(&mut self) {
        let index = match self.history_index {
            None if !self.history.is_empty() => self.history.len() - 1,
            Some(i) if i > 0 => i - 1,
            _ => return,
        };
        self.recall(Some(index));
    }

    /// Step forward; past the newest entry the prompt is empty again
    fn history_next(&mut self) {
        if let Some(i) = self.history_index {
            self.recall(Some(i + 1).filter(|&next| next < self.history.len()));
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some((msg.to_string(), Instant::now()));
    }

    /// Open the view for the session's cloud, replacing anything above the root
    pub fn start(&mut self) {
        let command = default_command(self.router.session().cloud);
        if let Err(e) = self.router.run(command, "", true) {
            tracing::warn!("Default command '{}' failed: {}", command, e);
            self.set_status(&e.to_string());
        }
    }

    /// Run the prompt contents and return to normal mode
    pub fn execute_input(&mut self) {
        let input = self.input.trim().to_string();
        self.clear_input();
        self.input_mode = InputMode::Normal;
        if input.is_empty() {
            return;
        }

        if self.history.last() != Some(&input) {
            self.history.push(input.clone());
        }
        self.run_command(&input);
    }

    pub fn run_command(&mut self, command: &str) {
        match self.router.run(command, "", false) {
            Ok(Dispatch::Quit) => self.should_quit = true,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Command '{}' rejected: {}", command, e);
                self.set_status(&e.to_string());
            }
        }
    }

    /// Carry out something a view asked for
    pub fn handle_request(&mut self, request: AppRequest) {
        match request {
            AppRequest::Help => self.run_command("help"),
            AppRequest::Back => match self.router.stack().pop() {
                Ok(_) => {}
                Err(LensError::RootFrame) => self.set_status("Already at the root view"),
                Err(e) => self.set_status(&e.to_string()),
            },
            AppRequest::Quit => self.should_quit = true,
            AppRequest::Command(command) => self.run_command(&command),
            AppRequest::Open { resource, path } => {
                if let Err(e) = self.router.open(&resource, &path, false) {
                    self.set_status(&e.to_string());
                }
            }
            AppRequest::Export => self.export(),
            AppRequest::Flash(msg) => self.set_status(&msg),
        }
    }

    fn export(&mut self) {
        let Some(exporter) = self.exporter.clone() else {
            self.set_status("export unavailable");
            return;
        };
        let session = self.router.session().clone();
        let result = self.router.stack().with_top(|component| match component.table() {
            Some(table) => exporter
                .export(component.name(), &table.model().columns, &table.model().rows, &session)
                .map(Some),
            None => Ok(None),
        });
        match result {
            Some(Ok(Some(msg))) => self.set_status(&msg),
            Some(Ok(None)) | None => self.set_status("Nothing to export"),
            Some(Err(e)) => self.set_status(&format!("Export failed: {}", e)),
        }
    }

    /// Dispatch one key press according to the input mode
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Command => self.handle_command_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char(':') => {
                self.clear_input();
                self.input_mode = InputMode::Command;
            }
            _ => {
                let outcome = self.router.stack().with_top(|component| component.handle_key(key));
                if let Some(KeyOutcome::Request(request)) = outcome {
                    self.handle_request(request);
                }
            }
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') if key.code == KeyCode::Esc || ctrl => {
                self.clear_input();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => self.execute_input(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Left => self.cursor_position = self.cursor_position.saturating_sub(1),
            KeyCode::Right => self.cursor_position = (self.cursor_position + 1).min(self.prompt_len()),
            KeyCode::Up => self.history_previous(),
            KeyCode::Down => self.history_next(),
            _ => {}
        }
    }

    /// Periodic work: apply refresh results to the active view and expire the status
    pub fn on_tick(&mut self) {
        self.router.stack().with_top(|component| component.tick());
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > self.status_ttl {
                self.status_message = None;
            }
        }
    }

    /// Stop background work
    pub fn shutdown(&self) {
        self.router.context().shutdown.cancel();
        self.router.stack().stop_all();
    }
}

/// Run the TUI application
pub async fn run(router: Router, config: &Config, exporter: Option<Arc<dyn Exporter>>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(router, config, exporter);
    app.start();

    // Main loop
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let outcome: Result<()> = loop {
        if let Err(e) = terminal.draw(|f| ui::draw(f, &mut app)) {
            break Err(e.into());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            app.on_tick();
        }

        if app.should_quit {
            break Ok(());
        }
    };

    app.shutdown();
    if let Err(e) = app.save_history() {
        tracing::warn!("Failed to save history: {}", e);
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    outcome
}
