//! The contract every view on the navigation stack implements

use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use tokio_util::sync::CancellationToken;

use super::table::Table;
use crate::error::LensResult;
use crate::session::Session;
use crate::source::{Column, Row};
use crate::Config;

/// Something a view asks the application to do on its behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRequest {
    /// Open the help view
    Help,
    /// Pop the current view
    Back,
    /// Leave the interactive loop
    Quit,
    /// Run a command line as if typed at the prompt
    Command(String),
    /// Open a resource directly, skipping alias resolution
    Open { resource: String, path: String },
    /// Hand the current table to the exporter
    Export,
    /// Show a status message
    Flash(String),
}

/// Result of offering a key to a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// The key is not bound; the caller may apply its own behavior
    Ignored,
    Request(AppRequest),
}

/// One entry of the help screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuHint {
    pub mnemonic: String,
    pub description: String,
}

impl MenuHint {
    pub fn new(mnemonic: &str, description: &str) -> Self {
        Self {
            mnemonic: mnemonic.to_string(),
            description: description.to_string(),
        }
    }
}

/// Everything a component needs at init time
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub session: Session,
    pub refresh_rate: Duration,
    pub max_backoff_ticks: u32,
    /// Fires when the application shuts down; handed to every fetch
    pub shutdown: CancellationToken,
}

impl ViewContext {
    pub fn new(session: Session, config: &Config, shutdown: CancellationToken) -> Self {
        Self {
            session,
            refresh_rate: config.refresh_rate(),
            max_backoff_ticks: config.max_backoff_ticks,
            shutdown,
        }
    }
}

/// Receives a table snapshot when the user asks for an export
pub trait Exporter: Send + Sync {
    /// Returns a message describing where the data went
    fn export(&self, name: &str, columns: &[Column], rows: &[Row], session: &Session) -> LensResult<String>;
}

/// A stateful view with an init/start/stop lifecycle
pub trait Component: Send {
    fn name(&self) -> &str;

    fn title(&self) -> String {
        self.name().to_string()
    }

    /// Prepare the component. Called once, before it becomes visible.
    fn init(&mut self, ctx: &ViewContext) -> LensResult<()>;

    /// Become the active view
    fn start(&mut self);

    /// Stop background work; the component may be started again later
    fn stop(&mut self);

    fn hints(&self) -> Vec<MenuHint>;

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome;

    /// Apply pending background results. Runs on the interactive thread.
    fn tick(&mut self) {}

    fn table(&self) -> Option<&Table> {
        None
    }

    fn table_mut(&mut self) -> Option<&mut Table> {
        None
    }

    fn draw(&mut self, f: &mut Frame, area: Rect);
}
