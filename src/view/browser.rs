//! Default generic resource browser

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, Frame};

use super::actions::{Key, KeyAction, KeyActions};
use super::component::{AppRequest, Component, KeyOutcome, MenuHint, ViewContext};
use super::registry::ViewFactory;
use super::table::Table;
use crate::error::LensResult;
use crate::source::{DataSource, DataSources, Target};

/// A table over one resource, with `esc` to go back
pub struct Browser {
    table: Table,
}

impl Browser {
    pub fn new(resource: &str, path: &str, source: Arc<dyn DataSource>) -> Self {
        let mut table = Table::new(resource, path, source);
        table.add_bind_keys_fn(Arc::new(|actions: &mut KeyActions| {
            actions.insert(
                Key::plain(KeyCode::Esc),
                KeyAction::new("Back", |_, _| KeyOutcome::Request(AppRequest::Back), true),
            );
        }));
        Self { table }
    }
}

impl Component for Browser {
    fn name(&self) -> &str {
        self.table.resource()
    }

    fn title(&self) -> String {
        if self.table.path().is_empty() {
            self.table.resource().to_string()
        } else {
            format!("{}({})", self.table.resource(), self.table.path())
        }
    }

    fn init(&mut self, ctx: &ViewContext) -> LensResult<()> {
        self.table.init(ctx)
    }

    fn start(&mut self) {
        self.table.start();
    }

    fn stop(&mut self) {
        self.table.stop();
    }

    fn hints(&self) -> Vec<MenuHint> {
        self.table.hints()
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        self.table.handle_key(key)
    }

    fn tick(&mut self) {
        self.table.pump();
    }

    fn table(&self) -> Option<&Table> {
        Some(&self.table)
    }

    fn table_mut(&mut self) -> Option<&mut Table> {
        Some(&mut self.table)
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let title = self.title();
        self.table.draw(f, area, &title);
    }
}

/// Factory building a [`Browser`] over whatever source the catalog has for the target
pub fn browser_factory(sources: DataSources) -> ViewFactory {
    Arc::new(move |target: &Target<'_>| match sources.open(target) {
        Ok(source) => Some(Box::new(Browser::new(target.resource, target.path, source)) as Box<dyn Component>),
        Err(e) => {
            tracing::warn!("No data source for {}: {}", target.resource, e);
            None
        }
    })
}
