//! Help screen: services for the current cloud, the keys of the view it was opened
//! from, and list navigation

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, Frame};

use super::actions::{Key, KeyAction, KeyActions};
use super::component::{AppRequest, Component, KeyOutcome, MenuHint, ViewContext};
use super::table::Table;
use crate::error::LensResult;
use crate::source::{Column, Row, StaticSource};

pub const HELP_VIEW: &str = "help";

const NAVIGATION: &[(&str, &str)] = &[
    ("j/down", "Down"),
    ("k/up", "Up"),
    ("g/home", "Top"),
    ("G/end", "Bottom"),
    ("ctrl-f/pgdn", "Page Down"),
    ("ctrl-b/pgup", "Page Up"),
    (":", "Command"),
    ("esc", "Back"),
    ("ctrl-c", "Quit"),
];

fn section_rows(section: &str, hints: &[MenuHint]) -> Vec<Row> {
    hints
        .iter()
        .map(|hint| vec![section.to_string(), hint.mnemonic.clone(), hint.description.clone()])
        .collect()
}

pub struct Help {
    table: Table,
}

impl Help {
    /// `general` are the key hints of the view underneath
    pub fn new(services: &[MenuHint], general: &[MenuHint]) -> Self {
        let navigation: Vec<MenuHint> = NAVIGATION.iter().map(|(k, d)| MenuHint::new(k, d)).collect();

        let mut rows = section_rows("SERVICES", services);
        rows.extend(section_rows("GENERAL", general));
        rows.extend(section_rows("NAVIGATION", &navigation));

        let columns = vec![Column::new("Section"), Column::new("Key"), Column::new("Description")];
        let source = StaticSource::new(columns, rows.clone());
        let mut table = Table::new(HELP_VIEW, "", Arc::new(source));
        table.model_mut().set_rows(rows);
        table.add_bind_keys_fn(Arc::new(|actions: &mut KeyActions| {
            actions.delete(&[Key::char('z'), Key::char('?')]);
            actions.insert(
                Key::plain(KeyCode::Esc),
                KeyAction::new("Back", |_, _| KeyOutcome::Request(AppRequest::Back), true),
            );
        }));
        Self { table }
    }
}

impl Component for Help {
    fn name(&self) -> &str {
        HELP_VIEW
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
        self.table.draw(f, area, "Help");
    }
}
