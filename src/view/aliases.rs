//! Alias table view. Serves as the root frame and as the `aliases` resource.

use std::sync::Arc;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, Frame};
use tokio_util::sync::CancellationToken;

use super::actions::{Key, KeyAction, KeyActions};
use super::component::{AppRequest, Component, KeyOutcome, MenuHint, ViewContext};
use super::table::{EnterContext, Table};
use crate::alias::AliasStore;
use crate::error::LensResult;
use crate::source::{Column, DataSource, Row};

pub const ALIAS_VIEW: &str = "aliases";

/// Reads the merged alias table on every fetch, so a reset shows up on the next tick
pub struct AliasSource {
    store: Arc<AliasStore>,
}

impl AliasSource {
    pub fn new(store: Arc<AliasStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DataSource for AliasSource {
    fn columns(&self) -> Vec<Column> {
        vec![Column::new("Mnemonic"), Column::new("Resource"), Column::new("Origin")]
    }

    async fn fetch(&self, _cancel: CancellationToken) -> LensResult<Vec<Row>> {
        Ok(self
            .store
            .list()
            .into_iter()
            .map(|alias| vec![alias.mnemonic, alias.resource, alias.origin.to_string()])
            .collect())
    }
}

pub struct AliasView {
    table: Table,
}

impl AliasView {
    pub fn new(store: Arc<AliasStore>) -> Self {
        let mut table = Table::new(ALIAS_VIEW, "", Arc::new(AliasSource::new(store)));
        table.set_enter_fn(Arc::new(|ctx: &EnterContext<'_>| {
            ctx.row.first().map(|mnemonic| AppRequest::Command(mnemonic.clone()))
        }));
        table.add_bind_keys_fn(Arc::new(|actions: &mut KeyActions| {
            actions.insert(
                Key::plain(KeyCode::Esc),
                KeyAction::new("Back", |_, _| KeyOutcome::Request(AppRequest::Back), true),
            );
        }));
        Self { table }
    }
}

impl Component for AliasView {
    fn name(&self) -> &str {
        ALIAS_VIEW
    }

    fn title(&self) -> String {
        "Aliases".to_string()
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
        self.table.draw(f, area, "Aliases");
    }
}
