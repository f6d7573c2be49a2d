//! Generic tabular viewer: rows, key actions and a background refresher

use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row as TableRow, Table as TableWidget, TableState},
    Frame,
};

use super::actions::{Key, KeyAction, KeyActions};
use super::component::{AppRequest, KeyOutcome, MenuHint, ViewContext};
use super::refresh::{RefreshStats, Refresher};
use crate::error::{LensError, LensResult};
use crate::session::Session;
use crate::source::{Column, DataSource, Row};

/// What an enter handler gets to look at
pub struct EnterContext<'a> {
    pub resource: &'a str,
    pub path: &'a str,
    pub row: &'a Row,
    pub session: &'a Session,
}

/// Row activation behavior
pub type EnterFn = Arc<dyn Fn(&EnterContext<'_>) -> Option<AppRequest> + Send + Sync>;

/// Layers extra bindings over the base set at init
pub type BindKeysFn = Arc<dyn Fn(&mut KeyActions) + Send + Sync>;

/// Rows and cursor state, mutated only on the interactive thread
#[derive(Debug, Default)]
pub struct TableModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub selected: usize,
    pub wide: bool,
    /// Last refresh error; rows from the previous success stay visible
    pub error: Option<String>,
    pub last_update: Option<Instant>,
    entered: bool,
}

impl TableModel {
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.error = None;
        self.last_update = Some(Instant::now());
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn toggle_wide(&mut self) {
        self.wide = !self.wide;
    }

    pub fn select_next(&mut self) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + 1).min(self.rows.len() - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }

    /// Indices of the columns shown in the current mode
    pub fn visible_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| self.wide || !c.wide)
            .map(|(i, _)| i)
            .collect()
    }

    /// Mark that the user drilled in from this table
    pub fn mark_entered(&mut self) {
        self.entered = true;
    }

    fn take_entered(&mut self) -> bool {
        std::mem::take(&mut self.entered)
    }
}

/// Number of rows a page jump moves
const PAGE_ROWS: usize = 10;

pub struct Table {
    resource: String,
    path: String,
    source: Arc<dyn DataSource>,
    model: TableModel,
    actions: KeyActions,
    enter_fn: Option<EnterFn>,
    bind_keys_fn: Vec<BindKeysFn>,
    refresher: Option<Refresher>,
    session: Session,
    state: TableState,
}

impl Table {
    pub fn new(resource: &str, path: &str, source: Arc<dyn DataSource>) -> Self {
        let model = TableModel {
            columns: source.columns(),
            ..Default::default()
        };
        Self {
            resource: resource.to_string(),
            path: path.to_string(),
            source,
            model,
            actions: KeyActions::new(),
            enter_fn: None,
            bind_keys_fn: Vec::new(),
            refresher: None,
            session: Session::default(),
            state: TableState::default(),
        }
    }

    pub fn init(&mut self, ctx: &ViewContext) -> LensResult<()> {
        let refresher = Refresher::new(
            Arc::clone(&self.source),
            ctx.refresh_rate,
            ctx.max_backoff_ticks,
            ctx.shutdown.clone(),
        )
        .map_err(|e| LensError::Init {
            component: self.resource.clone(),
            reason: e.to_string(),
        })?;
        self.refresher = Some(refresher);
        self.session = ctx.session.clone();
        self.bind_keys();
        Ok(())
    }

    /// Resume refreshing. The first start and a return from a drill-in fetch right away.
    pub fn start(&mut self) {
        let force = self.model.last_update.is_none() || self.model.take_entered();
        if let Some(refresher) = self.refresher.as_mut() {
            refresher.start();
            if force {
                refresher.force();
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(refresher) = self.refresher.as_mut() {
            refresher.stop();
        }
    }

    /// Specify the row activation behavior. Takes effect at init.
    pub fn set_enter_fn(&mut self, f: EnterFn) {
        self.enter_fn = Some(f);
    }

    /// Add key bindings applied at init, in registration order
    pub fn add_bind_keys_fn(&mut self, f: BindKeysFn) {
        self.bind_keys_fn.push(f);
    }

    /// Fetch now unless a fetch is already running
    pub fn refresh_now(&self) -> bool {
        self.refresher.as_ref().is_some_and(|r| r.force())
    }

    fn bind_keys(&mut self) {
        let mut actions = KeyActions::new();
        actions.insert(
            Key::ctrl('w'),
            KeyAction::new(
                "Toggle Wide",
                |model, _| {
                    model.toggle_wide();
                    KeyOutcome::Handled
                },
                false,
            ),
        );
        actions.insert(
            Key::char('?'),
            KeyAction::new("Help", |_, _| KeyOutcome::Request(AppRequest::Help), true),
        );
        actions.insert(
            Key::char('z'),
            KeyAction::new("CSV", |_, _| KeyOutcome::Request(AppRequest::Export), true),
        );

        if let Some(enter) = self.enter_fn.clone() {
            let resource = self.resource.clone();
            let path = self.path.clone();
            let session = self.session.clone();
            actions.insert(
                Key::plain(KeyCode::Enter),
                KeyAction::new(
                    "View",
                    move |model, _| {
                        let Some(row) = model.selected_row() else {
                            return KeyOutcome::Handled;
                        };
                        let ctx = EnterContext {
                            resource: &resource,
                            path: &path,
                            row,
                            session: &session,
                        };
                        match enter(&ctx) {
                            Some(request) => {
                                model.mark_entered();
                                KeyOutcome::Request(request)
                            }
                            None => KeyOutcome::Handled,
                        }
                    },
                    true,
                ),
            );
        }

        for f in &self.bind_keys_fn {
            f(&mut actions);
        }
        self.actions = actions;
    }

    /// Dispatch a key through the action map
    pub fn keyboard(&mut self, evt: &KeyEvent) -> KeyOutcome {
        if matches!(evt.code, KeyCode::Up | KeyCode::Down) {
            return KeyOutcome::Ignored;
        }
        match self.actions.get(&Key::from_event(evt)) {
            Some(action) => action.run(&mut self.model, evt),
            None => KeyOutcome::Ignored,
        }
    }

    /// Action map first, then list navigation for whatever is left
    pub fn handle_key(&mut self, evt: KeyEvent) -> KeyOutcome {
        match self.keyboard(&evt) {
            KeyOutcome::Ignored => self.navigate(&evt),
            outcome => outcome,
        }
    }

    fn navigate(&mut self, evt: &KeyEvent) -> KeyOutcome {
        let ctrl = evt.modifiers.contains(KeyModifiers::CONTROL);
        match evt.code {
            KeyCode::Down | KeyCode::Char('j') => self.model.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.model.select_previous(),
            KeyCode::Home | KeyCode::Char('g') => self.model.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.model.select_last(),
            KeyCode::PageDown | KeyCode::Char('f') if evt.code == KeyCode::PageDown || ctrl => {
                for _ in 0..PAGE_ROWS {
                    self.model.select_next();
                }
            }
            KeyCode::PageUp | KeyCode::Char('b') if evt.code == KeyCode::PageUp || ctrl => {
                self.model.selected = self.model.selected.saturating_sub(PAGE_ROWS);
            }
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    /// Apply results the refresher has handed back
    pub fn pump(&mut self) {
        let Some(refresher) = self.refresher.as_mut() else {
            return;
        };
        while let Some(result) = refresher.poll() {
            match result {
                Ok(rows) => self.model.set_rows(rows),
                Err(e) => self.model.error = Some(e.to_string()),
            }
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn model(&self) -> &TableModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut TableModel {
        &mut self.model
    }

    pub fn actions(&self) -> &KeyActions {
        &self.actions
    }

    pub fn hints(&self) -> Vec<MenuHint> {
        self.actions.hints()
    }

    pub fn is_running(&self) -> bool {
        self.refresher.as_ref().is_some_and(Refresher::is_running)
    }

    pub fn refresh_stats(&self) -> RefreshStats {
        self.refresher.as_ref().map(Refresher::stats).unwrap_or_default()
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, title: &str) {
        let visible = self.model.visible_columns();

        let header = TableRow::new(visible.iter().map(|&i| {
            Cell::from(self.model.columns[i].name.to_uppercase())
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        }));

        let rows: Vec<TableRow> = self
            .model
            .rows
            .iter()
            .map(|row| {
                TableRow::new(
                    visible
                        .iter()
                        .map(|&i| Cell::from(row.get(i).cloned().unwrap_or_default())),
                )
            })
            .collect();

        let (title, border) = match (&self.model.error, self.model.last_update) {
            (Some(err), _) => (
                format!(" {} [error: {}] ", title, err),
                Style::default().fg(Color::Red),
            ),
            (None, None) => (format!(" {} [loading] ", title), Style::default().fg(Color::DarkGray)),
            (None, Some(_)) => (
                format!(" {}[{}] ", title, self.model.rows.len()),
                Style::default().fg(Color::Cyan),
            ),
        };

        let widths = vec![Constraint::Fill(1); visible.len().max(1)];
        let table = TableWidget::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).border_style(border).title(title))
            .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("› ");

        self.state.select(if self.model.rows.is_empty() {
            None
        } else {
            Some(self.model.selected)
        });
        f.render_stateful_widget(table, area, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    use crate::source::StaticSource;

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DataSource for Counting {
        fn columns(&self) -> Vec<Column> {
            vec![Column::new("Name"), Column::wide("Created")]
        }

        async fn fetch(&self, _cancel: CancellationToken) -> LensResult<Vec<Row>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                vec!["bucket-a".to_string(), "2023".to_string()],
                vec!["bucket-b".to_string(), "2024".to_string()],
            ])
        }
    }

    /// Serves one good snapshot, then fails every fetch
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for Flaky {
        fn columns(&self) -> Vec<Column> {
            vec![Column::new("Name")]
        }

        async fn fetch(&self, _cancel: CancellationToken) -> LensResult<Vec<Row>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vec![vec!["i-0abc".to_string()], vec!["i-0def".to_string()]])
            } else {
                Err(LensError::Fetch("throttled".to_string()))
            }
        }
    }

    fn ctx() -> ViewContext {
        ViewContext {
            session: Session::default(),
            refresh_rate: Duration::from_secs(20),
            max_backoff_ticks: 8,
            shutdown: CancellationToken::new(),
        }
    }

    fn static_table() -> Table {
        let source = StaticSource::new(
            vec![Column::new("Name")],
            vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]],
        );
        let mut table = Table::new("ec2", "", Arc::new(source));
        table.model_mut().set_rows(vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]]);
        table
    }

    #[test]
    fn test_base_actions() {
        let mut table = static_table();
        table.init(&ctx()).unwrap();

        assert!(table.actions().contains(&Key::ctrl('w')));
        assert!(table.actions().contains(&Key::char('?')));
        assert!(table.actions().contains(&Key::char('z')));
        assert!(!table.actions().contains(&Key::plain(KeyCode::Enter)));

        let outcome = table.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert_eq!(outcome, KeyOutcome::Handled);
        assert!(table.model().wide);

        let outcome = table.handle_key(KeyEvent::from(KeyCode::Char('?')));
        assert_eq!(outcome, KeyOutcome::Request(AppRequest::Help));
    }

    #[test]
    fn test_extensions_apply_in_order() {
        let mut table = static_table();
        table.add_bind_keys_fn(Arc::new(|actions: &mut KeyActions| {
            actions.delete(&[Key::char('z')]);
            actions.insert(
                Key::char('?'),
                KeyAction::new("First", |_, _| KeyOutcome::Handled, true),
            );
        }));
        table.add_bind_keys_fn(Arc::new(|actions: &mut KeyActions| {
            actions.insert(
                Key::char('?'),
                KeyAction::new("Second", |_, _| KeyOutcome::Request(AppRequest::Back), true),
            );
        }));
        table.init(&ctx()).unwrap();

        assert!(!table.actions().contains(&Key::char('z')));
        assert_eq!(table.actions().get(&Key::char('?')).unwrap().label, "Second");
        assert_eq!(
            table.handle_key(KeyEvent::from(KeyCode::Char('?'))),
            KeyOutcome::Request(AppRequest::Back)
        );
    }

    #[test]
    fn test_up_down_always_navigate() {
        let mut table = static_table();
        table.add_bind_keys_fn(Arc::new(|actions: &mut KeyActions| {
            actions.insert(
                Key::plain(KeyCode::Down),
                KeyAction::new("Hijack", |_, _| KeyOutcome::Request(AppRequest::Quit), false),
            );
        }));
        table.init(&ctx()).unwrap();

        assert_eq!(table.keyboard(&KeyEvent::from(KeyCode::Down)), KeyOutcome::Ignored);
        assert_eq!(table.handle_key(KeyEvent::from(KeyCode::Down)), KeyOutcome::Handled);
        assert_eq!(table.model().selected, 1);
        table.handle_key(KeyEvent::from(KeyCode::Char('G')));
        assert_eq!(table.model().selected, 2);
        table.handle_key(KeyEvent::from(KeyCode::Up));
        assert_eq!(table.model().selected, 1);
        assert_eq!(table.handle_key(KeyEvent::from(KeyCode::Char('x'))), KeyOutcome::Ignored);
    }

    #[test]
    fn test_wide_columns() {
        let mut model = TableModel {
            columns: vec![Column::new("Name"), Column::wide("Created"), Column::new("Region")],
            ..Default::default()
        };
        assert_eq!(model.visible_columns(), vec![0, 2]);
        model.toggle_wide();
        assert_eq!(model.visible_columns(), vec![0, 1, 2]);
    }

    #[test]
    fn test_fetch_error_keeps_rows() {
        let mut model = TableModel::default();
        model.set_rows(vec![vec!["a".into()]]);
        model.error = Some("Fetch failed: boom".into());
        assert_eq!(model.rows.len(), 1);
        model.set_rows(vec![]);
        assert!(model.error.is_none());
        assert_eq!(model.selected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entered_table_refreshes_on_return() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(Counting {
            calls: Arc::clone(&calls),
        });
        let mut table = Table::new("s3", "", source);
        table.set_enter_fn(Arc::new(|ctx: &EnterContext<'_>| {
            Some(AppRequest::Open {
                resource: "OBJ".to_string(),
                path: ctx.row[0].clone(),
            })
        }));
        table.init(&ctx()).unwrap();

        table.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        table.pump();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(table.model().rows.len(), 2);

        let outcome = table.handle_key(KeyEvent::from(KeyCode::Enter));
        assert_eq!(
            outcome,
            KeyOutcome::Request(AppRequest::Open {
                resource: "OBJ".to_string(),
                path: "bucket-a".to_string(),
            })
        );

        // drilled in, then back
        table.stop();
        table.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // a plain suspend/resume waits for the next tick
        table.stop();
        table.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(table.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_error_keeps_previous_rows() {
        let source = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        });
        let mut table = Table::new("ec2", "", Arc::clone(&source) as Arc<dyn DataSource>);
        table.init(&ctx()).unwrap();

        table.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        table.pump();
        assert_eq!(table.model().rows.len(), 2);
        assert!(table.model().error.is_none());

        tokio::time::sleep(Duration::from_secs(20)).await;
        table.pump();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            table.model().rows,
            vec![vec!["i-0abc".to_string()], vec!["i-0def".to_string()]]
        );
        assert_eq!(table.model().error.as_deref(), Some("Fetch failed: throttled"));
        assert_eq!(table.refresh_stats().failures, 1);
        table.stop();
    }
}
