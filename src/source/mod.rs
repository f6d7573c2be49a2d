//! Data-source contract consumed by the table viewer
//!
//! The core never looks inside a row beyond treating it as an ordered list of cells.
//! Provider code (AWS/GCP SDK listings) lives behind [`DataSource`]; the crate ships a
//! static source and a file-backed fixture source.

mod fixture;

pub use fixture::FixtureSource;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{LensError, LensResult};
use crate::session::Session;

/// One table row
pub type Row = Vec<String>;

/// Column header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Only shown when the table is in wide mode
    pub wide: bool,
}

impl Column {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            wide: false,
        }
    }

    pub fn wide(name: &str) -> Self {
        Self {
            name: name.to_string(),
            wide: true,
        }
    }
}

/// A pull-based row provider
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Column headers for the rows this source returns
    fn columns(&self) -> Vec<Column>;

    /// Produce the current rows. Implementations should stop early once `cancel` fires.
    async fn fetch(&self, cancel: CancellationToken) -> LensResult<Vec<Row>>;
}

/// What a view or source is being built for
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub resource: &'a str,
    pub path: &'a str,
    pub session: &'a Session,
}

/// Builds a source for a target
pub type SourceFn = Arc<dyn Fn(&Target<'_>) -> LensResult<Arc<dyn DataSource>> + Send + Sync>;

/// Fixed rows, mostly for built-in views and tests
pub struct StaticSource {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl StaticSource {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    fn columns(&self) -> Vec<Column> {
        self.columns.clone()
    }

    async fn fetch(&self, _cancel: CancellationToken) -> LensResult<Vec<Row>> {
        Ok(self.rows.clone())
    }
}

/// Resource id to source constructor catalog
#[derive(Clone, Default)]
pub struct DataSources {
    sources: HashMap<String, SourceFn>,
    fallback: Option<SourceFn>,
}

impl DataSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        resource: &str,
        f: impl Fn(&Target<'_>) -> LensResult<Arc<dyn DataSource>> + Send + Sync + 'static,
    ) -> Self {
        self.sources.insert(resource.to_string(), Arc::new(f));
        self
    }

    /// Constructor used for resources without a dedicated entry
    pub fn with_fallback(
        mut self,
        f: impl Fn(&Target<'_>) -> LensResult<Arc<dyn DataSource>> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Arc::new(f));
        self
    }

    pub fn open(&self, target: &Target<'_>) -> LensResult<Arc<dyn DataSource>> {
        match self.sources.get(target.resource).or(self.fallback.as_ref()) {
            Some(f) => f(target),
            None => Err(LensError::NoComponent(target.resource.to_string())),
        }
    }
}
