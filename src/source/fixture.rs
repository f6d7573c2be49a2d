//! File-backed rows for offline use.
//!
//! A fixture lives at `<dir>/<resource>.toml`:
//!
//! ```toml
//! columns = ["Name", "Created"]
//! wide = ["Created"]
//! rows = [["logs", "2023-01-01"]]
//!
//! [paths.logs]
//! rows = [["index.html", "1.2 KiB"]]
//! ```
//!
//! When a view is opened with a path argument the matching `paths` entry is served
//! instead of the top-level rows.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{Column, DataSource, Row};
use crate::error::{LensError, LensResult};

#[derive(Deserialize, Debug, Default)]
struct Fixture {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    wide: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    paths: BTreeMap<String, FixturePath>,
}

#[derive(Deserialize, Debug, Default)]
struct FixturePath {
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    rows: Vec<Row>,
}

impl Fixture {
    fn parse(raw: &str) -> LensResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn columns_for(&self, path: &str) -> Vec<Column> {
        let names = self
            .paths
            .get(path)
            .and_then(|p| p.columns.as_ref())
            .unwrap_or(&self.columns);
        names
            .iter()
            .map(|name| Column {
                name: name.clone(),
                wide: self.wide.contains(name),
            })
            .collect()
    }

    fn rows_for(self, path: &str) -> Vec<Row> {
        if path.is_empty() {
            return self.rows;
        }
        let mut paths = self.paths;
        paths.remove(path).map(|p| p.rows).unwrap_or_default()
    }
}

/// Serves rows from a TOML fixture, re-reading the file on every fetch
pub struct FixtureSource {
    file: PathBuf,
    path: String,
    columns: Vec<Column>,
}

impl FixtureSource {
    /// Open the fixture for `resource` in `dir`
    pub fn open(dir: &Path, resource: &str, path: &str) -> LensResult<Self> {
        let file = dir.join(format!("{}.toml", file_stem(resource)));
        let raw = std::fs::read_to_string(&file).map_err(|e| {
            LensError::Fetch(format!("no fixture for {} at {}: {}", resource, file.display(), e))
        })?;
        let columns = Fixture::parse(&raw)?.columns_for(path);
        Ok(Self {
            file,
            path: path.to_string(),
            columns,
        })
    }
}

/// `iam:u` is not a portable file name
fn file_stem(resource: &str) -> String {
    resource.replace(':', "_")
}

#[async_trait]
impl DataSource for FixtureSource {
    fn columns(&self) -> Vec<Column> {
        self.columns.clone()
    }

    async fn fetch(&self, cancel: CancellationToken) -> LensResult<Vec<Row>> {
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LensError::Fetch("cancelled".to_string())),
            raw = tokio::fs::read_to_string(&self.file) => raw,
        };
        let raw = raw.map_err(|e| LensError::Fetch(format!("{}: {}", self.file.display(), e)))?;
        Ok(Fixture::parse(&raw)?.rows_for(&self.path))
    }
}
