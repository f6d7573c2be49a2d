use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::types::{validate, Alias, Origin};
use crate::error::{LensError, LensResult};

/// On-disk shape of the user alias file
#[derive(Serialize, Deserialize, Debug, Default)]
struct AliasFile {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

#[derive(Default)]
struct Aliases {
    builtins: BTreeMap<String, Alias>,
    merged: BTreeMap<String, Alias>,
}

/// Alias store backed by a TOML file
///
/// Every access goes through one mutex. The merged table is rebuilt wholesale on
/// `ensure` and `clear_user`; individual entries are never edited in place.
pub struct AliasStore {
    path: PathBuf,
    inner: Mutex<Aliases>,
}

impl AliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: Mutex::new(Aliases::default()),
        }
    }

    /// Location of the user alias file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a built-in alias. Called while composing the application.
    pub fn register_alias(&self, mnemonic: &str, resource: &str) -> LensResult<()> {
        validate(mnemonic, resource)?;
        let alias = Alias::new(mnemonic, resource, Origin::BuiltIn);
        let mut inner = self.inner.lock();
        inner.builtins.insert(mnemonic.to_string(), alias.clone());
        inner.merged.entry(mnemonic.to_string()).or_insert(alias);
        Ok(())
    }

    /// Load the user file and merge it over the built-ins.
    ///
    /// A missing file is created empty. An unreadable or unparsable file is an error;
    /// individual bad entries are skipped with a warning.
    pub fn ensure(&self) -> LensResult<usize> {
        let user = self.load_user_file()?;

        let mut inner = self.inner.lock();
        let mut merged = inner.builtins.clone();
        for (mnemonic, resource) in user.aliases {
            if let Err(e) = validate(&mnemonic, &resource) {
                tracing::warn!("Skipping user alias: {}", e);
                continue;
            }
            merged.insert(mnemonic.clone(), Alias::new(&mnemonic, &resource, Origin::User));
        }
        inner.merged = merged;

        tracing::debug!("Loaded {} aliases from {}", inner.merged.len(), self.path.display());
        Ok(inner.merged.len())
    }

    /// Drop user aliases: truncate the file and fall back to built-ins only
    pub fn clear_user(&self) -> LensResult<()> {
        self.write_user_file(&AliasFile::default())?;
        let mut inner = self.inner.lock();
        inner.merged = inner.builtins.clone();
        tracing::info!("Cleared user aliases in {}", self.path.display());
        Ok(())
    }

    /// Resource id bound to a mnemonic
    pub fn resolve(&self, mnemonic: &str) -> Option<String> {
        self.inner
            .lock()
            .merged
            .get(mnemonic)
            .map(|alias| alias.resource.clone())
    }

    /// Membership test
    pub fn check(&self, mnemonic: &str) -> bool {
        self.inner.lock().merged.contains_key(mnemonic)
    }

    /// Snapshot of the merged table, ordered by mnemonic
    pub fn list(&self) -> Vec<Alias> {
        self.inner.lock().merged.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_user_file(&self) -> LensResult<AliasFile> {
        if !self.path.exists() {
            self.write_user_file(&AliasFile::default())?;
            return Ok(AliasFile::default());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            LensError::AliasStore(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            LensError::AliasStore(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    fn write_user_file(&self, file: &AliasFile) -> LensResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = toml::to_string(file)?;
        std::fs::write(&self.path, body).map_err(|e| {
            LensError::AliasStore(format!("cannot write {}: {}", self.path.display(), e))
        })
    }
}
