use std::env;
use std::path::PathBuf;

use crate::constants::store::{DEFAULT_STORE_DIR, DEFAULT_STORE_FILENAME, STORE_DIR_ENV};

/// Where the CRM store file lives.
///
/// Resolution order: explicit `path`, explicit `dir`, the
/// `LEASE_COMPS_STORE_DIR` environment variable, then `.lease_comps_store/`.
/// Directories are joined with `crm_store.bin`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Full path of the store file.
    pub path: Option<PathBuf>,
    /// Directory holding the store file under its default name.
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Config with nothing set; resolves from the environment or defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` as the store file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Keep the store file in `dir`.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Resolve the store file path.
    pub fn resolve_path(&self) -> PathBuf {
        self.resolve_with(env::var_os(STORE_DIR_ENV).map(PathBuf::from))
    }

    fn resolve_with(&self, env_dir: Option<PathBuf>) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let dir = self
            .dir
            .clone()
            .or(env_dir.filter(|dir| !dir.as_os_str().is_empty()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
        dir.join(DEFAULT_STORE_FILENAME)
    }
}
