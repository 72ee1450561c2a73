#![deny(warnings)]

//! Upgrade catalog loading: YAML documents for repeatable and one-time upgrades.
//!
//! Catalogs are loaded once at startup, validated, and then treated as
//! read-only. A default catalog ships embedded in the binary.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use tycoon_core::{
    validate_catalog, OneTimeUpgrade, RepeatableUpgrade, UpgradeCatalog, ValidationError,
};

/// File name of the repeatable upgrade document inside a catalog directory.
pub const REPEATABLE_FILE: &str = "repeatable_upgrades.yaml";
/// File name of the one-time upgrade document inside a catalog directory.
pub const ONE_TIME_FILE: &str = "one_time_upgrades.yaml";

const DEFAULT_REPEATABLE: &str = include_str!("../assets/repeatable_upgrades.yaml");
const DEFAULT_ONE_TIME: &str = include_str!("../assets/one_time_upgrades.yaml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid catalog document {file}: {message}")]
    Parse { file: String, message: String },
    #[error("invalid catalog entry: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

/// Parse and validate both catalog documents.
pub fn parse_catalog(
    repeatable_yaml: &str,
    one_time_yaml: &str,
) -> Result<UpgradeCatalog, CatalogError> {
    let repeatable: Vec<RepeatableUpgrade> =
        serde_yaml::from_str(repeatable_yaml).map_err(|e| CatalogError::Parse {
            file: REPEATABLE_FILE.to_string(),
            message: e.to_string(),
        })?;
    let one_time: Vec<OneTimeUpgrade> =
        serde_yaml::from_str(one_time_yaml).map_err(|e| CatalogError::Parse {
            file: ONE_TIME_FILE.to_string(),
            message: e.to_string(),
        })?;
    let catalog = UpgradeCatalog {
        repeatable,
        one_time,
    };
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// The catalog shipped with the game.
pub fn default_catalog() -> Result<UpgradeCatalog, CatalogError> {
    parse_catalog(DEFAULT_REPEATABLE, DEFAULT_ONE_TIME)
}

/// Loads catalogs from a directory holding both YAML documents.
pub struct CatalogLoader {
    root: PathBuf,
}

impl CatalogLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<UpgradeCatalog, CatalogError> {
        let repeatable = fs::read_to_string(self.root.join(REPEATABLE_FILE))?;
        let one_time = fs::read_to_string(self.root.join(ONE_TIME_FILE))?;
        let catalog = parse_catalog(&repeatable, &one_time)?;
        info!(
            root = %self.root.display(),
            repeatable = catalog.repeatable.len(),
            one_time = catalog.one_time.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }
}

/// Load from `dir` when given, otherwise fall back to the embedded default.
pub fn load_or_default(dir: Option<&Path>) -> Result<UpgradeCatalog, CatalogError> {
    match dir {
        Some(dir) => CatalogLoader::new(dir).load(),
        None => default_catalog(),
    }
}
