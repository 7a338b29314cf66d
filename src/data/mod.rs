pub mod catalog;
pub mod roster;
pub mod validate;

use std::path::PathBuf;

use thiserror::Error;

pub use catalog::{load_catalog, Catalog, Unit, DEFAULT_CATALOG_PATH};
pub use roster::{load_roster, LockSet, Player, Roster, RosterError, RosterFile, DEFAULT_BUDGET};
pub use validate::{validate_setup, ValidationReport, ValidationSeverity};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn read_json<T>(path: &std::path::Path) -> Result<T, DataError>
where
    T: serde::de::DeserializeOwned,
{
    let raw = std::fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
