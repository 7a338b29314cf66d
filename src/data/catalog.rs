//! Unit catalog: the assignable units and their point cost.
//! Loaded from data/units.json (or RATIO_CATALOG) by the CLI and server; the optimizer only reads it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{read_json, DataError};

pub const DEFAULT_CATALOG_PATH: &str = "data/units.json";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(alias = "ratio")]
    pub cost: u32,
}

impl Unit {
    pub fn new(name: impl Into<String>, cost: u32) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

/// Ordered unit list. Order is preserved because candidate ties fall back to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    units: Vec<Unit>,
}

impl Catalog {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Unit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl From<Vec<Unit>> for Catalog {
    fn from(units: Vec<Unit>) -> Self {
        Self::new(units)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Unit;
    type IntoIter = std::slice::Iter<'a, Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Units(Vec<Unit>),
    Wrapped { units: Vec<Unit> },
}

/// Accepts either a top-level array of units or `{ "units": [...] }`.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, DataError> {
    let file: CatalogFile = read_json(path.as_ref())?;
    let units = match file {
        CatalogFile::Units(units) => units,
        CatalogFile::Wrapped { units } => units,
    };
    Ok(Catalog::new(units))
}
