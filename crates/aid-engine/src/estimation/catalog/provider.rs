use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::{info, warn};

use super::{AidCatalog, CatalogError};

/// Source of aid definitions, typically backed by a remote catalog or a file.
pub trait AidCatalogProvider: Send + Sync {
    fn fetch(&self) -> Result<AidCatalog, CatalogError>;
}

/// Reads a JSON array of aid definitions from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileCatalogProvider {
    path: PathBuf,
}

impl JsonFileCatalogProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AidCatalogProvider for JsonFileCatalogProvider {
    fn fetch(&self) -> Result<AidCatalog, CatalogError> {
        let file = File::open(&self.path).map_err(|err| {
            CatalogError::Unavailable(format!("{}: {err}", self.path.display()))
        })?;
        AidCatalog::from_json_reader(BufReader::new(file))
    }
}

/// Serves a fixed catalog; used for the built-in table and in tests.
#[derive(Debug, Clone)]
pub struct StaticCatalogProvider {
    catalog: AidCatalog,
}

impl StaticCatalogProvider {
    pub fn new(catalog: AidCatalog) -> Self {
        Self { catalog }
    }
}

impl AidCatalogProvider for StaticCatalogProvider {
    fn fetch(&self) -> Result<AidCatalog, CatalogError> {
        Ok(self.catalog.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogAvailability {
    Available,
    Degraded { reason: String },
}

/// Catalog as seen by one session: either the fetched table or an explicit empty one.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    catalog: AidCatalog,
    availability: CatalogAvailability,
}

impl CatalogSnapshot {
    pub fn available(catalog: AidCatalog) -> Self {
        Self {
            catalog,
            availability: CatalogAvailability::Available,
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            catalog: AidCatalog::empty(),
            availability: CatalogAvailability::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Fetch from the provider, degrading to "no known aids" on any failure.
    pub fn load(provider: &dyn AidCatalogProvider) -> Self {
        match provider.fetch() {
            Ok(catalog) => {
                info!(aids = catalog.len(), "aid catalog loaded");
                Self::available(catalog)
            }
            Err(err) => {
                warn!(error = %err, "aid catalog unavailable; estimating without known aids");
                Self::degraded(err.to_string())
            }
        }
    }

    pub fn catalog(&self) -> &AidCatalog {
        &self.catalog
    }

    pub fn availability(&self) -> &CatalogAvailability {
        &self.availability
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.availability, CatalogAvailability::Degraded { .. })
    }
}
