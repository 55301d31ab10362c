use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{Catalog, CatalogDocument, PopularityScheme},
};

/// Durable home of the movie catalog
///
/// Every mutating command loads the whole catalog, changes it, and saves the
/// whole catalog back. Implementations provide no locking: two handlers that
/// interleave load/save on the same store lose one of the updates, and the
/// last save wins.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Loads the catalog. Never fails: a missing or unreadable store yields
    /// an empty catalog.
    async fn load(&self) -> Catalog;

    /// Persists the catalog. Failures are logged and swallowed.
    async fn save(&self, catalog: &Catalog);

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Catalog stored as a single pretty-printed JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    scheme: PopularityScheme,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, scheme: PopularityScheme) -> Self {
        Self {
            path: path.into(),
            scheme,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scheme(&self) -> PopularityScheme {
        self.scheme
    }

    /// Reads and parses the file; `Ok(None)` when it does not exist
    async fn read_document(&self) -> AppResult<Option<CatalogDocument>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document = serde_json::from_slice(&bytes)?;
        Ok(Some(document))
    }

    /// Truncates and rewrites the file in place; not atomic
    async fn write_document(&self, document: &CatalogDocument) -> AppResult<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;
        tokio::fs::write(&self.path, buf).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for JsonFileStore {
    async fn load(&self) -> Catalog {
        match self.read_document().await {
            Ok(Some(document)) => Catalog::from_document(document, self.scheme),
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "Catalog file not found, starting empty");
                Catalog::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Catalog file unreadable, falling back to an empty catalog"
                );
                Catalog::new()
            }
        }
    }

    async fn save(&self, catalog: &Catalog) {
        match self.write_document(&catalog.to_document()).await {
            Ok(()) => tracing::debug!(
                path = %self.path.display(),
                movies = catalog.len(),
                "Catalog saved"
            ),
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Error saving catalog"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

/// Process-local store, used in tests and for dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn load(&self) -> Catalog {
        self.catalog.read().await.clone()
    }

    async fn save(&self, catalog: &Catalog) {
        *self.catalog.write().await = catalog.clone();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
