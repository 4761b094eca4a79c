//! Document and drift capability ports
//!
//! The planning tool and the drift scanner are external collaborators.
//! The gate only sees them through these two ports, with file-backed
//! adapters for the CLI and static adapters for tests.

use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use tfgate_types::{ChangeSet, DriftScan, GateError, KindTaxonomy, PlanDocument, Result};

/// Supplies the change-set under evaluation.
///
/// Any structural problem with the document is fatal and reported as
/// malformed input.
#[async_trait]
pub trait DocumentProvider: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn change_set(&self, taxonomy: &KindTaxonomy) -> Result<ChangeSet>;
}

/// Supplies the drift scan snapshot.
///
/// `Ok(None)` means no scan was supplied; the decision reports the drift
/// signal as degraded instead of failing.
#[async_trait]
pub trait DriftSource: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn drift_scan(&self) -> Result<Option<DriftScan>>;
}

/// Reads a plan document from disk.
#[derive(Debug, Clone)]
pub struct FileDocumentProvider {
    path: PathBuf,
}

impl FileDocumentProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentProvider for FileDocumentProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn change_set(&self, taxonomy: &KindTaxonomy) -> Result<ChangeSet> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| GateError::Io {
                document: "plan".to_string(),
                source,
            })?;
        let change_set = PlanDocument::from_json("plan", &bytes)?.into_change_set(taxonomy)?;
        debug!(
            path = %self.path.display(),
            changes = change_set.len(),
            tool_version = %change_set.tool_version,
            "Loaded plan document"
        );
        Ok(change_set)
    }
}

/// Serves an in-memory change-set.
#[derive(Debug, Clone)]
pub struct StaticDocumentProvider {
    change_set: ChangeSet,
}

impl StaticDocumentProvider {
    pub fn new(change_set: ChangeSet) -> Self {
        Self { change_set }
    }
}

#[async_trait]
impl DocumentProvider for StaticDocumentProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn change_set(&self, _taxonomy: &KindTaxonomy) -> Result<ChangeSet> {
        Ok(self.change_set.clone())
    }
}

/// Reads a drift document from disk. A missing file means no scan.
#[derive(Debug, Clone)]
pub struct FileDriftSource {
    path: PathBuf,
}

impl FileDriftSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DriftSource for FileDriftSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn drift_scan(&self) -> Result<Option<DriftScan>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Drift scan not found, drift conflicts unknown");
                return Ok(None);
            }
            Err(source) => {
                return Err(GateError::Io {
                    document: "drift".to_string(),
                    source,
                })
            }
        };
        let scan = DriftScan::from_document(PlanDocument::from_json("drift", &bytes)?)?;
        debug!(
            path = %self.path.display(),
            drifted = scan.addresses().len(),
            "Loaded drift scan"
        );
        Ok(Some(scan))
    }
}

/// Serves a fixed drift scan.
#[derive(Debug, Clone, Default)]
pub struct StaticDriftSource {
    scan: DriftScan,
}

impl StaticDriftSource {
    pub fn new(scan: DriftScan) -> Self {
        Self { scan }
    }
}

#[async_trait]
impl DriftSource for StaticDriftSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn drift_scan(&self) -> Result<Option<DriftScan>> {
        Ok(Some(self.scan.clone()))
    }
}

/// No drift scanning configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDriftSource;

#[async_trait]
impl DriftSource for NoDriftSource {
    fn name(&self) -> &str {
        "none"
    }

    async fn drift_scan(&self) -> Result<Option<DriftScan>> {
        Ok(None)
    }
}
