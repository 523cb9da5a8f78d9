use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::dataset::{Dataset, LoadError};

/// Where the loader reads its input from.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// An immutable, parsed dataset tagged with the SHA-256 of the bytes it
/// was built from.
#[derive(Debug)]
pub struct Snapshot {
    fingerprint: [u8; 32],
    dataset: Dataset,
}

impl Snapshot {
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    /// Lowercase hex rendering of [`Snapshot::fingerprint`].
    pub fn fingerprint_hex(&self) -> String {
        hex(&self.fingerprint)
    }
}

/// Owns the process-wide dataset snapshot.
///
/// The snapshot is built on the first successful [`DatasetLoader::load`]
/// and every later call hands out the same `Arc` without touching the
/// source again. A failed load stores nothing, so no partial dataset is
/// ever served.
#[derive(Debug)]
pub struct DatasetLoader {
    source: Source,
    snapshot: OnceLock<Arc<Snapshot>>,
}

impl DatasetLoader {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            snapshot: OnceLock::new(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(Source::File(path.into()))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Source::Bytes(bytes.into()))
    }

    /// Compute the SHA-256 hash of `content`.
    pub fn hash_content(content: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.get().is_some()
    }

    /// Return the snapshot, building it on first use.
    pub fn load(&self) -> Result<Arc<Snapshot>, LoadError> {
        if let Some(snapshot) = self.snapshot.get() {
            debug!(fingerprint = %snapshot.fingerprint_hex(), "dataset cache hit");
            return Ok(Arc::clone(snapshot));
        }

        let built = match &self.source {
            Source::File(path) => build(&read_source(path)?)?,
            Source::Bytes(bytes) => build(bytes)?,
        };

        // A concurrent first load may have won the race; keep whichever landed.
        Ok(Arc::clone(self.snapshot.get_or_init(|| Arc::new(built))))
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn build(bytes: &[u8]) -> Result<Snapshot, LoadError> {
    let fingerprint = DatasetLoader::hash_content(bytes);
    let dataset = Dataset::from_json(bytes)?;
    info!(
        rows = dataset.len(),
        fingerprint = %hex(&fingerprint),
        "dataset snapshot built"
    );
    Ok(Snapshot {
        fingerprint,
        dataset,
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
