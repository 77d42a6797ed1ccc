//! Persistence for ground-truth stores - save/load JSON caches.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;

use crate::error::{PrismaError, Result};

use super::store::{GroundTruthStore, STORE_FORMAT_VERSION};

fn failed(action: &str, path: &Path, err: impl Display) -> PrismaError {
    PrismaError::Persistence(format!("Failed to {} '{}': {}", action, path.display(), err))
}

impl GroundTruthStore {
    /// Write the store as pretty-printed JSON, creating parent directories.
    ///
    /// Floats are written with enough precision to load back bit-for-bit.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use prisma::ground_truth::GroundTruthStore;
    /// # fn example(store: &GroundTruthStore) -> prisma::Result<()> {
    /// store.save("insurance.ground_truth.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| failed("create directory", parent, e))?;
        }

        let file = File::create(path).map_err(|e| failed("create file", path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| failed("write ground truth", path, e))?;

        debug!(path = %path.display(), entries = self.len(), "saved ground truth");
        Ok(())
    }

    /// Read a store written by [`GroundTruthStore::save`].
    ///
    /// The cache is taken as is; nothing is recomputed. Stores written by a
    /// newer format version are refused.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| failed("open file", path, e))?;
        let store: GroundTruthStore = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| failed("parse ground truth", path, e))?;

        let version = store.metadata().format_version;
        if version > STORE_FORMAT_VERSION {
            return Err(failed(
                "load ground truth",
                path,
                format!(
                    "format version {} is newer than supported version {}",
                    version, STORE_FORMAT_VERSION
                ),
            ));
        }

        debug!(path = %path.display(), entries = store.len(), "loaded ground truth");
        Ok(store)
    }
}
