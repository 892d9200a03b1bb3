//! Document persistence.
//!
//! The whole tree is stored as one JSON snapshot under a single well-known
//! key in a local sled database. There is no schema versioning and no
//! migration: loading never fails hard, it falls back to a fresh single-root
//! workspace when the snapshot is missing or does not parse.

use std::path::{Path, PathBuf};

use tracing::warn;
use treegrid_engine::engine::Node;

use crate::error::Result;

/// Key the document snapshot is stored under.
pub const DOCUMENT_KEY: &str = "document";

pub struct DocumentStore {
    db: sled::Db,
}

impl DocumentStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<DocumentStore> {
        Ok(DocumentStore {
            db: sled::open(path.as_ref())?,
        })
    }

    /// Load the stored tree. Missing or corrupt snapshots yield a fresh
    /// workspace root instead of an error; corruption is discarded, not
    /// partially recovered.
    pub fn load_root(&self) -> Node {
        let bytes = match self.db.get(DOCUMENT_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Node::workspace_root(),
            Err(err) => {
                warn!("failed to read stored document: {}", err);
                return Node::workspace_root();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(root) => root,
            Err(err) => {
                warn!("stored document is corrupt, reinitializing: {}", err);
                Node::workspace_root()
            }
        }
    }

    /// Persist the tree: serialize, insert, flush.
    pub fn save_root(&self, root: &Node) -> Result<()> {
        let bytes = serde_json::to_vec(root)?;
        self.db.insert(DOCUMENT_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Default platform location for the store.
pub fn default_store_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "treegrid")
        .map(|dirs| dirs.data_dir().join("documents.sled"))
}
