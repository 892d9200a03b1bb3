use super::Document;
use crate::error::Result;
use crate::storage::DocumentStore;

impl Document {
    /// Load the stored tree from `store`. A missing or corrupt snapshot
    /// yields a fresh workspace document rather than an error.
    pub fn load(store: &DocumentStore) -> Document {
        Document::from_root(store.load_root())
    }

    /// Persist the current tree to `store`.
    pub fn save(&mut self, store: &DocumentStore) -> Result<()> {
        store.save_root(&self.root)?;
        self.modified = false;
        Ok(())
    }
}
