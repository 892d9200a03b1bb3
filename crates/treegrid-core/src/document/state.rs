use rand::Rng;
use rhai::Engine;
use treegrid_engine::engine::{Node, create_engine};

/// UI-agnostic document state: the node tree plus the formula engine.
///
/// The tree is a single owned value; all mutation goes through `&mut self`
/// methods, so a reader can never observe a half-applied edit. Recalculation
/// triggered by a mutation runs to completion before the method returns.
pub struct Document {
    /// The whole document tree. The root is always a container.
    pub root: Node,
    /// Rhai engine with the helper builtins registered.
    pub engine: Engine,
    /// Whether the tree has changed since the last save/load.
    pub modified: bool,
}

impl Document {
    /// Create a fresh document: a single empty workspace root.
    ///
    /// This constructor is side-effect free: it does not touch storage.
    pub fn new() -> Self {
        Self::from_root(Node::workspace_root())
    }

    /// Wrap an existing tree (e.g. one loaded from storage).
    pub fn from_root(root: Node) -> Self {
        Document {
            root,
            engine: create_engine(),
            modified: false,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Random 9-character lowercase alphanumeric id. Uniqueness within one tree
/// is probabilistic but ample for document-scale node counts.
pub(crate) fn new_id() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
