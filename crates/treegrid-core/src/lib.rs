//! treegrid-core - UI-agnostic document state + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{Document, MoveDirection, visible_rows};
pub use error::{Result, TreegridError};

pub use treegrid_engine::engine::{Node, Value};
