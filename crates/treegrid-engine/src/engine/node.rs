//! Document tree data structures.
//!
//! A [`Node`] is either a container (folder) or a table (file). Containers own
//! an ordered list of child nodes; tables own columns, rows and saved views.
//! Node ids are globally unique across the tree and are the only addressing
//! mechanism: cross-table references name a node id, never a path. Moving a
//! node reassigns its `parent_id` and preserves its id and all descendant ids.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Id of the tree root. The root is a container and is never moved or deleted.
pub const ROOT_ID: &str = "root";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Container,
    Table,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    /// Formula that runs only on explicit manual trigger.
    ActionFormula,
    /// Formula recomputed automatically on every relevant mutation.
    AutoFormula,
    Timer,
}

impl ColumnKind {
    pub fn is_formula(&self) -> bool {
        matches!(self, ColumnKind::ActionFormula | ColumnKind::AutoFormula)
    }
}

/// A single-value reference into another table. Resolves at evaluation time to
/// the value in the first row of the referenced column ("first row wins").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInput {
    pub node_id: String,
    pub column_id: String,
    pub alias: String,
}

/// A whole-table reference. Resolves to every row of the referenced table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTableRef {
    pub node_id: String,
    pub alias: String,
}

/// Configuration of a formula column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaConfig {
    /// Natural-language prompt the script was authored from, if any.
    #[serde(default)]
    pub prompt: String,
    /// Rhai fragment. Sees exactly `row` and `global` and yields the result.
    #[serde(default)]
    pub script: String,
    /// Column ids the script reads, as declared by the author.
    #[serde(default)]
    pub input_column_ids: Vec<String>,
    #[serde(default)]
    pub external_inputs: Vec<ExternalInput>,
    #[serde(default)]
    pub external_tables: Vec<ExternalTableRef>,
    /// Where the result lands. `None` writes to the formula column itself.
    #[serde(default)]
    pub output_column_id: Option<String>,
}

/// A table column. `id` is immutable and is the stable reference key; `name`
/// is a mutable display label and may be duplicated across columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<FormulaConfig>,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ColumnKind) -> Column {
        Column {
            id: id.into(),
            name: name.into(),
            kind,
            formula: None,
        }
    }
}

/// Cell values of one row, keyed by column id. An absent key means "no value
/// yet" and is equivalent to empty.
pub type RowData = HashMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub data: RowData,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Row {
        Row {
            id: id.into(),
            data: RowData::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    Gt,
    Lt,
    DateIs,
    DateWithin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub id: String,
    pub column_id: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

/// A saved, named filter over a table's rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewFilter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
}

/// A tree entry: a container of further nodes, or a table of rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn container(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Node {
        Node {
            id: id.into(),
            parent_id: Some(parent_id.into()),
            name: name.into(),
            kind: NodeKind::Container,
            columns: Vec::new(),
            rows: Vec::new(),
            views: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn table(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Node {
        Node {
            id: id.into(),
            parent_id: Some(parent_id.into()),
            name: name.into(),
            kind: NodeKind::Table,
            columns: Vec::new(),
            rows: Vec::new(),
            views: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The default document: a single empty root container.
    pub fn workspace_root() -> Node {
        Node {
            id: ROOT_ID.to_string(),
            parent_id: None,
            name: "Workspace".to_string(),
            kind: NodeKind::Container,
            columns: Vec::new(),
            rows: Vec::new(),
            views: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_table(&self) -> bool {
        self.kind == NodeKind::Table
    }

    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    /// Find a node anywhere in this subtree by id.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Find the node whose `children` list directly holds `id`.
    pub fn find_parent(&self, id: &str) -> Option<&Node> {
        if self.children.iter().any(|child| child.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_parent(id))
    }

    pub fn find_parent_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.children.iter().any(|child| child.id == id) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_parent_mut(id))
    }

    /// Whether `id` names this node or any of its descendants.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Root-to-target path, inclusive on both ends.
    pub fn path(&self, id: &str) -> Option<Vec<&Node>> {
        if self.id == id {
            return Some(vec![self]);
        }
        for child in &self.children {
            if let Some(mut rest) = child.path(id) {
                rest.insert(0, self);
                return Some(rest);
            }
        }
        None
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|column| column.id == column_id)
    }

    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == row_id)
    }

    pub fn row_mut(&mut self, row_id: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.id == row_id)
    }
}
