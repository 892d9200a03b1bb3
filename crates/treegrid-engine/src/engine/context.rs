//! Expression contexts for formula scripts.
//!
//! A script sees exactly two bindings: `row`, the current row keyed by both
//! column id and column name, and `globals`, the formula's resolved external
//! references. Context building never fails; unresolved references degrade to
//! `()` or an empty array.

use rhai::{Array, Dynamic, Map};

use super::node::{Column, FormulaConfig, Node, RowData};

/// Bind every column of the formula's own table under both its id and its
/// display name. When two columns share a name, the later column in column
/// order wins the name-keyed binding; id-keyed access is always unambiguous.
pub fn row_context(columns: &[Column], data: &RowData) -> Map {
    let mut context = Map::new();
    for column in columns {
        let value = data
            .get(&column.id)
            .map(|value| value.to_dynamic())
            .unwrap_or(Dynamic::UNIT);
        context.insert(column.id.as_str().into(), value.clone());
        context.insert(column.name.as_str().into(), value);
    }
    context
}

/// Resolve the formula's declared external references against the whole tree
/// into the map scripts see as `globals`.
///
/// Single references bind the first row's value at the referenced column, or
/// `()` when the node is missing or has no rows. Table references bind an
/// array of row maps keyed like [`row_context`], or an empty array when the
/// node is missing. Lookup always starts at the root: cross-branch references
/// are permitted.
pub fn global_context(root: &Node, config: &FormulaConfig) -> Map {
    let mut context = Map::new();
    for input in &config.external_inputs {
        let value = root
            .find(&input.node_id)
            .and_then(|node| node.rows.first())
            .and_then(|row| row.data.get(&input.column_id))
            .map(|value| value.to_dynamic())
            .unwrap_or(Dynamic::UNIT);
        context.insert(input.alias.as_str().into(), value);
    }
    for table_ref in &config.external_tables {
        let rows: Array = match root.find(&table_ref.node_id) {
            Some(node) => node
                .rows
                .iter()
                .map(|row| Dynamic::from(row_context(&node.columns, &row.data)))
                .collect(),
            None => Array::new(),
        };
        context.insert(table_ref.alias.as_str().into(), Dynamic::from(rows));
    }
    context
}
