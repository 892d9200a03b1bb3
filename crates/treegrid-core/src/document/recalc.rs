//! Recalculation scheduling.
//!
//! Decides which formula cells re-run after a mutation and in what order:
//!
//! - a cell edit re-runs every auto-formula of the edited row, left to right
//!   in column order, each script seeing the outputs of the ones before it;
//! - a manual action runs one formula for one row and writes one cell;
//! - saving a formula configuration re-sweeps every row of its table.
//!
//! A pass is one bounded sweep - there is no fixed-point iteration, no
//! dependency graph and no cycle detection. External references are read live
//! from the tree at evaluation time; recalculation never propagates across
//! tables, so cross-table staleness is accepted behavior.

use tracing::debug;

use super::Document;
use super::ops::find_table;
use crate::error::{Result, TreegridError};
use treegrid_engine::engine::{
    ColumnKind, Engine, FormulaConfig, Node, RowData, Value, eval_formula, global_context,
    row_context,
};

impl Document {
    /// Re-run every `AutoFormula` column of one row, in column order.
    pub fn recalculate_row(&mut self, table_id: &str, row_id: &str) -> Result<()> {
        let root = self.root.clone();
        let table = find_table(&root, table_id)?;
        let row = table
            .row(row_id)
            .ok_or_else(|| TreegridError::RowNotFound(row_id.to_string()))?;

        let data = sweep_row(&self.engine, &root, table, row.data.clone());
        self.write_row(table_id, row_id, data)
    }

    /// Re-run the full row sweep for every row of a table. Used after a
    /// formula configuration changes, since every derived value may differ.
    pub fn recalculate_table(&mut self, table_id: &str) -> Result<()> {
        let root = self.root.clone();
        let table = find_table(&root, table_id)?;
        debug!(table = table_id, rows = table.rows.len(), "recalculating table");

        let updated: Vec<(String, RowData)> = table
            .rows
            .iter()
            .map(|row| {
                let data = sweep_row(&self.engine, &root, table, row.data.clone());
                (row.id.clone(), data)
            })
            .collect();

        for (row_id, data) in updated {
            self.write_row(table_id, &row_id, data)?;
        }
        Ok(())
    }

    /// Run one `ActionFormula` for one row and write its single result.
    /// No other rows or columns are touched.
    pub fn run_action(&mut self, table_id: &str, row_id: &str, column_id: &str) -> Result<()> {
        let root = self.root.clone();
        let table = find_table(&root, table_id)?;
        let column = table
            .column(column_id)
            .ok_or_else(|| TreegridError::ColumnNotFound(column_id.to_string()))?;
        let config = match (column.kind, &column.formula) {
            (ColumnKind::ActionFormula, Some(config)) => config,
            _ => return Err(TreegridError::NotAFormulaColumn(column_id.to_string())),
        };
        let row = table
            .row(row_id)
            .ok_or_else(|| TreegridError::RowNotFound(row_id.to_string()))?;

        let result = run_formula(&self.engine, &root, table, &row.data, config);
        let output_id = config
            .output_column_id
            .clone()
            .unwrap_or_else(|| column.id.clone());

        let mut data = row.data.clone();
        data.insert(output_id, result);
        self.write_row(table_id, row_id, data)
    }

    fn write_row(&mut self, table_id: &str, row_id: &str, data: RowData) -> Result<()> {
        let table = self
            .root
            .find_mut(table_id)
            .ok_or_else(|| TreegridError::NodeNotFound(table_id.to_string()))?;
        let row = table
            .row_mut(row_id)
            .ok_or_else(|| TreegridError::RowNotFound(row_id.to_string()))?;
        row.data = data;
        self.modified = true;
        Ok(())
    }
}

/// One left-to-right pass over a row's auto-formula columns. Later columns
/// observe the outputs written by earlier ones in the same pass; external
/// references read `root` as it was when the pass started.
fn sweep_row(engine: &Engine, root: &Node, table: &Node, mut data: RowData) -> RowData {
    for column in &table.columns {
        if column.kind != ColumnKind::AutoFormula {
            continue;
        }
        let Some(config) = &column.formula else {
            continue;
        };
        let result = run_formula(engine, root, table, &data, config);
        let output_id = config
            .output_column_id
            .clone()
            .unwrap_or_else(|| column.id.clone());
        data.insert(output_id, result);
    }
    data
}

/// Evaluate one formula against the current row data and the live tree.
fn run_formula(
    engine: &Engine,
    root: &Node,
    table: &Node,
    data: &RowData,
    config: &FormulaConfig,
) -> Value {
    let row = row_context(&table.columns, data);
    let globals = global_context(root, config);
    eval_formula(engine, &config.script, row, globals)
}
