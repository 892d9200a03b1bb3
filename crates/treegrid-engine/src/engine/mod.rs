//! Treegrid engine API.
//!
//! This module provides the document model and the formula engine:
//!
//! - [`Node`], [`Column`], [`Row`] - the folder/table tree and its contents
//! - [`Value`], [`TimerValue`] - cell values, including stopwatch cells
//! - [`row_context`], [`global_context`] - bindings a formula script sees
//! - [`create_engine`] - create a Rhai engine with the helper builtins
//! - [`eval_formula`] - run one script fragment against built contexts

mod context;
mod eval;
mod node;
mod timer;
mod value;

pub use context::{global_context, row_context};
pub use eval::{create_engine, eval_formula};
pub use node::{
    Column, ColumnKind, ExternalInput, ExternalTableRef, FilterCondition, FilterOperator,
    FormulaConfig, Node, NodeKind, ROOT_ID, Row, RowData, ViewFilter,
};
pub use timer::{TimerValue, format_clock, now_millis};
pub use value::{Value, format_number};

pub use rhai::{Dynamic, Engine, Map};
