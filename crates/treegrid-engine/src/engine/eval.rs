//! Rhai engine creation and formula evaluation.
//!
//! One engine (with the helper builtins registered) serves a whole document;
//! each formula run gets a fresh scope holding only its `row` and `globals`
//! bindings. Execution is synchronous and completes before the call returns.
//!
//! The external-reference binding is named `globals` because `global` is a
//! reserved keyword in Rhai (the global module namespace prefix).

use rhai::{Dynamic, Engine, Map, Scope};

use super::value::Value;

/// Create a Rhai engine with the treegrid helper functions registered.
pub fn create_engine() -> Engine {
    let mut engine = Engine::new();
    crate::builtins::register_builtins(&mut engine);
    engine
}

/// Run one formula fragment against its built contexts.
///
/// The fragment sees exactly the `row` and `globals` bindings and must end by
/// yielding a value; `()` is stored as empty text. Any compile or runtime
/// error is caught and returned as visible `Error: …` text - it never
/// propagates and never aborts sibling formulas or other rows.
pub fn eval_formula(engine: &Engine, script: &str, row: Map, globals: Map) -> Value {
    let mut scope = Scope::new();
    scope.push("row", row);
    scope.push("globals", globals);
    match engine.eval_with_scope::<Dynamic>(&mut scope, script) {
        Ok(result) if result.is_unit() => Value::Text(String::new()),
        Ok(result) => Value::from_dynamic(result),
        Err(err) => Value::Text(format!("Error: {}", err)),
    }
}
