//! Cell values and conversion to/from the script engine.
//!
//! Row data is JSON-shaped: null, booleans, numbers, text, or a timer object.
//! Dates are ISO `YYYY-MM-DD` text. Scripts receive and return [`Dynamic`]
//! values; the conversions here are lossy only for exotic script results
//! (arrays and non-timer maps fall back to their display text).

use rhai::{Dynamic, Map};
use serde::{Deserialize, Serialize};

use super::timer::{TimerValue, format_clock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Timer(TimerValue),
    Text(String),
}

impl Value {
    /// Empty in the "no value yet" sense: null or empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn to_dynamic(&self) -> Dynamic {
        match self {
            Value::Null => Dynamic::UNIT,
            Value::Bool(flag) => (*flag).into(),
            Value::Number(number) => (*number).into(),
            Value::Timer(timer) => Dynamic::from(timer.to_map()),
            Value::Text(text) => text.clone().into(),
        }
    }

    /// Convert a script result back into a stored value. Maps with the timer
    /// shape become timers; anything else non-primitive is stored as text.
    pub fn from_dynamic(value: Dynamic) -> Value {
        if value.is_unit() {
            return Value::Null;
        }
        if let Ok(flag) = value.as_bool() {
            return Value::Bool(flag);
        }
        if let Ok(number) = value.as_int() {
            return Value::Number(number as f64);
        }
        if let Ok(number) = value.as_float() {
            return Value::Number(number);
        }
        if value.is_map() {
            let map = value.cast::<Map>();
            return match TimerValue::from_map(&map) {
                Some(timer) => Value::Timer(timer),
                None => Value::Text(format!("{:?}", map)),
            };
        }
        if value.is_string() {
            return Value::Text(value.into_string().unwrap_or_default());
        }
        Value::Text(value.to_string())
    }

    /// Format for display in a cell.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => format_number(*number),
            Value::Timer(timer) => format_clock(timer.elapsed_seconds()),
            Value::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Value {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Value {
        Value::Text(text)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Value {
        Value::Number(number)
    }
}

impl From<TimerValue> for Value {
    fn from(timer: TimerValue) -> Value {
        Value::Timer(timer)
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{:.2}", n)
    }
}
