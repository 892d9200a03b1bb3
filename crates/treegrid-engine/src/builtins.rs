//! Built-in helper functions available to every formula script.
//!
//! Conventions:
//! - Helpers are registered as native Rhai functions; scripts call them
//!   directly (`today()`, `diffDays(a, b)`, `timerSec(row["t"])`, ...).
//! - Helpers never raise: bad arguments degrade to 0 / false / empty.
//! - Dates are `YYYY-MM-DD` text; RFC 3339 timestamps are also accepted.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rhai::{Dynamic, Engine, Map};

use crate::engine::TimerValue;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Register all helper functions into the Rhai engine.
pub fn register_builtins(engine: &mut Engine) {
    // today(): current date as YYYY-MM-DD

    engine.register_fn("today", today_string);

    // diffDays(d1, d2): whole days from d1 to d2, rounded up; 0 when either
    // argument is empty or unparseable

    engine.register_fn("diffDays", |d1: Dynamic, d2: Dynamic| -> i64 {
        match (date_arg_millis(&d1), date_arg_millis(&d2)) {
            (Some(start), Some(end)) => ((end - start) as f64 / MILLIS_PER_DAY).ceil() as i64,
            _ => 0,
        }
    });

    // isToday(d): string equality of normalized dates

    engine.register_fn("isToday", |d: Dynamic| -> bool {
        match date_arg_normalized(&d) {
            Some(date) => date == today_string(),
            None => false,
        }
    });

    // num(v): parseFloat-style numeric coercion, 0 when not a number

    engine.register_fn("num", |v: Dynamic| -> f64 { coerce_number(&v) });

    // timerSec/timerMin/timerHr(v): current elapsed time of a timer value,
    // scaled to the unit; 0 when v is not a valid timer shape

    engine.register_fn("timerSec", |v: Dynamic| -> i64 { timer_seconds(&v) });
    engine.register_fn("timerMin", |v: Dynamic| -> f64 {
        timer_seconds(&v) as f64 / 60.0
    });
    engine.register_fn("timerHr", |v: Dynamic| -> f64 {
        timer_seconds(&v) as f64 / 3600.0
    });
}

fn today_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parse a date-ish string to epoch milliseconds. Accepts `YYYY-MM-DD`
/// (midnight UTC) and RFC 3339 / `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn parse_date_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.timestamp_millis());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
    }
    None
}

/// parseFloat-style prefix parse: the longest leading numeric prefix, or
/// `None` when the text does not start with a number.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let numeric_len = text
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    let slice = &text[..numeric_len];
    for end in (1..=slice.len()).rev() {
        if let Ok(number) = slice[..end].parse::<f64>() {
            return Some(number);
        }
    }
    None
}

fn date_arg_millis(value: &Dynamic) -> Option<i64> {
    if !value.is_string() {
        return None;
    }
    let text = value.clone().into_string().ok()?;
    parse_date_millis(&text)
}

fn date_arg_normalized(value: &Dynamic) -> Option<String> {
    let millis = date_arg_millis(value)?;
    let datetime = DateTime::from_timestamp_millis(millis)?;
    Some(datetime.format("%Y-%m-%d").to_string())
}

fn coerce_number(value: &Dynamic) -> f64 {
    if let Ok(number) = value.as_float() {
        return number;
    }
    if let Ok(number) = value.as_int() {
        return number as f64;
    }
    if value.is_string() {
        let text = value.clone().into_string().unwrap_or_default();
        return parse_float_prefix(&text).unwrap_or(0.0);
    }
    0.0
}

fn timer_seconds(value: &Dynamic) -> i64 {
    if !value.is_map() {
        return 0;
    }
    let map = value.clone().cast::<Map>();
    match TimerValue::from_map(&map) {
        Some(timer) => timer.elapsed_seconds(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::create_engine;
    use rhai::Scope;

    fn eval_int(script: &str) -> i64 {
        create_engine()
            .eval_with_scope::<i64>(&mut Scope::new(), script)
            .unwrap()
    }

    #[test]
    fn test_diff_days_whole_dates() {
        assert_eq!(eval_int(r#"diffDays("2024-01-01", "2024-01-11")"#), 10);
        assert_eq!(eval_int(r#"diffDays("2024-01-11", "2024-01-01")"#), -10);
    }

    #[test]
    fn test_diff_days_rounds_partial_days_up() {
        assert_eq!(
            eval_int(r#"diffDays("2024-01-01", "2024-01-02T06:00:00")"#),
            2
        );
    }

    #[test]
    fn test_diff_days_bad_input_is_zero() {
        assert_eq!(eval_int(r#"diffDays("", "2024-01-11")"#), 0);
        assert_eq!(eval_int(r#"diffDays("not a date", "2024-01-11")"#), 0);
    }

    #[test]
    fn test_is_today() {
        let engine = create_engine();
        let today = today_string();
        let script = format!(r#"isToday("{}")"#, today);
        assert!(engine.eval::<bool>(&script).unwrap());
        assert!(!engine.eval::<bool>(r#"isToday("1999-01-01")"#).unwrap());
        assert!(!engine.eval::<bool>(r#"isToday("")"#).unwrap());
    }

    #[test]
    fn test_num_coercion() {
        let engine = create_engine();
        assert_eq!(engine.eval::<f64>(r#"num("12.5")"#).unwrap(), 12.5);
        assert_eq!(engine.eval::<f64>(r#"num("12abc")"#).unwrap(), 12.0);
        assert_eq!(engine.eval::<f64>(r#"num("abc")"#).unwrap(), 0.0);
        assert_eq!(engine.eval::<f64>("num(7)").unwrap(), 7.0);
        assert_eq!(engine.eval::<f64>("num(())").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_float_prefix_rejects_non_numbers() {
        assert_eq!(parse_float_prefix("inf"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-3.5x"), Some(-3.5));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
    }

    #[test]
    fn test_timer_sec_stopped_timer() {
        let engine = create_engine();
        let script = r#"
            let t = #{ accumulated_seconds: 10, run_start_epoch_millis: () };
            timerSec(t)
        "#;
        assert_eq!(engine.eval::<i64>(script).unwrap(), 10);
    }

    #[test]
    fn test_timer_helpers_scale_units() {
        let engine = create_engine();
        let script = r#"
            let t = #{ accumulated_seconds: 90, run_start_epoch_millis: () };
            timerMin(t)
        "#;
        assert_eq!(engine.eval::<f64>(script).unwrap(), 1.5);
    }

    #[test]
    fn test_timer_sec_invalid_shape_is_zero() {
        let engine = create_engine();
        assert_eq!(engine.eval::<i64>(r#"timerSec("nope")"#).unwrap(), 0);
        assert_eq!(engine.eval::<i64>("timerSec(#{})").unwrap(), 0);
    }
}
