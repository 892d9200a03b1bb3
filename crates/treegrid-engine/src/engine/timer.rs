//! Stopwatch cell values.
//!
//! A timer accumulates whole seconds while stopped and accrues live while
//! running. Only explicit start/stop toggles mutate stored state; a running
//! timer's current value is derived from the wall clock at read time.
//!
//! State transitions take an explicit `now` in epoch milliseconds so callers
//! (and tests) control the clock; the argument-less wrappers read the system
//! clock.

use chrono::Utc;
use rhai::{Dynamic, Map};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerValue {
    #[serde(default)]
    pub accumulated_seconds: i64,
    /// `None` means stopped.
    #[serde(default)]
    pub run_start_epoch_millis: Option<i64>,
}

impl TimerValue {
    pub fn stopped(accumulated_seconds: i64) -> TimerValue {
        TimerValue {
            accumulated_seconds,
            run_start_epoch_millis: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_start_epoch_millis.is_some()
    }

    /// Begin accruing. No-op when already running.
    pub fn start_at(&mut self, now_millis: i64) {
        if self.run_start_epoch_millis.is_none() {
            self.run_start_epoch_millis = Some(now_millis);
        }
    }

    /// Fold the running span into `accumulated_seconds`, truncating toward
    /// zero seconds. No-op when already stopped.
    pub fn stop_at(&mut self, now_millis: i64) {
        if let Some(start) = self.run_start_epoch_millis.take() {
            self.accumulated_seconds += (now_millis - start).div_euclid(1000);
        }
    }

    pub fn toggle_at(&mut self, now_millis: i64) {
        if self.is_running() {
            self.stop_at(now_millis);
        } else {
            self.start_at(now_millis);
        }
    }

    /// Current elapsed whole seconds as of `now_millis`. Read-only.
    pub fn elapsed_seconds_at(&self, now_millis: i64) -> i64 {
        match self.run_start_epoch_millis {
            Some(start) => self.accumulated_seconds + (now_millis - start).div_euclid(1000),
            None => self.accumulated_seconds,
        }
    }

    /// Current elapsed whole seconds against the system clock.
    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed_seconds_at(now_millis())
    }

    pub fn to_map(&self) -> Map {
        let mut map = Map::new();
        map.insert(
            "accumulated_seconds".into(),
            Dynamic::from(self.accumulated_seconds),
        );
        map.insert(
            "run_start_epoch_millis".into(),
            match self.run_start_epoch_millis {
                Some(start) => Dynamic::from(start),
                None => Dynamic::UNIT,
            },
        );
        map
    }

    /// Recover a timer from a script-side map. Returns `None` when the map
    /// does not have the timer shape.
    pub fn from_map(map: &Map) -> Option<TimerValue> {
        let accumulated_seconds = map.get("accumulated_seconds")?.as_int().ok()?;
        let run_start_epoch_millis = match map.get("run_start_epoch_millis") {
            Some(value) if !value.is_unit() => Some(value.as_int().ok()?),
            _ => None,
        };
        Some(TimerValue {
            accumulated_seconds,
            run_start_epoch_millis,
        })
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a second count as `H:MM:SS` for display.
pub fn format_clock(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
