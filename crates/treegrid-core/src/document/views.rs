//! Saved-view filtering.
//!
//! A view is a named conjunction of per-column conditions. Filtering is a
//! read-side computation over display values: it never mutates rows and never
//! reorders them. A row with no value (or null) in a condition's column never
//! matches that condition.

use chrono::{DateTime, Local, NaiveDate};
use treegrid_engine::builtins::{parse_date_millis, parse_float_prefix};
use treegrid_engine::engine::{FilterCondition, FilterOperator, Node, Row, Value, ViewFilter};

/// Rows of `table` visible through `view`. `None` or an empty condition list
/// shows everything.
pub fn visible_rows<'a>(table: &'a Node, view: Option<&ViewFilter>) -> Vec<&'a Row> {
    match view {
        Some(view) if !view.conditions.is_empty() => table
            .rows
            .iter()
            .filter(|row| {
                view.conditions
                    .iter()
                    .all(|condition| condition_matches(condition, row))
            })
            .collect(),
        _ => table.rows.iter().collect(),
    }
}

fn condition_matches(condition: &FilterCondition, row: &Row) -> bool {
    let Some(value) = row.data.get(&condition.column_id) else {
        return false;
    };
    if matches!(value, Value::Null) {
        return false;
    }

    match condition.operator {
        FilterOperator::Equals => {
            value.display().to_lowercase() == condition.value.to_lowercase()
        }
        FilterOperator::Contains => value
            .display()
            .to_lowercase()
            .contains(&condition.value.to_lowercase()),
        FilterOperator::Gt => match (cell_number(value), condition.value.trim().parse::<f64>()) {
            (Some(cell), Ok(bound)) => cell > bound,
            _ => false,
        },
        FilterOperator::Lt => match (cell_number(value), condition.value.trim().parse::<f64>()) {
            (Some(cell), Ok(bound)) => cell < bound,
            _ => false,
        },
        FilterOperator::DateIs => {
            let target = if condition.value == "TODAY" {
                Local::now().format("%Y-%m-%d").to_string()
            } else {
                condition.value.clone()
            };
            match cell_date(value) {
                Some(date) => date.format("%Y-%m-%d").to_string() == target,
                None => false,
            }
        }
        FilterOperator::DateWithin => {
            // An unparseable day count filters nothing out.
            let Ok(days) = condition.value.trim().parse::<i64>() else {
                return true;
            };
            let Some(date) = cell_date(value) else {
                return false;
            };
            (Local::now().date_naive() - date).num_days().abs() <= days
        }
    }
}

fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => Some(*number),
        Value::Text(text) => parse_float_prefix(text),
        _ => None,
    }
}

fn cell_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Text(text) => {
            let millis = parse_date_millis(text)?;
            Some(DateTime::from_timestamp_millis(millis)?.date_naive())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use treegrid_engine::engine::{Column, ColumnKind, ROOT_ID, RowData};

    fn condition(column_id: &str, operator: FilterOperator, value: &str) -> FilterCondition {
        FilterCondition {
            id: "cond".to_string(),
            column_id: column_id.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    fn view_of(conditions: Vec<FilterCondition>) -> ViewFilter {
        ViewFilter {
            id: "v1".to_string(),
            name: "test".to_string(),
            conditions,
        }
    }

    fn table_with_rows(rows: Vec<(&str, Value)>) -> Node {
        let mut table = Node::table("t1", ROOT_ID, "Items");
        table.columns.push(Column::new("c1", "Field", ColumnKind::Text));
        for (id, value) in rows {
            let mut data = RowData::new();
            data.insert("c1".to_string(), value);
            table.rows.push(Row {
                id: id.to_string(),
                data,
            });
        }
        table
    }

    fn visible_ids(table: &Node, view: &ViewFilter) -> Vec<String> {
        visible_rows(table, Some(view))
            .iter()
            .map(|row| row.id.clone())
            .collect()
    }

    #[test]
    fn test_no_view_shows_everything() {
        let table = table_with_rows(vec![("r1", Value::from("a")), ("r2", Value::from("b"))]);
        assert_eq!(visible_rows(&table, None).len(), 2);
        assert_eq!(visible_rows(&table, Some(&view_of(Vec::new()))).len(), 2);
    }

    #[test]
    fn test_equals_and_contains_are_case_insensitive() {
        let table = table_with_rows(vec![
            ("r1", Value::from("Apple Pie")),
            ("r2", Value::from("banana")),
        ]);
        let equals = view_of(vec![condition("c1", FilterOperator::Equals, "apple pie")]);
        assert_eq!(visible_ids(&table, &equals), vec!["r1"]);

        let contains = view_of(vec![condition("c1", FilterOperator::Contains, "APPLE")]);
        assert_eq!(visible_ids(&table, &contains), vec!["r1"]);
    }

    #[test]
    fn test_numeric_comparisons_skip_non_numbers() {
        let table = table_with_rows(vec![
            ("r1", Value::Number(10.0)),
            ("r2", Value::from("3")),
            ("r3", Value::from("not a number")),
        ]);
        let gt = view_of(vec![condition("c1", FilterOperator::Gt, "5")]);
        assert_eq!(visible_ids(&table, &gt), vec!["r1"]);

        let lt = view_of(vec![condition("c1", FilterOperator::Lt, "5")]);
        assert_eq!(visible_ids(&table, &lt), vec!["r2"]);
    }

    #[test]
    fn test_missing_value_never_matches() {
        let mut table = table_with_rows(vec![("r1", Value::from("x"))]);
        table.rows.push(Row::new("r2"));
        let view = view_of(vec![condition("c1", FilterOperator::Contains, "")]);
        assert_eq!(visible_ids(&table, &view), vec!["r1"]);
    }

    #[test]
    fn test_date_is_today_sentinel() {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let table = table_with_rows(vec![
            ("r1", Value::Text(today)),
            ("r2", Value::from("1999-01-01")),
        ]);
        let view = view_of(vec![condition("c1", FilterOperator::DateIs, "TODAY")]);
        assert_eq!(visible_ids(&table, &view), vec!["r1"]);
    }

    #[test]
    fn test_date_within_window() {
        let yesterday = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();
        let table = table_with_rows(vec![
            ("r1", Value::Text(yesterday)),
            ("r2", Value::from("1999-01-01")),
        ]);
        let view = view_of(vec![condition("c1", FilterOperator::DateWithin, "7")]);
        assert_eq!(visible_ids(&table, &view), vec!["r1"]);

        // Unparseable window filters nothing out among date cells.
        let sloppy = view_of(vec![condition("c1", FilterOperator::DateWithin, "soon")]);
        assert_eq!(visible_ids(&table, &sloppy), vec!["r1", "r2"]);
    }

    #[test]
    fn test_conditions_are_a_conjunction() {
        let table = table_with_rows(vec![
            ("r1", Value::from("apple")),
            ("r2", Value::from("apple tart")),
        ]);
        let view = view_of(vec![
            condition("c1", FilterOperator::Contains, "apple"),
            condition("c1", FilterOperator::Contains, "tart"),
        ]);
        assert_eq!(visible_ids(&table, &view), vec!["r2"]);
    }
}
