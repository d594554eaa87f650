//! Demo tables served by `/scatter` and `/bar`

use serde_json::{Value, json};

use crate::dataset::{EntryRow, FieldSchema, FieldSpec, NumericContract};

fn rows_from_columns(columns: &[Vec<Value>]) -> Vec<EntryRow> {
    let height = columns.first().map(Vec::len).unwrap_or(0);
    (0..height)
        .map(|i| columns.iter().map(|c| c[i].clone()).collect())
        .collect()
}

/// Five points with two candidate size columns
pub fn scatter_fixture() -> (FieldSchema, Vec<EntryRow>) {
    let schema = vec![
        FieldSpec::new("1", "x", "number"),
        FieldSpec::new("2", "y", "number"),
        FieldSpec::new("3", "u", "number"),
        FieldSpec::new("4", "v", "number"),
    ];
    let columns = [
        [1, 2, 3, 4, 5].map(|n| json!(n)).to_vec(),
        [3, 6, 1, 5, 2].map(|n| json!(n)).to_vec(),
        [10, 12, 15, 20, 25].map(|n| json!(n)).to_vec(),
        [3, 20, 10, 7, 14].map(|n| json!(n)).to_vec(),
    ];
    (schema, rows_from_columns(&columns))
}

/// Eight rows grouped by `x`, stacked by `y`, filtered on `z`
pub fn bar_fixture() -> (FieldSchema, Vec<EntryRow>) {
    let schema = vec![
        FieldSpec::new("1", "x", "text"),
        FieldSpec::new("2", "y", "text"),
        FieldSpec::new("3", "z", "number"),
    ];
    let columns = [
        ["a", "b", "a", "a", "b", "a", "a", "b"].map(|s| json!(s)).to_vec(),
        ["c", "c", "c", "d", "d", "d", "e", "e"].map(|s| json!(s)).to_vec(),
        [1, 3, 5, 8, 6, 4, 2, 9].map(|n| json!(n)).to_vec(),
    ];
    (schema, rows_from_columns(&columns))
}

/// Numeric columns of the bar demo
pub fn bar_contract() -> NumericContract {
    NumericContract::new(["z"])
}
