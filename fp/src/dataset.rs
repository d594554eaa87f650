//! Tabular assembly of form entries
//!
//! Entries arrive as positional value arrays that line up with the schema's
//! field order. Assembly zips them against the schema, coerces the columns
//! named by a [`NumericContract`] to `f64`, and produces a column-major
//! [`Dataset`]. Any bad row or cell fails the whole dataset.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// One field of the remote entity's column layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "fieldId", deserialize_with = "string_or_number")]
    pub field_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl FieldSpec {
    pub fn new(field_id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Remote APIs hand out field ids as either strings or integers
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

/// Ordered column layout
pub type FieldSchema = Vec<FieldSpec>;

/// Raw values of one entry, positioned per schema order
pub type EntryRow = Vec<Value>;

/// Columns that must hold floating-point values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericContract(Vec<String>);

impl NumericContract {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    /// `x`, `y`, `u`, `v`: the scatter plot's position and size columns
    pub fn scatter() -> Self {
        Self::new(["x", "y", "u", "v"])
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }
}

/// Errors from assembling entries into a dataset
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("Row {row_index} has {found} values but the schema has {expected} fields")]
    RowArityMismatch {
        row_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' row {row_index}: cannot convert {value} to a number")]
    NumericCoercionFailed {
        column: String,
        row_index: usize,
        value: String,
    },

    #[error("Field name '{name}' appears more than once in the schema")]
    DuplicateColumn { name: String },

    #[error("Required column '{column}' is not in the schema")]
    MissingColumn { column: String },

    #[error("Column '{column}' is not numeric")]
    NotNumeric { column: String },
}

/// Cell storage of one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Raw(Vec<Value>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Raw(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_json(&self) -> Value {
        match self {
            ColumnData::Float(v) => Value::from(v.clone()),
            ColumnData::Raw(v) => Value::Array(v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub spec: FieldSpec,
    pub data: ColumnData,
}

/// Rectangular, column-major table handed to the visualization binder
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.spec.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.spec.name == name)
    }

    pub fn float_column(&self, name: &str) -> Option<&[f64]> {
        match &self.column(name)?.data {
            ColumnData::Float(v) => Some(v),
            ColumnData::Raw(_) => None,
        }
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.float_column(name).is_some()
    }

    /// Column values rendered as display labels, for grouping
    fn labels(&self, name: &str) -> Result<Vec<String>, AssemblyError> {
        let column = self.column(name).ok_or_else(|| AssemblyError::MissingColumn {
            column: name.to_string(),
        })?;
        Ok(match &column.data {
            ColumnData::Float(v) => v.iter().map(|f| f.to_string()).collect(),
            ColumnData::Raw(v) => v
                .iter()
                .map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        })
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data: serde_json::Map<String, Value> = self
            .columns
            .iter()
            .map(|c| (c.spec.name.clone(), c.data.to_json()))
            .collect();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("columns", &self.column_names())?;
        map.serialize_entry("data", &data)?;
        map.end()
    }
}

/// Parse one contract cell the way a float constructor would
///
/// Only finite results count: "nan" and "inf" strings fail like any other
/// non-numeric text, since they would not survive JSON serialization.
fn coerce(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Assemble with the scatter contract (`x`, `y`, `u`, `v` numeric)
pub fn assemble(schema: FieldSchema, rows: Vec<EntryRow>) -> Result<Dataset, AssemblyError> {
    assemble_with(schema, rows, &NumericContract::scatter())
}

/// Zip rows against the schema and coerce the contract's columns
///
/// Row values are assigned to fields by position only.
pub fn assemble_with(
    schema: FieldSchema,
    rows: Vec<EntryRow>,
    contract: &NumericContract,
) -> Result<Dataset, AssemblyError> {
    debug!(fields = schema.len(), rows = rows.len(), contract = ?contract.columns(), "assemble_with: called");

    let mut seen = HashSet::new();
    for field in &schema {
        if !seen.insert(field.name.as_str()) {
            return Err(AssemblyError::DuplicateColumn {
                name: field.name.clone(),
            });
        }
    }
    if let Some(missing) = contract.columns().iter().find(|c| !seen.contains(c.as_str())) {
        return Err(AssemblyError::MissingColumn {
            column: missing.clone(),
        });
    }

    let width = schema.len();
    let row_count = rows.len();
    let mut raw: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(row_count)).collect();
    for (row_index, row) in rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(AssemblyError::RowArityMismatch {
                row_index,
                expected: width,
                found: row.len(),
            });
        }
        for (cells, value) in raw.iter_mut().zip(row) {
            cells.push(value);
        }
    }

    let mut columns = Vec::with_capacity(width);
    for (spec, cells) in schema.into_iter().zip(raw) {
        let data = if contract.contains(&spec.name) {
            let mut floats = Vec::with_capacity(cells.len());
            for (row_index, cell) in cells.iter().enumerate() {
                let parsed = coerce(cell).ok_or_else(|| AssemblyError::NumericCoercionFailed {
                    column: spec.name.clone(),
                    row_index,
                    value: cell.to_string(),
                })?;
                floats.push(parsed);
            }
            ColumnData::Float(floats)
        } else {
            ColumnData::Raw(cells)
        };
        columns.push(Column { spec, data });
    }

    debug!(columns = columns.len(), rows = row_count, "assemble_with: done");
    Ok(Dataset {
        columns,
        rows: row_count,
    })
}

/// Inclusive bounds on a numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub low: f64,
    pub high: f64,
}

/// Row counts per (group, category), as stacked bars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crosstab {
    /// Distinct group values, sorted
    pub groups: Vec<String>,
    /// Distinct category values, sorted
    pub categories: Vec<String>,
    /// `counts[category][group]`
    pub counts: Vec<Vec<u64>>,
}

impl Crosstab {
    pub fn count(&self, group: &str, category: &str) -> Option<u64> {
        let g = self.groups.iter().position(|x| x == group)?;
        let c = self.categories.iter().position(|x| x == category)?;
        Some(self.counts[c][g])
    }
}

/// Count rows by `group` and `color`, optionally keeping only rows in range
///
/// Groups and categories are taken from the whole dataset so that filtering
/// never removes a bar or a legend entry; filtered-out combinations count zero.
pub fn crosstab(
    dataset: &Dataset,
    group: &str,
    color: &str,
    filter: Option<&RangeFilter>,
) -> Result<Crosstab, AssemblyError> {
    debug!(%group, %color, ?filter, "crosstab: called");
    let group_labels = dataset.labels(group)?;
    let color_labels = dataset.labels(color)?;
    let filter_values = match filter {
        Some(f) => Some(dataset.float_column(&f.column).ok_or_else(|| {
            if dataset.column(&f.column).is_some() {
                AssemblyError::NotNumeric {
                    column: f.column.clone(),
                }
            } else {
                AssemblyError::MissingColumn {
                    column: f.column.clone(),
                }
            }
        })?),
        None => None,
    };

    let groups: Vec<String> = group_labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
    let categories: Vec<String> = color_labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();

    let mut tally: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for row in 0..dataset.len() {
        if let (Some(f), Some(values)) = (filter, filter_values) {
            let v = values[row];
            if v < f.low || v > f.high {
                continue;
            }
        }
        *tally.entry((group_labels[row].as_str(), color_labels[row].as_str())).or_default() += 1;
    }

    let counts = categories
        .iter()
        .map(|c| {
            groups
                .iter()
                .map(|g| tally.get(&(g.as_str(), c.as_str())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(Crosstab {
        groups,
        categories,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn scatter_schema() -> FieldSchema {
        vec![
            FieldSpec::new("1", "x", "number"),
            FieldSpec::new("2", "y", "number"),
            FieldSpec::new("3", "u", "number"),
            FieldSpec::new("4", "v", "number"),
        ]
    }

    fn strings(values: &[&str]) -> EntryRow {
        values.iter().map(|v| json!(v)).collect()
    }

    #[test]
    fn test_single_row_scatter() {
        let dataset = assemble(scatter_schema(), vec![strings(&["1", "3", "10", "3"])]).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.column_names(), vec!["x", "y", "u", "v"]);
        assert_eq!(dataset.float_column("x"), Some(&[1.0][..]));
        assert_eq!(dataset.float_column("y"), Some(&[3.0][..]));
        assert_eq!(dataset.float_column("u"), Some(&[10.0][..]));
        assert_eq!(dataset.float_column("v"), Some(&[3.0][..]));
    }

    #[test]
    fn test_non_numeric_cell_names_column_and_row() {
        let err = assemble(scatter_schema(), vec![strings(&["1", "3", "x", "3"])]).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::NumericCoercionFailed {
                column: "u".to_string(),
                row_index: 0,
                value: "\"x\"".to_string(),
            }
        );
    }

    #[test]
    fn test_coercion_accepts_numbers_and_padded_strings() {
        let rows = vec![vec![json!(1), json!(" 2.5 "), json!(-3), json!("1e3")]];
        let dataset = assemble(scatter_schema(), rows).unwrap();
        assert_eq!(dataset.float_column("x"), Some(&[1.0][..]));
        assert_eq!(dataset.float_column("y"), Some(&[2.5][..]));
        assert_eq!(dataset.float_column("u"), Some(&[-3.0][..]));
        assert_eq!(dataset.float_column("v"), Some(&[1000.0][..]));
    }

    #[test]
    fn test_null_and_bool_cells_fail_coercion() {
        let err = assemble(scatter_schema(), vec![vec![json!(1), json!(null), json!(1), json!(1)]]).unwrap_err();
        assert!(matches!(err, AssemblyError::NumericCoercionFailed { ref column, .. } if column == "y"));

        let err = assemble(scatter_schema(), vec![vec![json!(1), json!(1), json!(1), json!(true)]]).unwrap_err();
        assert!(matches!(err, AssemblyError::NumericCoercionFailed { ref column, .. } if column == "v"));
    }

    #[test]
    fn test_non_finite_strings_fail_coercion() {
        for text in ["nan", "inf", "-infinity", " NaN "] {
            let err = assemble(scatter_schema(), vec![vec![json!(1), json!(2), json!(text), json!(4)]]).unwrap_err();
            assert_eq!(
                err,
                AssemblyError::NumericCoercionFailed {
                    column: "u".to_string(),
                    row_index: 0,
                    value: format!("{:?}", text),
                },
                "{text}"
            );
        }
    }

    #[test]
    fn test_extra_columns_stay_raw() {
        let mut schema = scatter_schema();
        schema.push(FieldSpec::new("5", "label", "text"));
        let dataset = assemble(schema, vec![vec![json!(1), json!(2), json!(3), json!(4), json!("north")]]).unwrap();

        assert!(!dataset.is_numeric("label"));
        assert_eq!(dataset.column("label").unwrap().data, ColumnData::Raw(vec![json!("north")]));
    }

    #[test]
    fn test_short_and_long_rows_rejected() {
        let err = assemble(
            scatter_schema(),
            vec![strings(&["1", "2", "3", "4"]), strings(&["1", "2", "3"])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::RowArityMismatch {
                row_index: 1,
                expected: 4,
                found: 3
            }
        );

        let err = assemble(scatter_schema(), vec![strings(&["1", "2", "3", "4", "5"])]).unwrap_err();
        assert!(matches!(err, AssemblyError::RowArityMismatch { found: 5, .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut schema = scatter_schema();
        schema.push(FieldSpec::new("9", "x", "number"));
        let err = assemble(schema, vec![]).unwrap_err();
        assert_eq!(err, AssemblyError::DuplicateColumn { name: "x".to_string() });
    }

    #[test]
    fn test_missing_contract_column() {
        let schema = vec![FieldSpec::new("1", "x", "number"), FieldSpec::new("2", "y", "number")];
        let err = assemble(schema, vec![]).unwrap_err();
        assert_eq!(err, AssemblyError::MissingColumn { column: "u".to_string() });
    }

    #[test]
    fn test_empty_rows_give_empty_dataset() {
        let dataset = assemble(scatter_schema(), vec![]).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.float_column("x"), Some(&[][..]));
    }

    #[test]
    fn test_row_order_preserved() {
        let rows = vec![strings(&["3", "0", "1", "1"]), strings(&["1", "0", "1", "1"]), strings(&["2", "0", "1", "1"])];
        let dataset = assemble(scatter_schema(), rows).unwrap();
        assert_eq!(dataset.float_column("x"), Some(&[3.0, 1.0, 2.0][..]));
    }

    #[test]
    fn test_field_id_accepts_numbers() {
        let spec: FieldSpec = serde_json::from_value(json!({"fieldId": 17, "name": "x", "type": "number"})).unwrap();
        assert_eq!(spec.field_id, "17");
        assert_eq!(spec.kind, "number");
    }

    #[test]
    fn test_serialize_column_major() {
        let dataset = assemble(scatter_schema(), vec![strings(&["1", "3", "10", "3"])]).unwrap();
        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["columns"], json!(["x", "y", "u", "v"]));
        assert_eq!(json["data"]["u"], json!([10.0]));
    }

    fn bar_dataset() -> Dataset {
        let schema = vec![
            FieldSpec::new("1", "x", "text"),
            FieldSpec::new("2", "y", "text"),
            FieldSpec::new("3", "z", "number"),
        ];
        let rows = [
            ("a", "c", 1),
            ("b", "c", 3),
            ("a", "c", 5),
            ("a", "d", 8),
            ("b", "d", 6),
            ("a", "d", 4),
            ("a", "e", 2),
            ("b", "e", 9),
        ]
        .iter()
        .map(|(x, y, z)| vec![json!(x), json!(y), json!(z)])
        .collect();
        assemble_with(schema, rows, &NumericContract::new(["z"])).unwrap()
    }

    #[test]
    fn test_crosstab_unfiltered() {
        let table = crosstab(&bar_dataset(), "x", "y", None).unwrap();
        assert_eq!(table.groups, vec!["a", "b"]);
        assert_eq!(table.categories, vec!["c", "d", "e"]);
        assert_eq!(table.count("a", "c"), Some(2));
        assert_eq!(table.count("a", "d"), Some(2));
        assert_eq!(table.count("a", "e"), Some(1));
        assert_eq!(table.count("b", "c"), Some(1));
        assert_eq!(table.count("b", "d"), Some(1));
        assert_eq!(table.count("b", "e"), Some(1));
    }

    #[test]
    fn test_crosstab_range_keeps_empty_combinations() {
        let filter = RangeFilter {
            column: "z".to_string(),
            low: 2.0,
            high: 8.0,
        };
        let table = crosstab(&bar_dataset(), "x", "y", Some(&filter)).unwrap();
        assert_eq!(table.count("a", "c"), Some(1));
        assert_eq!(table.count("a", "d"), Some(2));
        assert_eq!(table.count("a", "e"), Some(1));
        assert_eq!(table.count("b", "c"), Some(1));
        assert_eq!(table.count("b", "d"), Some(1));
        assert_eq!(table.count("b", "e"), Some(0));
    }

    #[test]
    fn test_crosstab_filter_column_must_be_numeric() {
        let filter = RangeFilter {
            column: "y".to_string(),
            low: 0.0,
            high: 1.0,
        };
        let err = crosstab(&bar_dataset(), "x", "y", Some(&filter)).unwrap_err();
        assert_eq!(err, AssemblyError::NotNumeric { column: "y".to_string() });

        let err = crosstab(&bar_dataset(), "x", "w", None).unwrap_err();
        assert_eq!(err, AssemblyError::MissingColumn { column: "w".to_string() });
    }

    proptest! {
        #[test]
        fn prop_wrong_arity_never_yields_dataset(
            width in 1usize..6,
            lengths in proptest::collection::vec(0usize..8, 1..6),
        ) {
            let schema: FieldSchema = (0..width).map(|i| FieldSpec::new(i.to_string(), format!("c{i}"), "text")).collect();
            let rows: Vec<EntryRow> = lengths.iter().map(|&n| vec![json!("v"); n]).collect();
            let first_bad = lengths.iter().position(|&n| n != width);

            match (assemble_with(schema, rows, &NumericContract::new(Vec::<String>::new())), first_bad) {
                (Ok(dataset), None) => prop_assert_eq!(dataset.len(), lengths.len()),
                (Err(AssemblyError::RowArityMismatch { row_index, expected, .. }), Some(bad)) => {
                    prop_assert_eq!(row_index, bad);
                    prop_assert_eq!(expected, width);
                }
                (other, bad) => prop_assert!(false, "unexpected {:?} (first bad row {:?})", other, bad),
            }
        }

        #[test]
        fn prop_numeric_strings_parse_bit_equal(values in proptest::collection::vec(any::<f64>().prop_filter("finite", |f| f.is_finite()), 4)) {
            let row: EntryRow = values.iter().map(|f| json!(f.to_string())).collect();
            let dataset = assemble(scatter_schema(), vec![row]).unwrap();
            for (name, expected) in ["x", "y", "u", "v"].iter().zip(&values) {
                let parsed = dataset.float_column(name).unwrap()[0];
                let standard: f64 = expected.to_string().parse().unwrap();
                prop_assert_eq!(parsed.to_bits(), standard.to_bits());
            }
        }

        #[test]
        fn prop_letters_fail_coercion(bad in "[a-mo-z]{1,5}", position in 0usize..4) {
            let mut row = strings(&["1", "2", "3", "4"]);
            row[position] = json!(bad);
            let err = assemble(scatter_schema(), vec![row]).unwrap_err();
            let expected_column = ["x", "y", "u", "v"][position];
            let names_column = matches!(
                err,
                AssemblyError::NumericCoercionFailed { ref column, row_index: 0, .. } if column == expected_column
            );
            prop_assert!(names_column);
        }
    }
}
