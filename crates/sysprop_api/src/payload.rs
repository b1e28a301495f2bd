//! RPC result payload
//!
//! JSON object keys are always strings, so each table declares the type of
//! its row and column keys. Clients use the declaration to turn the keys of
//! `data` back into numbers. `order`, `rows` and `cols` keep declaration
//! order, which JSON objects do not guarantee.
//!
//! ```json
//! {
//!   "order": ["temps"],
//!   "tables": {"temps": {"title": "Demo 1", "rows_title": "Temperatures",
//!     "cols_title": "Scaling factors", "rows_type": "float", "cols_type": "int",
//!     "rows": ["10", "20"], "cols": ["2", "3"]}},
//!   "data": {"temps": {"2": {"10": 20.0, "20": 40.0}, "3": {"10": 30.0, "20": 60.0}}}
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sysprop_core::key::{AxisKey, Scalar};
use sysprop_core::render::key_text;
use sysprop_core::{CoreError, Result, Table, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Int,
    Float,
    Str,
}

impl KeyType {
    /// The narrowest type every key on an axis fits
    pub fn of_axis(keys: &[AxisKey]) -> Self {
        let mut kind = KeyType::Int;
        for key in keys {
            let [part] = key.parts() else {
                return KeyType::Str;
            };
            match part.to_scalar() {
                Scalar::Int(_) => {}
                Scalar::Float(_) => kind = KeyType::Float,
                Scalar::Text(_) => return KeyType::Str,
            }
        }
        if keys.is_empty() { KeyType::Str } else { kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub title: String,
    pub rows_title: String,
    pub cols_title: String,
    pub rows_type: KeyType,
    pub cols_type: KeyType,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
}

/// `data[table][col][row]`
pub type TableData = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub order: Vec<String>,
    pub tables: BTreeMap<String, TableInfo>,
    pub data: BTreeMap<String, TableData>,
}

/// Text forms of an axis's keys. JSON object keys are text, so two keys
/// that print the same would share one cell.
fn axis_text(table: &Table, axis: &str, keys: &[AxisKey]) -> Result<Vec<String>> {
    let texts: Vec<String> = keys.iter().map(key_text).collect();
    let mut seen = HashSet::new();
    for text in &texts {
        if !seen.insert(text.as_str()) {
            return Err(CoreError::invalid_table(
                table.name(),
                format!("two {axis} keys are both written as '{text}'"),
            ));
        }
    }
    Ok(texts)
}

fn table_data(table: &Table, rows: &[String], cols: &[String]) -> Result<TableData> {
    let mut data = TableData::new();
    for (col, col_text) in table.cols().iter().zip(cols) {
        let mut column = BTreeMap::new();
        for (row, row_text) in table.rows().iter().zip(rows) {
            let value = table.value_at(row, col)?;
            column.insert(row_text.clone(), Value::from(&value));
        }
        data.insert(col_text.clone(), column);
    }
    Ok(data)
}

impl ResultPayload {
    /// Evaluate every cell of `result`. Fails on the first cell that cannot
    /// be computed, or when two keys on one axis have the same text.
    pub fn from_result(result: &ToolResult) -> Result<Self> {
        let mut payload = Self::default();
        for table in result {
            let name = table.name().to_string();
            let rows = axis_text(table, "row", table.rows())?;
            let cols = axis_text(table, "column", table.cols())?;
            let data = table_data(table, &rows, &cols)?;
            payload.order.push(name.clone());
            payload.tables.insert(
                name.clone(),
                TableInfo {
                    title: table.title().to_string(),
                    rows_title: table.rows_title(),
                    cols_title: table.cols_title(),
                    rows_type: KeyType::of_axis(table.rows()),
                    cols_type: KeyType::of_axis(table.cols()),
                    rows,
                    cols,
                },
            );
            payload.data.insert(name, data);
        }
        Ok(payload)
    }
}
