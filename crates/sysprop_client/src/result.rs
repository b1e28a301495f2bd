//! Typed views of remote results
//!
//! JSON object keys are strings. Each table in a result payload declares the
//! type of its row and column keys, and the keys are converted back to that
//! type here so that lookups use the same values the tool produced.

use std::fmt;

use serde_json::Value;
use sysprop_api::{KeyType, ResultPayload, TableInfo};

use crate::error::{ClientError, Result};

/// A row or column key restored to its declared type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedKey {
    Int(i64),
    Float(f64),
    Str(String),
}

impl TypedKey {
    fn parse(text: &str, kind: KeyType) -> Result<Self> {
        let invalid = || ClientError::protocol(format!("key '{text}' is not a valid {kind:?}"));
        Ok(match kind {
            KeyType::Int => TypedKey::Int(text.parse().map_err(|_| invalid())?),
            KeyType::Float => TypedKey::Float(text.parse().map_err(|_| invalid())?),
            KeyType::Str => TypedKey::Str(text.to_string()),
        })
    }
}

impl fmt::Display for TypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedKey::Int(v) => write!(f, "{v}"),
            TypedKey::Float(v) => write!(f, "{v}"),
            TypedKey::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for TypedKey {
    fn from(value: i64) -> Self {
        TypedKey::Int(value)
    }
}

impl From<i32> for TypedKey {
    fn from(value: i32) -> Self {
        TypedKey::Int(value.into())
    }
}

impl From<f64> for TypedKey {
    fn from(value: f64) -> Self {
        TypedKey::Float(value)
    }
}

impl From<&str> for TypedKey {
    fn from(value: &str) -> Self {
        TypedKey::Str(value.to_string())
    }
}

impl From<String> for TypedKey {
    fn from(value: String) -> Self {
        TypedKey::Str(value)
    }
}

/// One decoded table. Values are stored column-major, matching the
/// `[col][row]` lookup order of the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTable {
    pub name: String,
    pub title: String,
    pub rows_title: String,
    pub cols_title: String,
    pub rows: Vec<TypedKey>,
    pub cols: Vec<TypedKey>,
    values: Vec<Vec<Value>>,
}

impl RemoteTable {
    fn decode(name: &str, info: &TableInfo, payload: &ResultPayload) -> Result<Self> {
        let data = payload
            .data
            .get(name)
            .ok_or_else(|| ClientError::protocol(format!("no data for table '{name}'")))?;

        let values = info
            .cols
            .iter()
            .map(|col| {
                let column = data.get(col).ok_or_else(|| {
                    ClientError::protocol(format!("table '{name}' has no column '{col}'"))
                })?;
                info.rows
                    .iter()
                    .map(|row| {
                        column.get(row).cloned().ok_or_else(|| {
                            ClientError::protocol(format!(
                                "table '{name}' has no value at ({row}, {col})"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            title: info.title.clone(),
            rows_title: info.rows_title.clone(),
            cols_title: info.cols_title.clone(),
            rows: info
                .rows
                .iter()
                .map(|text| TypedKey::parse(text, info.rows_type))
                .collect::<Result<_>>()?,
            cols: info
                .cols
                .iter()
                .map(|text| TypedKey::parse(text, info.cols_type))
                .collect::<Result<_>>()?,
            values,
        })
    }

    /// `table[col][row]`
    pub fn get(&self, col: impl Into<TypedKey>, row: impl Into<TypedKey>) -> Option<&Value> {
        let (col, row) = (col.into(), row.into());
        let c = self.cols.iter().position(|k| *k == col)?;
        let r = self.rows.iter().position(|k| *k == row)?;
        self.values.get(c)?.get(r)
    }

    /// Values of one row, in column order
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.values.iter().filter_map(move |column| column.get(index))
    }
}

/// Every table of a remote result, in the order the tool produced them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteResult {
    tables: Vec<RemoteTable>,
}

impl RemoteResult {
    pub fn decode(payload: &ResultPayload) -> Result<Self> {
        let tables = payload
            .order
            .iter()
            .map(|name| {
                let info = payload.tables.get(name).ok_or_else(|| {
                    ClientError::protocol(format!("table '{name}' is listed but not described"))
                })?;
                RemoteTable::decode(name, info, payload)
            })
            .collect::<Result<_>>()?;
        Ok(Self { tables })
    }

    pub fn get(&self, name: &str) -> Option<&RemoteTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RemoteTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a RemoteResult {
    type Item = &'a RemoteTable;
    type IntoIter = std::slice::Iter<'a, RemoteTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// What a successful call returned
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    /// A plain `{"result": value}` response
    Value(Value),
    Tables(RemoteResult),
}

impl CallOutput {
    pub(crate) fn decode(body: Value) -> Result<Self> {
        let Value::Object(mut fields) = body else {
            return Err(ClientError::protocol("response is not a JSON object"));
        };
        if fields.contains_key("tables") {
            let payload: ResultPayload = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ClientError::protocol(format!("malformed result tables: {e}")))?;
            return RemoteResult::decode(&payload).map(CallOutput::Tables);
        }
        fields
            .remove("result")
            .map(CallOutput::Value)
            .ok_or_else(|| ClientError::protocol("response has neither 'result' nor 'tables'"))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            CallOutput::Value(value) => Some(value),
            CallOutput::Tables(_) => None,
        }
    }

    pub fn as_tables(&self) -> Option<&RemoteResult> {
        match self {
            CallOutput::Tables(tables) => Some(tables),
            CallOutput::Value(_) => None,
        }
    }
}
