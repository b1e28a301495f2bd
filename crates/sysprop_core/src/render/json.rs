//! JSON output: one object per table with a flat list of cell records

use serde::Serialize;
use serde_json::Value;

use super::key_json;
use crate::error::{CoreError, Result};
use crate::result::ToolResult;
use crate::table::Table;

#[derive(Serialize)]
struct TableDoc<'a> {
    name: &'a str,
    title: &'a str,
    rows_title: Value,
    cols_title: Value,
    data: Vec<Cell>,
}

#[derive(Serialize)]
struct Cell {
    key: (Value, Value),
    value: Value,
}

/// Titles follow the key rule: a string for one dimension, a list otherwise
fn titles_json(titles: &[String]) -> Value {
    match titles {
        [single] => Value::String(single.clone()),
        many => Value::from(many.to_vec()),
    }
}

fn table_doc(table: &Table) -> Result<TableDoc<'_>> {
    let mut data = Vec::with_capacity(table.rows().len() * table.cols().len());
    for (row_ix, row) in table.rows().iter().enumerate() {
        let row_key = key_json(row);
        for (col_ix, col) in table.cols().iter().enumerate() {
            let value = table.cell(row_ix, col_ix)?;
            data.push(Cell {
                key: (row_key.clone(), key_json(col)),
                value: Value::from(&value),
            });
        }
    }
    Ok(TableDoc {
        name: table.name(),
        title: table.title(),
        rows_title: titles_json(table.row_titles()),
        cols_title: titles_json(table.col_titles()),
        data,
    })
}

pub fn render(result: &ToolResult) -> Result<Vec<u8>> {
    let docs = result.iter().map(table_doc).collect::<Result<Vec<_>>>()?;
    serde_json::to_vec(&docs).map_err(|e| CoreError::render("json", e))
}
