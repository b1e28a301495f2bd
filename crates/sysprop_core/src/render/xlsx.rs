//! Excel workbook output: one worksheet per table, header cells merged over
//! their spans.
//!
//! Layout of a sheet, with `R` row dimensions and `C` column dimensions:
//! row 0 holds the column axis title merged over all value columns; rows
//! `1..=C` hold the column keys; the row axis titles sit on row `C` in
//! columns `0..R`; row keys fill columns `0..R` from row `C + 1` down.

use std::collections::HashSet;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::format_key;
use crate::error::{CoreError, Result};
use crate::key::Scalar;
use crate::result::ToolResult;
use crate::table::{Axis, Table};

/// Worksheet names are capped at 31 characters by the file format
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

fn xlsx_err(e: XlsxError) -> CoreError {
    CoreError::render("xlsx", e)
}

fn row_num(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| CoreError::render("xlsx", "too many rows for a worksheet"))
}

fn col_num(n: usize) -> Result<u16> {
    u16::try_from(n).map_err(|_| CoreError::render("xlsx", "too many columns for a worksheet"))
}

/// A valid, unused worksheet name derived from a table title
fn sheet_name(title: &str, fallback: &str, used: &mut HashSet<String>) -> String {
    let clean: String = title
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let clean = clean.trim_matches('\'').trim();
    let base = if clean.is_empty() { fallback } else { clean };

    let mut name: String = base.chars().take(MAX_SHEET_NAME).collect();
    let mut counter = 1;
    while !used.insert(name.to_lowercase()) {
        counter += 1;
        let suffix = format!("~{counter}");
        name = base
            .chars()
            .take(MAX_SHEET_NAME - suffix.chars().count())
            .collect::<String>()
            + &suffix;
    }
    name
}

fn write_scalar(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Scalar,
    format: Option<&Format>,
) -> Result<()> {
    let written = match (value, format) {
        (Scalar::Text(s), Some(f)) => sheet.write_string_with_format(row, col, s, f),
        (Scalar::Text(s), None) => sheet.write_string(row, col, s),
        (number, Some(f)) => {
            sheet.write_number_with_format(row, col, number.as_f64().unwrap_or_default(), f)
        }
        (number, None) => sheet.write_number(row, col, number.as_f64().unwrap_or_default()),
    };
    written.map(|_| ()).map_err(xlsx_err)
}

/// Write a header cell, merging when it spans more than one cell
fn write_header(
    sheet: &mut Worksheet,
    first_row: u32,
    first_col: u16,
    last_row: u32,
    last_col: u16,
    value: &Scalar,
    format: &Format,
) -> Result<()> {
    if first_row == last_row && first_col == last_col {
        return write_scalar(sheet, first_row, first_col, value, Some(format));
    }
    sheet
        .merge_range(first_row, first_col, last_row, last_col, &value.to_string(), format)
        .map(|_| ())
        .map_err(xlsx_err)
}

fn render_table(sheet: &mut Worksheet, table: &Table, bold: &Format, plain: &Format) -> Result<()> {
    let row_dims = table.row_dims();
    let col_dims = table.col_dims();
    let n_cols = table.cols().len();

    if n_cols > 0 {
        write_header(
            sheet,
            0,
            col_num(row_dims)?,
            0,
            col_num(row_dims + n_cols - 1)?,
            &Scalar::Text(table.cols_title()),
            bold,
        )?;
    }
    for (dim, title) in table.row_titles().iter().enumerate() {
        sheet
            .write_string_with_format(row_num(col_dims)?, col_num(dim)?, title, bold)
            .map_err(xlsx_err)?;
    }

    for (position, key) in table.cols().iter().enumerate() {
        let col = row_dims + position;
        let parts = format_key(key);
        for (dim, span) in table.spans(Axis::Cols, position).iter().enumerate() {
            if *span == 0 {
                continue;
            }
            let row = row_num(dim + 1)?;
            write_header(
                sheet,
                row,
                col_num(col)?,
                row,
                col_num(col + span - 1)?,
                &parts[dim],
                plain,
            )?;
        }
    }

    for (position, key) in table.rows().iter().enumerate() {
        let row = col_dims + 1 + position;
        let parts = format_key(key);
        for (dim, span) in table.spans(Axis::Rows, position).iter().enumerate() {
            if *span == 0 {
                continue;
            }
            let col = col_num(dim)?;
            write_header(
                sheet,
                row_num(row)?,
                col,
                row_num(row + span - 1)?,
                col,
                &parts[dim],
                plain,
            )?;
        }
        for (offset, value) in table.row_values(position).enumerate() {
            write_scalar(sheet, row_num(row)?, col_num(row_dims + offset)?, &value?, None)?;
        }
    }
    Ok(())
}

pub fn render(result: &ToolResult) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let plain = Format::new();
    let mut used = HashSet::new();

    for table in result {
        let name = sheet_name(table.title(), table.name(), &mut used);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name).map_err(xlsx_err)?;
        render_table(sheet, table, &bold, &plain)?;
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
