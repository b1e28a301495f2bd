//! HTML output: one `<table>` element per table, wrapped in a single `<div>`.
//!
//! The header carries the column axis title over all value columns, then one
//! row per column dimension with merged key cells. Body rows start with the
//! row key cells, merged downwards over their spans.

use std::fmt::Write;

use quick_xml::escape::escape;

use super::format_key;
use crate::error::{CoreError, Result};
use crate::result::ToolResult;
use crate::table::{Axis, Table};

fn span_attr(name: &str, span: usize) -> String {
    if span > 1 {
        format!(" {name}=\"{span}\"")
    } else {
        String::new()
    }
}

fn render_table(out: &mut String, table: &Table) -> Result<()> {
    let row_dims = table.row_dims();
    let col_dims = table.col_dims();
    let n_cols = table.cols().len();

    let _ = write!(
        out,
        "<table class=\"result\" id=\"{}\"><caption>{}</caption><thead>",
        escape(table.name()),
        escape(table.title())
    );

    out.push_str("<tr>");
    for _ in 0..row_dims {
        out.push_str("<th></th>");
    }
    let _ = write!(
        out,
        "<th{}>{}</th></tr>",
        span_attr("colspan", n_cols),
        escape(&table.cols_title())
    );

    let col_keys: Vec<_> = table.cols().iter().map(format_key).collect();
    for dim in 0..col_dims {
        out.push_str("<tr>");
        // row titles label the innermost column header line
        if dim + 1 == col_dims {
            for title in table.row_titles() {
                let _ = write!(out, "<th>{}</th>", escape(title));
            }
        } else {
            for _ in 0..row_dims {
                out.push_str("<th></th>");
            }
        }
        for (position, key) in col_keys.iter().enumerate() {
            let span = table.spans(Axis::Cols, position)[dim];
            if span == 0 {
                continue;
            }
            let _ = write!(
                out,
                "<th{}>{}</th>",
                span_attr("colspan", span),
                escape(&key[dim].to_string())
            );
        }
        out.push_str("</tr>");
    }
    out.push_str("</thead><tbody>");

    for (position, key) in table.rows().iter().enumerate() {
        out.push_str("<tr>");
        let parts = format_key(key);
        for (dim, span) in table.spans(Axis::Rows, position).iter().enumerate() {
            if *span == 0 {
                continue;
            }
            let _ = write!(
                out,
                "<th{}>{}</th>",
                span_attr("rowspan", *span),
                escape(&parts[dim].to_string())
            );
        }
        for value in table.row_values(position) {
            let _ = write!(out, "<td>{}</td>", escape(&value?.to_string()));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    Ok(())
}

/// Render to an HTML fragment. The caller decides whether to wrap it in a
/// full document.
pub fn render(result: &ToolResult) -> Result<Vec<u8>> {
    let mut out = String::from("<div class=\"results\">");
    for table in result {
        render_table(&mut out, table)?;
    }
    out.push_str("</div>");
    Ok(out.into_bytes())
}

/// Render to a fragment string
pub fn render_fragment(result: &ToolResult) -> Result<String> {
    String::from_utf8(render(result)?).map_err(|e| CoreError::render("html", e))
}

/// Wrap a fragment in a standalone page under a heading
pub fn wrap_document(title: &str, fragment: &str) -> String {
    let title = escape(title);
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>{fragment}</body></html>"
    )
}

/// A standalone page holding the rendered tables
pub fn render_document(title: &str, result: &ToolResult) -> Result<Vec<u8>> {
    Ok(wrap_document(title, &render_fragment(result)?).into_bytes())
}
