//! Zipped CSV output: one `<table name>.csv` per table, table titles stored in
//! the archive comment (one per line).

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::format_key;
use crate::error::{CoreError, Result};
use crate::result::ToolResult;
use crate::table::Table;

/// CSV text for one table. The first `col_dims` lines hold the column keys,
/// one line per dimension; every following line starts with the row key.
fn table_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let col_keys: Vec<_> = table.cols().iter().map(format_key).collect();

    for dim in 0..table.col_dims() {
        let record = std::iter::repeat_n(String::new(), table.row_dims())
            .chain(col_keys.iter().map(|key| key[dim].to_string()));
        writer
            .write_record(record)
            .map_err(|e| CoreError::render("csv", e))?;
    }

    for (row_ix, row) in table.rows().iter().enumerate() {
        let mut record: Vec<String> = format_key(row).iter().map(ToString::to_string).collect();
        for value in table.row_values(row_ix) {
            record.push(value?.to_string());
        }
        writer
            .write_record(&record)
            .map_err(|e| CoreError::render("csv", e))?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::render("csv", e.to_string()))
}

pub fn render(result: &ToolResult) -> Result<Vec<u8>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let comment = result
        .iter()
        .map(Table::title)
        .collect::<Vec<_>>()
        .join("\n");
    archive.set_comment(comment);

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for table in result {
        let body = table_csv(table)?;
        archive
            .start_file(format!("{}.csv", table.name()), options)
            .map_err(|e| CoreError::render("zip", e))?;
        archive
            .write_all(&body)
            .map_err(|e| CoreError::render("zip", e))?;
    }

    let cursor = archive.finish().map_err(|e| CoreError::render("zip", e))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use zip::ZipArchive;

    fn records(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<Vec<String>> {
        let mut text = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn one_csv_per_table_with_titles_in_comment() {
        let bytes = render(&fixtures::result()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        assert_eq!(archive.comment(), b"Demo 1\nGrouped values");
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["temps.csv", "grid.csv"]);

        assert_eq!(
            records(&mut archive, "temps.csv"),
            vec![
                vec!["", "2", "3"],
                vec!["30", "60", "90"],
                vec!["10", "20", "30"],
                vec!["20", "40", "60"],
            ]
        );
    }

    #[test]
    fn multi_dimension_axes_spread_over_lines_and_columns() {
        let bytes = render(&fixtures::result()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let grid = records(&mut archive, "grid.csv");

        assert_eq!(grid[0], vec!["", "", "A", "A", "B"]);
        assert_eq!(grid[1], vec!["", "", "1", "2", "1"]);
        assert_eq!(
            grid[2],
            vec!["CCO", "gas", "CCO, gas|A, 1", "CCO, gas|A, 2", "CCO, gas|B, 1"]
        );
        assert_eq!(grid.len(), 5);
    }
}
