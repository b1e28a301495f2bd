//! XML output
//!
//! ```xml
//! <tables>
//!   <table name="temps" title="Demo 1">
//!     <columns title="Scale"><column id="2"/>...</columns>
//!     <rows title="Temperature"><row id="10"><data value="20"/>...</row>...</rows>
//!   </table>
//! </tables>
//! ```

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::key_text;
use crate::error::{CoreError, Result};
use crate::result::ToolResult;
use crate::table::Table;

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| CoreError::render("xml", e))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }
}

fn render_table(out: &mut XmlOut, table: &Table) -> Result<()> {
    out.start("table", &[("name", table.name()), ("title", table.title())])?;

    let cols_title = table.cols_title();
    out.start("columns", &[("title", &cols_title)])?;
    for col in table.cols() {
        out.empty("column", &[("id", &key_text(col))])?;
    }
    out.end("columns")?;

    let rows_title = table.rows_title();
    out.start("rows", &[("title", &rows_title)])?;
    for (row_ix, row) in table.rows().iter().enumerate() {
        out.start("row", &[("id", &key_text(row))])?;
        for value in table.row_values(row_ix) {
            out.empty("data", &[("value", &value?.to_string())])?;
        }
        out.end("row")?;
    }
    out.end("rows")?;

    out.end("table")
}

pub fn render(result: &ToolResult) -> Result<Vec<u8>> {
    let mut out = XmlOut {
        writer: Writer::new(Vec::new()),
    };
    out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    out.start("tables", &[])?;
    for table in result {
        render_table(&mut out, table)?;
    }
    out.end("tables")?;
    Ok(out.writer.into_inner())
}
