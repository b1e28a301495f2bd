//! Output format registry
//!
//! Maps MIME types to a display label, static response headers and one of
//! the built-in encoders. A registry is built once at startup and shared
//! read-only afterwards.

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::render;
use crate::result::ToolResult;

pub const JSON: &str = "application/json";
pub const XML: &str = "application/xml";
pub const ZIP: &str = "application/zip";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const HTML: &str = "text/html";

/// The built-in encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    CsvZip,
    Xlsx,
    Html,
}

impl Format {
    pub fn encode(self, result: &ToolResult) -> Result<Vec<u8>> {
        match self {
            Format::Json => render::json::render(result),
            Format::Xml => render::xml::render(result),
            Format::CsvZip => render::csv_zip::render(result),
            Format::Xlsx => render::xlsx::render(result),
            Format::Html => render::html::render(result),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormatEntry {
    pub mimetype: String,
    pub label: String,
    pub headers: Vec<(String, String)>,
    pub format: Format,
}

/// Encoded output plus the headers to send with it
#[derive(Debug, Clone)]
pub struct Rendered {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Rendered {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format. Downloadable formats are sent as
    /// attachments named `<download_stem>.<ext>`.
    pub fn standard(download_stem: &str) -> Result<Self> {
        let attachment = |ext: &str| {
            vec![(
                "Content-Disposition".to_string(),
                format!("attachment; filename={download_stem}.{ext}"),
            )]
        };

        let mut registry = Self::new();
        registry
            .register(JSON, "JSON file", Vec::new(), Format::Json)?
            .register(XML, "XML file", attachment("xml"), Format::Xml)?
            .register(ZIP, "Zipped CSV files", attachment("zip"), Format::CsvZip)?
            .register(XLSX, "Excel file", attachment("xlsx"), Format::Xlsx)?
            .register(HTML, "HTML (view in web browser)", Vec::new(), Format::Html)?;
        Ok(registry)
    }

    pub fn register(
        &mut self,
        mimetype: impl Into<String>,
        label: impl Into<String>,
        headers: Vec<(String, String)>,
        format: Format,
    ) -> Result<&mut Self> {
        let mimetype = mimetype.into();
        if self.get(&mimetype).is_some() {
            return Err(CoreError::DuplicateFormat { mimetype });
        }
        self.entries.push(FormatEntry {
            mimetype,
            label: label.into(),
            headers,
            format,
        });
        Ok(self)
    }

    /// `(mimetype, label)` pairs in registration order
    pub fn list_formats(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.mimetype.as_str(), e.label.as_str()))
            .collect()
    }

    pub fn get(&self, mimetype: &str) -> Option<&FormatEntry> {
        self.entries
            .iter()
            .find(|e| e.mimetype.eq_ignore_ascii_case(mimetype))
    }

    /// Encode `result` as `mimetype`. Nothing is returned unless the whole
    /// result encoded successfully.
    pub fn render(&self, mimetype: &str, result: &ToolResult) -> Result<Rendered> {
        let entry = self.get(mimetype).ok_or_else(|| CoreError::UnknownFormat {
            mimetype: mimetype.to_string(),
            available: self.entries.iter().map(|e| e.mimetype.clone()).collect(),
        })?;

        debug!(mimetype, tables = result.len(), "rendering result");
        let body = entry.format.encode(result)?;

        let mut headers = vec![("Content-Type".to_string(), entry.mimetype.clone())];
        headers.extend(entry.headers.iter().cloned());
        Ok(Rendered { headers, body })
    }

    /// Pick the registered format that best satisfies an `Accept` header.
    /// Ties go to the earlier registration.
    pub fn negotiate(&self, accept: &str) -> Option<&FormatEntry> {
        let offers: Vec<&str> = self.entries.iter().map(|e| e.mimetype.as_str()).collect();
        best_match(accept, &offers).and_then(|m| self.get(m))
    }
}

/// Choose among `offers` by the quality values of an `Accept` header. An
/// empty header accepts anything.
pub fn best_match<'a>(accept: &str, offers: &[&'a str]) -> Option<&'a str> {
    let ranges = parse_accept(accept);
    let mut best: Option<(&'a str, f32)> = None;
    for offer in offers {
        let q = quality(&ranges, offer);
        if q > 0.0 && best.is_none_or(|(_, b)| q > b) {
            best = Some((offer, q));
        }
    }
    best.map(|(offer, _)| offer)
}

fn parse_accept(accept: &str) -> Vec<(String, f32)> {
    if accept.trim().is_empty() {
        return vec![("*/*".to_string(), 1.0)];
    }
    accept
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let range = pieces.next()?.trim().to_ascii_lowercase();
            if range.is_empty() {
                return None;
            }
            let q = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .next()
                .map(|v| v.trim().parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0);
            Some((range, q))
        })
        .collect()
}

/// Quality of the most specific range matching `mimetype`
fn quality(ranges: &[(String, f32)], mimetype: &str) -> f32 {
    let mimetype = mimetype.to_ascii_lowercase();
    let major = mimetype.split('/').next().unwrap_or_default();
    let mut best: Option<(u8, f32)> = None;
    for (range, q) in ranges {
        let specificity = if *range == mimetype {
            2
        } else if range.strip_suffix("/*") == Some(major) {
            1
        } else if range == "*/*" {
            0
        } else {
            continue;
        };
        if best.is_none_or(|(s, _)| specificity > s) {
            best = Some((specificity, *q));
        }
    }
    best.map(|(_, q)| q).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn sample() -> ToolResult {
        let table = Table::builder("t")
            .rows("r", [1, 2])
            .cols("c", ["x"])
            .values(|_, _| 1.5)
            .unwrap();
        ToolResult::new([table]).unwrap()
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = FormatRegistry::new();
        registry
            .register(JSON, "JSON", Vec::new(), Format::Json)
            .unwrap();
        let err = registry
            .register(JSON, "JSON again", Vec::new(), Format::Json)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateFormat { .. }));
    }

    #[test]
    fn unknown_format_fails() {
        let registry = FormatRegistry::standard("sysprop").unwrap();
        let err = registry.render("text/plain", &sample()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownFormat { mimetype, .. } if mimetype == "text/plain"));
    }

    #[test]
    fn formats_listed_in_registration_order() {
        let registry = FormatRegistry::standard("sysprop").unwrap();
        let mimetypes: Vec<&str> = registry.list_formats().into_iter().map(|(m, _)| m).collect();
        assert_eq!(mimetypes, vec![JSON, XML, ZIP, XLSX, HTML]);
    }

    #[test]
    fn render_merges_static_headers() {
        let registry = FormatRegistry::standard("report").unwrap();
        let rendered = registry.render(XML, &sample()).unwrap();
        assert_eq!(rendered.header("content-type"), Some(XML));
        assert_eq!(
            rendered.header("Content-Disposition"),
            Some("attachment; filename=report.xml")
        );
        assert!(!rendered.body.is_empty());
    }

    #[test]
    fn negotiation_honours_quality_and_specificity() {
        let registry = FormatRegistry::standard("sysprop").unwrap();
        let pick = |accept: &str| registry.negotiate(accept).map(|e| e.mimetype.as_str());

        assert_eq!(pick("text/html,application/xml;q=0.9"), Some(HTML));
        assert_eq!(pick("application/xml;q=0.5, application/json;q=0.8"), Some(JSON));
        assert_eq!(pick("text/*"), Some(HTML));
        assert_eq!(pick("*/*"), Some(JSON));
        assert_eq!(pick(""), Some(JSON));
        assert_eq!(pick("*/*, application/json;q=0"), Some(XML));
        assert_eq!(pick("image/png"), None);
    }

    #[test]
    fn best_match_between_offers() {
        let offers = ["text/html", "application/json"];
        assert_eq!(best_match("application/json", &offers), Some("application/json"));
        assert_eq!(best_match("text/html;q=0.1, */*;q=0.5", &offers), Some("application/json"));
        assert_eq!(best_match("text/plain", &offers), None);
    }
}
