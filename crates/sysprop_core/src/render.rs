//! Encoders for each output format
//!
//! Every encoder walks tables in declaration order and, within a table, rows
//! then columns in declaration order. Keys are turned into output values by
//! [`format_key`] only.

pub mod csv_zip;
pub mod html;
pub mod json;
pub mod xlsx;
pub mod xml;

use crate::key::{AxisKey, Scalar};

/// The primitive values written for an axis key, one per dimension
pub fn format_key(key: &AxisKey) -> Vec<Scalar> {
    key.parts().iter().map(|part| part.to_scalar()).collect()
}

/// Single text form of a key, dimensions joined with `", "`
pub fn key_text(key: &AxisKey) -> String {
    format_key(key)
        .iter()
        .map(Scalar::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A key as JSON: a scalar for one dimension, an array otherwise
pub(crate) fn key_json(key: &AxisKey) -> serde_json::Value {
    let mut parts = format_key(key);
    if parts.len() == 1 {
        serde_json::Value::from(&parts.remove(0))
    } else {
        serde_json::Value::Array(parts.iter().map(serde_json::Value::from).collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::key::{CanonicalKey, Key, Scalar};
    use crate::result::ToolResult;
    use crate::table::Table;

    #[derive(Debug)]
    pub struct Smiles(pub &'static str);

    impl CanonicalKey for Smiles {
        fn canonical(&self) -> String {
            format!("{}\t\n", self.0)
        }
    }

    /// Two tables: a plain temperature sweep and one with two-level keys on
    /// both axes and object row keys.
    pub fn result() -> ToolResult {
        let temps = Table::builder("temps")
            .title("Demo 1")
            .rows("Temperatures", [30.0, 10.0, 20.0])
            .cols("Scaling factors", [2, 3])
            .values(|r, c| {
                let t = r.get(0).and_then(|k| k.to_scalar().as_f64()).unwrap_or(0.0);
                let s = c.get(0).and_then(|k| k.to_scalar().as_f64()).unwrap_or(0.0);
                t * s
            })
            .unwrap();

        let grid = Table::builder("grid")
            .title("Grouped values")
            .rows(
                ["Compound", "Phase"],
                vec![
                    vec![Key::object(Smiles("CCO")), Key::from("gas")],
                    vec![Key::object(Smiles("CCO")), Key::from("liquid")],
                    vec![Key::object(Smiles("O")), Key::from("gas")],
                ],
            )
            .cols(["Group", "Index"], [("A", 1), ("A", 2), ("B", 1)])
            .values(|r, c| Scalar::Text(format!("{r}|{c}")))
            .unwrap();

        ToolResult::new([temps, grid]).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use serde_json::json;

    #[test]
    fn keys_format_per_dimension() {
        let key = AxisKey::new(vec![Key::object(fixtures::Smiles("CCO")), Key::from(2)]);
        assert_eq!(
            format_key(&key),
            vec![Scalar::Text("CCO".into()), Scalar::Int(2)]
        );
        assert_eq!(key_text(&key), "CCO, 2");
        assert_eq!(key_json(&key), json!(["CCO", 2]));
        assert_eq!(key_json(&AxisKey::from(1.5)), json!(1.5));
    }
}
