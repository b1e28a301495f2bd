//! Demo tool: a temperature sweep and a per-compound table

use std::collections::HashSet;

use sysprop_core::prelude::*;

/// A compound given as a SMILES string
#[derive(Debug, Clone)]
pub struct Smiles(pub String);

impl CanonicalKey for Smiles {
    fn canonical(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug)]
pub struct DemoTool {
    params: Vec<ParamSpec>,
}

impl DemoTool {
    pub fn new() -> Self {
        Self {
            params: vec![
                ParamSpec::float_range("temperatures", "Temperature")
                    .range(0.0, 100.0)
                    .range_message("Temperatures must be between 0 and 100 celsius")
                    .length(1, 100)
                    .length_message("Temperatures must have between 1 and 100 values"),
                ParamSpec::integer("scale1", "Scaling factor 1"),
                ParamSpec::integer("scale2", "Scaling factor 2"),
                ParamSpec::text_list("compounds", "Compounds"),
            ],
        }
    }
}

impl Default for DemoTool {
    fn default() -> Self {
        Self::new()
    }
}

fn require_distinct<T: std::hash::Hash + Eq>(
    field: &str,
    values: impl IntoIterator<Item = T>,
) -> Result<()> {
    let mut seen = HashSet::new();
    if values.into_iter().all(|v| seen.insert(v)) {
        Ok(())
    } else {
        Err(CoreError::validation(vec![FieldError::new(
            field,
            "Values must not repeat",
        )]))
    }
}

impl Tool for DemoTool {
    fn name(&self) -> &str {
        "demo"
    }

    fn title(&self) -> &str {
        "Demo function"
    }

    fn doc(&self) -> &str {
        "Multiplies each temperature by two scaling factors and reports the \
         length of each compound's SMILES string."
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn run(&self, args: &Args) -> Result<ToolResult> {
        let temperatures = args.floats("temperatures")?;
        let scales = [args.integer("scale1")?, args.integer("scale2")?];
        let compounds = args.texts("compounds")?;

        require_distinct("temperatures", temperatures.iter().map(|t| t.to_bits()))?;
        require_distinct("scale2", scales)?;
        require_distinct("compounds", compounds.iter())?;

        let temps = Table::builder("temps")
            .title("Demo 1")
            .rows("Temperatures", temperatures)
            .cols("Scaling factors", scales)
            .values(|row, col| {
                let t = row.get(0).and_then(|k| k.to_scalar().as_f64()).unwrap_or_default();
                let s = col.get(0).and_then(|k| k.to_scalar().as_f64()).unwrap_or_default();
                t * s
            })?;

        let lengths = Table::builder("compounds")
            .title("Demo 2")
            .rows(
                "Compounds",
                compounds
                    .iter()
                    .map(|smiles| AxisKey::from(Key::object(Smiles(smiles.clone())))),
            )
            .cols("Result", ["Length"])
            .values(|row, _| {
                row.get(0)
                    .map(|k| k.to_scalar().to_string().chars().count() as i64)
                    .unwrap_or_default()
            })?;

        ToolResult::new([temps, lengths])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(args: serde_json::Value) -> Result<ToolResult> {
        let tool = DemoTool::new();
        let args = tool.parse_json(&args)?;
        tool.run(&args)
    }

    #[test]
    fn produces_both_tables() {
        let result = run(json!({
            "temperatures": {"start": 10, "stop": 30, "count": 3},
            "scale1": 2,
            "scale2": 3,
            "compounds": ["CCO", "C(=O)(C(=O)O)O"],
        }))
        .unwrap();

        let temps = result.get("temps").unwrap();
        assert_eq!(temps.rows().len(), 3);
        assert_eq!(
            temps.value_at(&30.0.into(), &3.into()).unwrap(),
            Scalar::Float(90.0)
        );

        let compounds = result.get("compounds").unwrap();
        let key = AxisKey::from(Key::object(Smiles("CCO".into())));
        assert_eq!(
            compounds.value_at(&key, &"Length".into()).unwrap(),
            Scalar::Int(3)
        );
    }

    #[test]
    fn temperatures_out_of_range_use_the_tool_message() {
        let err = run(json!({
            "temperatures": [120],
            "scale1": 1,
            "scale2": 2,
            "compounds": "O",
        }))
        .unwrap_err();
        match err {
            CoreError::Validation { fields, .. } => assert_eq!(
                fields,
                vec![FieldError::new(
                    "temperatures",
                    "Temperatures must be between 0 and 100 celsius"
                )]
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn equal_scales_are_a_validation_error() {
        let err = run(json!({
            "temperatures": 20,
            "scale1": 2,
            "scale2": 2,
            "compounds": "O",
        }))
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }
}
