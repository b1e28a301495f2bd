//! Parameter schema for tools and conversion of raw arguments
//!
//! Arguments arrive either as a JSON object (RPC calls) or as form fields
//! (the HTML form endpoint). Form fields are first folded into the JSON shape
//! so both paths share one set of conversion and validation rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, FieldError, Result};

/// Upper bound on the number of values a range or list may produce
pub const DEFAULT_MAX_COUNT: usize = 1000;

/// Joins a parameter name and a sub-field name in form encoding
pub const FORM_SEPARATOR: char = '-';

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Integer,
    Float,
    /// One value, an explicit list, or evenly spaced values between two
    /// inclusive end points
    FloatRange,
    Text,
    /// One or more non-blank strings
    TextList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_message: Option<String>,
    /// Characters for text, number of values for ranges and lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

/// One named input of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub label: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            constraints: Constraints::default(),
            default: None,
        }
    }

    pub fn integer(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParamKind::Integer)
    }

    pub fn float(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParamKind::Float)
    }

    pub fn float_range(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParamKind::FloatRange)
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParamKind::Text)
    }

    pub fn text_list(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, ParamKind::TextList)
    }

    /// Inclusive bounds for every numeric value
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.constraints.min = Some(min);
        self.constraints.max = Some(max);
        self
    }

    pub fn range_message(mut self, message: impl Into<String>) -> Self {
        self.constraints.range_message = Some(message.into());
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.constraints.min_len = Some(min);
        self.constraints.max_len = Some(max);
        self
    }

    pub fn length_message(mut self, message: impl Into<String>) -> Self {
        self.constraints.length_message = Some(message.into());
        self
    }

    pub fn max_count(mut self, max_count: usize) -> Self {
        self.constraints.max_count = Some(max_count);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn count_limit(&self) -> usize {
        self.constraints.max_count.unwrap_or(DEFAULT_MAX_COUNT)
    }

    fn convert(&self, raw: &Value) -> std::result::Result<ArgValue, String> {
        match self.kind {
            ParamKind::Integer => {
                let value = as_integer(raw).ok_or("Not a valid integer value")?;
                self.check_range(value as f64)?;
                Ok(ArgValue::Integer(value))
            }
            ParamKind::Float => {
                let value = as_float(raw).ok_or("Not a valid float value")?;
                self.check_range(value)?;
                Ok(ArgValue::Float(value))
            }
            ParamKind::FloatRange => {
                let values = self.parse_float_range(raw)?;
                self.check_length(values.len(), "values")?;
                for value in &values {
                    self.check_range(*value)?;
                }
                Ok(ArgValue::Floats(values))
            }
            ParamKind::Text => {
                let value = raw.as_str().ok_or("Not a valid string")?.trim().to_string();
                if value.is_empty() {
                    return Err(REQUIRED.into());
                }
                self.check_length(value.chars().count(), "characters")?;
                Ok(ArgValue::Text(value))
            }
            ParamKind::TextList => {
                let items = as_text_list(raw).ok_or("Must be a string or a list of strings")?;
                if items.is_empty() {
                    return Err(REQUIRED.into());
                }
                if items.len() > self.count_limit() {
                    return Err(format!("At most {} values are allowed", self.count_limit()));
                }
                self.check_length(items.len(), "values")?;
                Ok(ArgValue::Texts(items))
            }
        }
    }

    fn parse_float_range(&self, raw: &Value) -> std::result::Result<Vec<f64>, String> {
        let values = match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| as_float(item).ok_or("Not a valid float value"))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Value::Object(fields) => self.expand_range(fields)?,
            single => vec![as_float(single).ok_or("Not a valid float value")?],
        };
        if values.is_empty() {
            return Err(REQUIRED.into());
        }
        if values.len() > self.count_limit() {
            return Err(format!("At most {} values are allowed", self.count_limit()));
        }
        Ok(values)
    }

    /// `{start, stop, count}` to `count` evenly spaced values
    fn expand_range(&self, fields: &Map<String, Value>) -> std::result::Result<Vec<f64>, String> {
        let start = fields
            .get("start")
            .ok_or(REQUIRED)
            .and_then(|v| as_float(v).ok_or("Not a valid float value"))?;
        let stop = match fields.get("stop").filter(|v| !v.is_null()) {
            Some(v) => Some(as_float(v).ok_or("Not a valid float value")?),
            None => None,
        };
        let count = match fields.get("count").filter(|v| !v.is_null()) {
            Some(v) => as_integer(v).ok_or("Not a valid integer value")?,
            None => 1,
        };

        let limit = self.count_limit();
        if count < 1 || count as usize > limit {
            return Err(format!("Number must be between 1 and {limit}."));
        }
        if stop.is_some_and(|stop| start > stop) {
            return Err("Starting value must be less than ending value".into());
        }
        if count == 1 {
            return Ok(vec![start]);
        }

        let stop = stop.ok_or("An ending value is required for a range")?;
        if start == stop {
            return Err("Starting value must be less than ending value".into());
        }
        let last = count as usize - 1;
        let step = (stop - start) / last as f64;
        Ok((0..=last)
            .map(|n| if n == last { stop } else { start + n as f64 * step })
            .collect())
    }

    fn check_range(&self, value: f64) -> std::result::Result<(), String> {
        let message = match (self.constraints.min, self.constraints.max) {
            (Some(min), Some(max)) if value < min || value > max => {
                format!("Number must be between {min} and {max}.")
            }
            (Some(min), None) if value < min => format!("Number must be at least {min}."),
            (None, Some(max)) if value > max => format!("Number must be at most {max}."),
            _ => return Ok(()),
        };
        Err(self.constraints.range_message.clone().unwrap_or(message))
    }

    fn check_length(&self, len: usize, unit: &str) -> std::result::Result<(), String> {
        let message = match (self.constraints.min_len, self.constraints.max_len) {
            (Some(min), Some(max)) if len < min || len > max => {
                format!("Must have between {min} and {max} {unit}.")
            }
            (Some(min), None) if len < min => format!("Must have at least {min} {unit}."),
            (None, Some(max)) if len > max => format!("Must have at most {max} {unit}."),
            _ => return Ok(()),
        };
        Err(self.constraints.length_message.clone().unwrap_or(message))
    }
}

fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_text_list(raw: &Value) -> Option<Vec<String>> {
    let items: Vec<&str> = match raw {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().map(Value::as_str).collect::<Option<_>>()?,
        _ => return None,
    };
    Some(
        items
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// A converted argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Integer(i64),
    Float(f64),
    Floats(Vec<f64>),
    Text(String),
    Texts(Vec<String>),
}

/// Validated arguments for one tool invocation, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Args(BTreeMap<String, ArgValue>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(ArgValue::Integer(v)) => Ok(*v),
            other => Err(mismatch(name, "an integer", other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(ArgValue::Float(v)) => Ok(*v),
            Some(ArgValue::Integer(v)) => Ok(*v as f64),
            other => Err(mismatch(name, "a number", other)),
        }
    }

    pub fn floats(&self, name: &str) -> Result<Vec<f64>> {
        match self.get(name) {
            Some(ArgValue::Floats(v)) => Ok(v.clone()),
            Some(ArgValue::Float(v)) => Ok(vec![*v]),
            other => Err(mismatch(name, "a list of numbers", other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(ArgValue::Text(v)) => Ok(v),
            other => Err(mismatch(name, "a string", other)),
        }
    }

    pub fn texts(&self, name: &str) -> Result<&[String]> {
        match self.get(name) {
            Some(ArgValue::Texts(v)) => Ok(v),
            other => Err(mismatch(name, "a list of strings", other)),
        }
    }
}

fn mismatch(name: &str, expected: &str, found: Option<&ArgValue>) -> CoreError {
    let message = match found {
        None => REQUIRED.to_string(),
        Some(_) => format!("Expected {expected}"),
    };
    CoreError::validation(vec![FieldError::new(name, message)])
}

fn convert_all(specs: &[ParamSpec], raw: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Args {
    let mut args = Args::new();
    for spec in specs {
        let value = raw
            .get(&spec.name)
            .filter(|v| !v.is_null())
            .or(spec.default.as_ref());
        let Some(value) = value else {
            errors.push(FieldError::new(&spec.name, REQUIRED));
            continue;
        };
        match spec.convert(value) {
            Ok(converted) => args.insert(spec.name.clone(), converted),
            Err(message) => errors.push(FieldError::new(&spec.name, message)),
        }
    }
    args
}

fn finish(args: Args, errors: Vec<FieldError>) -> Result<Args> {
    if errors.is_empty() {
        Ok(args)
    } else {
        Err(CoreError::validation(errors))
    }
}

/// Convert a JSON object of named arguments. Names not in `specs` are
/// rejected.
pub fn parse_json(specs: &[ParamSpec], value: &Value) -> Result<Args> {
    let Value::Object(raw) = value else {
        return Err(CoreError::validation(vec![FieldError::new(
            "arguments",
            "Arguments must be a JSON object",
        )]));
    };

    let mut errors: Vec<FieldError> = raw
        .keys()
        .filter(|key| !specs.iter().any(|spec| &spec.name == *key))
        .map(|key| FieldError::new(key.as_str(), "Unexpected parameter"))
        .collect();
    let args = convert_all(specs, raw, &mut errors);
    finish(args, errors)
}

/// Convert submitted form fields. Blank fields count as missing and fields
/// that belong to no parameter are ignored.
pub fn parse_form(specs: &[ParamSpec], fields: &[(String, String)]) -> Result<Args> {
    let lookup = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    };

    let mut raw = Map::new();
    for spec in specs {
        let name = spec.name.as_str();
        let sub = |suffix: &str| lookup(&format!("{name}{FORM_SEPARATOR}{suffix}"));

        let value = match spec.kind {
            ParamKind::FloatRange => match sub("start") {
                Some(start) => {
                    let mut range = Map::new();
                    range.insert("start".into(), Value::from(start));
                    if let Some(stop) = sub("stop") {
                        range.insert("stop".into(), Value::from(stop));
                    }
                    if let Some(count) = sub("count") {
                        range.insert("count".into(), Value::from(count));
                    }
                    Some(Value::Object(range))
                }
                None => lookup(name).map(Value::from),
            },
            ParamKind::TextList => sub("multi")
                .map(|text| Value::Array(text.lines().map(Value::from).collect()))
                .or_else(|| sub("single").map(Value::from))
                .or_else(|| lookup(name).map(Value::from)),
            _ => lookup(name).map(Value::from),
        };
        if let Some(value) = value {
            raw.insert(spec.name.clone(), value);
        }
    }

    let mut errors = Vec::new();
    let args = convert_all(specs, &raw, &mut errors);
    finish(args, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn temperatures() -> ParamSpec {
        ParamSpec::float_range("temperatures", "Temperature")
            .range(0.0, 100.0)
            .length(1, 100)
            .length_message("Temperatures must have between 1 and 100 values")
    }

    fn field_errors(err: CoreError) -> Vec<FieldError> {
        match err {
            CoreError::Validation { fields, .. } => fields,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn ranges_expand_inclusively() {
        let specs = [temperatures()];
        let args = parse_json(
            &specs,
            &json!({"temperatures": {"start": 10.0, "stop": 20.0, "count": 3}}),
        )
        .unwrap();
        assert_eq!(args.floats("temperatures").unwrap(), vec![10.0, 15.0, 20.0]);

        let single = parse_json(&specs, &json!({"temperatures": {"start": 5, "count": 1}})).unwrap();
        assert_eq!(single.floats("temperatures").unwrap(), vec![5.0]);

        let listed = parse_json(&specs, &json!({"temperatures": [30, 10.5]})).unwrap();
        assert_eq!(listed.floats("temperatures").unwrap(), vec![30.0, 10.5]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = parse_json(
            &[temperatures()],
            &json!({"temperatures": {"start": 50, "stop": 20, "count": 4}}),
        )
        .unwrap_err();
        assert_eq!(
            field_errors(err),
            vec![FieldError::new(
                "temperatures",
                "Starting value must be less than ending value"
            )]
        );
    }

    #[test]
    fn range_bounds_and_counts_are_enforced() {
        let specs = [temperatures()];
        let out_of_range = parse_json(&specs, &json!({"temperatures": [50, 150]})).unwrap_err();
        assert_eq!(
            field_errors(out_of_range)[0].message,
            "Number must be between 0 and 100."
        );

        let too_many = parse_json(
            &specs,
            &json!({"temperatures": {"start": 0, "stop": 100, "count": 101}}),
        )
        .unwrap_err();
        assert_eq!(
            field_errors(too_many)[0].message,
            "Temperatures must have between 1 and 100 values"
        );

        let capped = [ParamSpec::float_range("t", "T").max_count(5)];
        let err = parse_json(&capped, &json!({"t": {"start": 0, "stop": 1, "count": 6}})).unwrap_err();
        assert_eq!(field_errors(err)[0].message, "Number must be between 1 and 5.");
    }

    #[test]
    fn all_field_errors_are_collected() {
        let specs = [
            ParamSpec::integer("scale1", "Scaling factor 1"),
            ParamSpec::integer("scale2", "Scaling factor 2"),
        ];
        let err = parse_json(&specs, &json!({"scale1": "x", "extra": 1})).unwrap_err();
        assert_eq!(
            field_errors(err),
            vec![
                FieldError::new("extra", "Unexpected parameter"),
                FieldError::new("scale1", "Not a valid integer value"),
                FieldError::new("scale2", "This field is required."),
            ]
        );
    }

    #[test]
    fn defaults_fill_missing_arguments() {
        let specs = [ParamSpec::integer("n", "N").default_value(7)];
        let args = parse_json(&specs, &json!({})).unwrap();
        assert_eq!(args.integer("n").unwrap(), 7);
        assert_eq!(args.float("n").unwrap(), 7.0);
        assert!(args.text("n").is_err());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = parse_json(&[], &json!([1, 2])).unwrap_err();
        assert_eq!(field_errors(err)[0].field, "arguments");
    }

    #[test]
    fn form_fields_use_the_same_rules() {
        let specs = [
            temperatures(),
            ParamSpec::integer("scale1", "Scaling factor 1"),
            ParamSpec::text_list("compounds", "Compounds"),
        ];
        let fields: Vec<(String, String)> = [
            ("temperatures-start", "0"),
            ("temperatures-stop", "30"),
            ("temperatures-count", "4"),
            ("scale1", " 2 "),
            ("compounds-multi", "CCO\n\n  O  \n"),
            ("output_format", "text/html"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let args = parse_form(&specs, &fields).unwrap();
        assert_eq!(
            args.floats("temperatures").unwrap(),
            vec![0.0, 10.0, 20.0, 30.0]
        );
        assert_eq!(args.integer("scale1").unwrap(), 2);
        assert_eq!(args.texts("compounds").unwrap(), ["CCO", "O"]);
    }

    #[test]
    fn blank_form_fields_are_missing() {
        let specs = [
            ParamSpec::integer("scale1", "Scaling factor 1"),
            ParamSpec::text_list("compounds", "Compounds"),
        ];
        let fields = vec![
            ("scale1".to_string(), "   ".to_string()),
            ("compounds-single".to_string(), "CCO".to_string()),
        ];
        let err = parse_form(&specs, &fields).unwrap_err();
        assert_eq!(
            field_errors(err),
            vec![FieldError::new("scale1", "This field is required.")]
        );
    }

    #[test]
    fn schema_serializes_kinds_in_snake_case() {
        let spec = ParamSpec::float_range("t", "Temperature").range(0.0, 1.0);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["kind"], "float_range");
        assert_eq!(value["constraints"], json!({"min": 0.0, "max": 1.0}));
        assert!(value.get("default").is_none());
    }
}
