//! Core data types for series written to the store
//!
//! This module defines the values that travel over the write path:
//! - `Value`: A single typed field (integer, float or text)
//! - `Point`: One row of values
//! - `Series`: A named set of points sharing one column layout

use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns used when an insert does not name any
pub const DEFAULT_COLUMNS: [&str; 3] = ["time", "sequence_number", "value"];

/// A single typed value inside a point
///
/// The store is dynamically typed, so the variant is decided once at
/// ingestion by [`Value::parse`] and never validated against a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Best-effort typing of a raw field.
    ///
    /// Tries a 64-bit integer first, then a finite float, and falls back to
    /// text. `nan` and `inf` stay text since JSON has no encoding for them.
    ///
    /// Surrounding whitespace is ignored for the numeric attempts, so
    /// `values (1, 2.5)` types both fields as numbers even with the space
    /// after the comma. Text keeps the field exactly as it was written.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::Text(raw.to_string()),
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// One row of values, ordered like the owning series' columns
pub type Point = Vec<Value>;

/// A named, column-typed collection of points
///
/// Serialises to the store's wire shape:
/// `{"name": "cpu", "columns": ["time", "value"], "points": [[1, 0.5]]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub columns: Vec<String>,
    pub points: Vec<Point>,
}

impl Series {
    /// Create an empty series with the given columns
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            points: Vec::new(),
        }
    }

    /// Create a series using the default `(time, sequence_number, value)` layout
    pub fn with_default_columns(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_COLUMNS)
    }

    /// Builder method: append a point
    pub fn point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }

    /// Number of points carried by this series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefers_integer() {
        assert_eq!(Value::parse("10"), Value::Integer(10));
        assert_eq!(Value::parse(" 1406231160000 "), Value::Integer(1406231160000));
        assert_eq!(Value::parse("-3"), Value::Integer(-3));
    }

    #[test]
    fn test_parse_falls_back_to_float() {
        assert_eq!(Value::parse("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse(" 2.25"), Value::Float(2.25));
        assert_eq!(Value::parse("1e3"), Value::Float(1000.0));
    }

    #[test]
    fn test_parse_falls_back_to_text() {
        assert_eq!(Value::parse("foo"), Value::Text("foo".to_string()));
        assert_eq!(Value::parse(" bar"), Value::Text(" bar".to_string()));
        assert_eq!(
            Value::parse("avg(something,123)"),
            Value::Text("avg(something,123)".to_string())
        );
    }

    #[test]
    fn test_non_finite_floats_stay_text() {
        for raw in ["nan", "NaN", "inf", "-inf", "infinity", " Infinity"] {
            assert_eq!(Value::parse(raw), Value::Text(raw.to_string()), "{raw}");
        }

        let series = Series::new("x", ["v"]).point(vec![Value::parse("nan")]);
        let json = serde_json::to_string(&series).unwrap();
        assert!(json.contains(r#""points":[["nan"]]"#));
    }

    #[test]
    fn test_float_overflow_stays_text() {
        assert_eq!(Value::parse("1e400"), Value::Text("1e400".to_string()));
    }

    #[test]
    fn test_integer_overflow_becomes_float() {
        assert_eq!(
            Value::parse("99999999999999999999"),
            Value::Float(99999999999999999999.0)
        );
    }

    #[test]
    fn test_series_wire_format() {
        let series = Series::with_default_columns("demo").point(vec![
            Value::Integer(1406231160000),
            Value::Integer(0),
            Value::Float(10.5),
        ]);

        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "demo",
                "columns": ["time", "sequence_number", "value"],
                "points": [[1406231160000i64, 0, 10.5]],
            })
        );
    }

    #[test]
    fn test_text_values_serialize_as_strings() {
        let series = Series::new("events", ["title"]).point(vec![Value::from("deploy")]);
        let json = serde_json::to_string(&series).unwrap();
        assert!(json.contains(r#""points":[["deploy"]]"#));
        assert_eq!(series.len(), 1);
        assert!(!series.is_empty());
    }
}
