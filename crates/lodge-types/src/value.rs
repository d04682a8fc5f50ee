use std::fmt;

use serde::{Deserialize, Serialize};

/// A single record field.
///
/// Serialized untagged so the JSON medium stays a flat mapping of plain
/// scalars. `List` holds id strings only (the Place↔Amenity link list);
/// nested structures are deliberately unrepresentable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(x) => Some(*x),
            FieldValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(ids) => Some(ids),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::List(ids) => write!(f, "[{}]", ids.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_stays_flat() {
        let values = vec![
            FieldValue::Int(4),
            FieldValue::Float(37.77),
            FieldValue::Text("San Francisco".into()),
            FieldValue::List(vec!["a1".into(), "a2".into()]),
        ];
        for v in values {
            let json = serde_json::to_string(&v).unwrap();
            let back: FieldValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v);
        }
    }

    #[test]
    fn integral_json_number_deserializes_as_int() {
        let v: FieldValue = serde_json::from_str("4").unwrap();
        assert_eq!(v, FieldValue::Int(4));
    }

    #[test]
    fn fractional_json_number_deserializes_as_float() {
        let v: FieldValue = serde_json::from_str("4.5").unwrap();
        assert_eq!(v, FieldValue::Float(4.5));
    }

    #[test]
    fn as_float_widens_ints() {
        assert_eq!(FieldValue::Int(3).as_float(), Some(3.0));
        assert_eq!(FieldValue::Text("3".into()).as_float(), None);
    }
}
