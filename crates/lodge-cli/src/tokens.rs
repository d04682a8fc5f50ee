//! The `name=value` token grammar of the console.
//!
//! Quoted values are text, with underscores rendered as spaces. Unquoted
//! values containing a decimal point are floats, otherwise-numeric values
//! are integers, and anything else is skipped. After grammar typing,
//! values are coerced against the target kind's column schema so a digit
//! string destined for an integer column is stored as an integer.

use lodge_types::schema::ColumnType;
use lodge_types::{EntityKind, FieldValue};

/// Parse a list of `name=value` tokens. Tokens without a `=`, with an
/// empty name, or with an unparseable value are skipped.
pub fn parse_assignments(tokens: &[String]) -> Vec<(String, FieldValue)> {
    tokens
        .iter()
        .filter_map(|token| {
            let (name, raw) = token.split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), parse_value(raw)?))
        })
        .collect()
}

/// Type a single raw value per the token grammar.
pub fn parse_value(raw: &str) -> Option<FieldValue> {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        return Some(FieldValue::Text(inner.replace('_', " ")));
    }
    if raw.contains('.') {
        return raw.parse::<f64>().ok().map(FieldValue::Float);
    }
    raw.parse::<i64>().ok().map(FieldValue::Int)
}

/// Coerce a grammar-typed value toward the column it is destined for.
/// Fields outside the schema pass through untouched, as do values that
/// do not convert (the medium rejects those at save time).
pub fn coerce_for_column(kind: EntityKind, name: &str, value: FieldValue) -> FieldValue {
    let Some(col) = kind.column(name) else {
        return value;
    };
    match (col.ty, value) {
        (ColumnType::Integer, FieldValue::Text(s)) => s
            .parse::<i64>()
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Text(s)),
        (ColumnType::Integer, FieldValue::Float(x)) if x.fract() == 0.0 => {
            FieldValue::Int(x as i64)
        }
        (ColumnType::Float, FieldValue::Int(n)) => FieldValue::Float(n as f64),
        (ColumnType::Float, FieldValue::Text(s)) => s
            .parse::<f64>()
            .map(FieldValue::Float)
            .unwrap_or(FieldValue::Text(s)),
        (_, v) => v,
    }
}

/// Type an `update` value by the target column: integer columns parse as
/// integer (else 0), float columns parse as float when a decimal point is
/// present (else 0.0), everything else is text.
pub fn coerce_update(kind: EntityKind, name: &str, raw: &str) -> FieldValue {
    match kind.column(name).map(|c| c.ty) {
        Some(ColumnType::Integer) => FieldValue::Int(raw.parse().unwrap_or(0)),
        Some(ColumnType::Float) => {
            if raw.contains('.') {
                FieldValue::Float(raw.parse().unwrap_or(0.0))
            } else {
                FieldValue::Float(0.0)
            }
        }
        _ => FieldValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn quoted_values_are_text_with_spaces() {
        let parsed = parse_assignments(&strings(&[r#"name="My_little_house""#]));
        assert_eq!(parsed, vec![("name".into(), FieldValue::Text("My little house".into()))]);
    }

    #[test]
    fn numeric_values_type_by_decimal_point() {
        assert_eq!(parse_value("4"), Some(FieldValue::Int(4)));
        assert_eq!(parse_value("-3"), Some(FieldValue::Int(-3)));
        assert_eq!(parse_value("37.77"), Some(FieldValue::Float(37.77)));
        assert_eq!(parse_value("-122.43"), Some(FieldValue::Float(-122.43)));
    }

    #[test]
    fn unparseable_values_are_skipped() {
        assert_eq!(parse_value("garbage"), None);
        assert_eq!(parse_value("1.2.3"), None);
        let parsed = parse_assignments(&strings(&["name=oops", "rooms=4", "=5", "bare"]));
        assert_eq!(parsed, vec![("rooms".into(), FieldValue::Int(4))]);
    }

    #[test]
    fn quoted_empty_string_is_text() {
        assert_eq!(parse_value(r#""""#), Some(FieldValue::Text(String::new())));
    }

    #[test]
    fn digit_text_coerces_into_integer_columns() {
        let coerced = coerce_for_column(
            EntityKind::Place,
            "number_rooms",
            FieldValue::Text("4".into()),
        );
        assert_eq!(coerced, FieldValue::Int(4));
    }

    #[test]
    fn integers_coerce_into_float_columns() {
        let coerced = coerce_for_column(EntityKind::Place, "latitude", FieldValue::Int(37));
        assert_eq!(coerced, FieldValue::Float(37.0));
    }

    #[test]
    fn text_columns_pass_through() {
        let coerced = coerce_for_column(
            EntityKind::Place,
            "name",
            FieldValue::Text("Cabin".into()),
        );
        assert_eq!(coerced, FieldValue::Text("Cabin".into()));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let coerced = coerce_for_column(
            EntityKind::State,
            "population",
            FieldValue::Text("40".into()),
        );
        assert_eq!(coerced, FieldValue::Text("40".into()));
    }

    #[test]
    fn non_numeric_text_stays_for_the_medium_to_reject() {
        let coerced = coerce_for_column(
            EntityKind::Place,
            "number_rooms",
            FieldValue::Text("several".into()),
        );
        assert_eq!(coerced, FieldValue::Text("several".into()));
    }

    #[test]
    fn update_values_type_by_column() {
        assert_eq!(
            coerce_update(EntityKind::Place, "number_rooms", "4"),
            FieldValue::Int(4)
        );
        assert_eq!(
            coerce_update(EntityKind::Place, "number_rooms", "soon"),
            FieldValue::Int(0)
        );
        assert_eq!(
            coerce_update(EntityKind::Place, "latitude", "37.77"),
            FieldValue::Float(37.77)
        );
        assert_eq!(
            coerce_update(EntityKind::Place, "latitude", "37"),
            FieldValue::Float(0.0)
        );
        assert_eq!(
            coerce_update(EntityKind::State, "name", "Nevada"),
            FieldValue::Text("Nevada".into())
        );
    }
}
