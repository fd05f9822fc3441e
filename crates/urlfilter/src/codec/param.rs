//! Scalar value serialization for URL parameters.
//!
//! [`ParamCodec`] turns a [`ParamValue`] into a URL-safe string token for a
//! declared [`ValueType`] and back. It holds no state.
//!
//! | Type | Form | Example |
//! |------|------|---------|
//! | `Text` | verbatim | `John` |
//! | `Integer` | decimal | `-42` |
//! | `Decimal` | shortest round-trip float | `12.5` |
//! | `Boolean` | `true` / `false` | `true` |
//! | `Uuid` | hyphenated lowercase | `67e55044-10b1-426f-9247-bb680e5fe0c8` |
//! | `Date` | `YYYY-MM-DD` | `2024-03-01` |
//! | `DateTime` | `YYYY-MM-DDTHH:MM:SS[.fff]` | `2024-03-01T09:30:00` |
//! | `Enum` | enum id | `gold` |
//! | `List` | items joined by `,` (escaped) | `1,2,3` |
//! | `Interval` | `<last|next> <n> <unit>` | `last 5 day` |

use super::escape::{join_escaped, split_escaped, LIST_SEPARATOR};
use super::value::{DateInterval, ParamValue, ValueType};
use crate::error::{FilterError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATETIME_FALLBACK_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParamCodec;

impl ParamCodec {
    /// Serialize `value` in the string form of `declared`.
    pub fn serialize(value: &ParamValue, declared: &ValueType) -> Result<String> {
        if !value.conforms_to(declared) {
            return Err(encoding_error(value, declared));
        }

        let text = match (value, declared) {
            (ParamValue::Text(s), _) | (ParamValue::Enum(s), _) => s.clone(),
            (ParamValue::Integer(i), _) => i.to_string(),
            (ParamValue::Decimal(d), _) => {
                if !d.is_finite() {
                    return Err(encoding_error(value, declared));
                }
                d.to_string()
            }
            (ParamValue::Boolean(b), _) => b.to_string(),
            (ParamValue::Uuid(u), _) => u.hyphenated().to_string(),
            (ParamValue::Date(d), _) => d.format(DATE_FORMAT).to_string(),
            (ParamValue::DateTime(dt), _) => dt.format(DATETIME_FORMAT).to_string(),
            (ParamValue::Interval(interval), _) => interval.to_string(),
            (ParamValue::List(items), ValueType::List(inner)) => {
                let parts = items
                    .iter()
                    .map(|item| Self::serialize(item, inner))
                    .collect::<Result<Vec<_>>>()?;
                join_escaped(parts, LIST_SEPARATOR)
            }
            (ParamValue::List(_), _) => return Err(encoding_error(value, declared)),
        };
        Ok(text)
    }

    /// Parse `raw` as a value of `declared`.
    ///
    /// Callers decoding URL input must treat an error as "value absent".
    pub fn deserialize(raw: &str, declared: &ValueType) -> Result<ParamValue> {
        match declared {
            ValueType::Text => Ok(ParamValue::Text(raw.to_string())),
            ValueType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(ParamValue::Integer)
                .map_err(|e| FilterError::decoding(raw, declared, e)),
            ValueType::Decimal => {
                let d = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| FilterError::decoding(raw, declared, e))?;
                if d.is_finite() {
                    Ok(ParamValue::Decimal(d))
                } else {
                    Err(FilterError::decoding(raw, declared, "not a finite number"))
                }
            }
            ValueType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(ParamValue::Boolean(true)),
                "false" => Ok(ParamValue::Boolean(false)),
                _ => Err(FilterError::decoding(raw, declared, "expected true or false")),
            },
            ValueType::Uuid => Uuid::parse_str(raw.trim())
                .map(ParamValue::Uuid)
                .map_err(|e| FilterError::decoding(raw, declared, e)),
            ValueType::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map(ParamValue::Date)
                .map_err(|e| FilterError::decoding(raw, declared, e)),
            ValueType::DateTime => NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FALLBACK_FORMAT))
                .map(ParamValue::DateTime)
                .map_err(|e| FilterError::decoding(raw, declared, e)),
            ValueType::Enum(ids) => {
                if ids.iter().any(|id| id == raw) {
                    Ok(ParamValue::Enum(raw.to_string()))
                } else {
                    Err(FilterError::decoding(raw, declared, "not a known enum id"))
                }
            }
            ValueType::List(inner) => split_escaped(raw, LIST_SEPARATOR)
                .iter()
                .map(|part| Self::deserialize(part, inner))
                .collect::<Result<Vec<_>>>()
                .map(ParamValue::List),
            ValueType::Interval => raw
                .parse::<DateInterval>()
                .map(ParamValue::Interval)
                .map_err(|e| FilterError::decoding(raw, declared, e)),
        }
    }

    /// Serialize a configuration identifier. Blank or whitespace-padded ids
    /// cannot be read back unchanged and are refused.
    pub fn serialize_identifier(id: &str) -> Result<String> {
        if id.trim().is_empty() || id.trim() != id {
            return Err(FilterError::Encoding {
                expected: "identifier".to_string(),
                value: id.to_string(),
            });
        }
        Ok(id.to_string())
    }

    /// Parse a configuration identifier. Blank input is malformed.
    pub fn deserialize_identifier(raw: &str) -> Result<String> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(FilterError::decoding(raw, "identifier", "blank identifier"));
        }
        Ok(id.to_string())
    }
}

fn encoding_error(value: &ParamValue, declared: &ValueType) -> FilterError {
    FilterError::Encoding {
        expected: declared.to_string(),
        value: format!("{:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_type() -> ValueType {
        ValueType::Enum(vec!["gold".into(), "silver".into()])
    }

    #[test]
    fn serializes_scalars() {
        assert_eq!(
            ParamCodec::serialize(&ParamValue::Integer(-42), &ValueType::Integer).unwrap(),
            "-42"
        );
        assert_eq!(
            ParamCodec::serialize(&ParamValue::Decimal(12.5), &ValueType::Decimal).unwrap(),
            "12.5"
        );
        assert_eq!(
            ParamCodec::serialize(&ParamValue::Boolean(true), &ValueType::Boolean).unwrap(),
            "true"
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            ParamCodec::serialize(&ParamValue::Date(date), &ValueType::Date).unwrap(),
            "2024-03-01"
        );
    }

    #[test]
    fn datetime_round_trips() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let value = ParamValue::DateTime(dt);
        let text = ParamCodec::serialize(&value, &ValueType::DateTime).unwrap();
        assert_eq!(text, "2024-03-01T09:30:00");
        assert_eq!(
            ParamCodec::deserialize(&text, &ValueType::DateTime).unwrap(),
            value
        );
    }

    #[test]
    fn datetime_accepts_space_separator() {
        let parsed = ParamCodec::deserialize("2024-03-01 09:30:00", &ValueType::DateTime).unwrap();
        assert!(matches!(parsed, ParamValue::DateTime(_)));
    }

    #[test]
    fn mismatched_value_fails_to_encode() {
        let err = ParamCodec::serialize(&ParamValue::Text("x".into()), &ValueType::Integer);
        assert!(matches!(err, Err(FilterError::Encoding { .. })));
    }

    #[test]
    fn unknown_enum_id_fails_to_encode() {
        let err = ParamCodec::serialize(&ParamValue::Enum("bronze".into()), &enum_type());
        assert!(matches!(err, Err(FilterError::Encoding { .. })));
    }

    #[test]
    fn non_finite_decimal_fails_to_encode() {
        let err = ParamCodec::serialize(&ParamValue::Decimal(f64::NAN), &ValueType::Decimal);
        assert!(matches!(err, Err(FilterError::Encoding { .. })));
    }

    #[test]
    fn malformed_input_fails_to_decode() {
        assert!(matches!(
            ParamCodec::deserialize("abc", &ValueType::Integer),
            Err(FilterError::Decoding { .. })
        ));
        assert!(ParamCodec::deserialize("maybe", &ValueType::Boolean).is_err());
        assert!(ParamCodec::deserialize("not-a-uuid", &ValueType::Uuid).is_err());
        assert!(ParamCodec::deserialize("2024-13-45", &ValueType::Date).is_err());
        assert!(ParamCodec::deserialize("NaN", &ValueType::Decimal).is_err());
        assert!(ParamCodec::deserialize("bronze", &enum_type()).is_err());
    }

    #[test]
    fn uuid_round_trips() {
        let id = Uuid::new_v4();
        let text = ParamCodec::serialize(&ParamValue::Uuid(id), &ValueType::Uuid).unwrap();
        assert_eq!(
            ParamCodec::deserialize(&text, &ValueType::Uuid).unwrap(),
            ParamValue::Uuid(id)
        );
    }

    #[test]
    fn list_items_with_commas_round_trip() {
        let ty = ValueType::list_of(ValueType::Text);
        let value = ParamValue::List(vec![
            ParamValue::Text("Smith, John".into()),
            ParamValue::Text("Doe".into()),
        ]);
        let text = ParamCodec::serialize(&value, &ty).unwrap();
        assert_eq!(text, "Smith%2C John,Doe");
        assert_eq!(ParamCodec::deserialize(&text, &ty).unwrap(), value);
    }

    #[test]
    fn list_with_bad_item_fails_as_a_whole() {
        let ty = ValueType::list_of(ValueType::Integer);
        assert!(ParamCodec::deserialize("1,two,3", &ty).is_err());
    }

    #[test]
    fn interval_round_trips() {
        let value = ParamCodec::deserialize("last 5 day", &ValueType::Interval).unwrap();
        assert_eq!(
            ParamCodec::serialize(&value, &ValueType::Interval).unwrap(),
            "last 5 day"
        );
    }

    #[test]
    fn blank_identifier_is_malformed() {
        assert!(ParamCodec::deserialize_identifier("  ").is_err());
        assert_eq!(ParamCodec::deserialize_identifier(" vip ").unwrap(), "vip");
        assert!(ParamCodec::serialize_identifier("").is_err());
        assert!(ParamCodec::serialize_identifier(" vip").is_err());
    }
}
