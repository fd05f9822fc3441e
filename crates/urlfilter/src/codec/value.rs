//! Typed condition values and their declared types.
//!
//! A [`ValueType`] is what a condition *expects*: it is derived from the
//! property's datatype and the operation (see [`crate::model::Operation::value_type`]).
//! A [`ParamValue`] is what a condition *holds*. The two must agree: a value that
//! does not conform to its declared type is treated as absent.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declared type of a condition value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Uuid,
    Date,
    DateTime,
    /// Closed set of enum ids.
    Enum(Vec<String>),
    /// Homogeneous list, used by `inList` / `notInList`.
    List(Box<ValueType>),
    /// Relative date interval, used by `dateInterval`.
    Interval,
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Text => write!(f, "string"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Decimal => write!(f, "decimal"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Uuid => write!(f, "uuid"),
            ValueType::Date => write!(f, "date"),
            ValueType::DateTime => write!(f, "datetime"),
            ValueType::Enum(_) => write!(f, "enum"),
            ValueType::List(inner) => write!(f, "list<{}>", inner),
            ValueType::Interval => write!(f, "interval"),
        }
    }
}

/// Parses the scalar type names used in filter definition files.
///
/// Enum types carry their ids and cannot be expressed by name alone.
impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(ValueType::Text),
            "integer" | "int" | "long" => Ok(ValueType::Integer),
            "decimal" | "double" | "float" => Ok(ValueType::Decimal),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "uuid" => Ok(ValueType::Uuid),
            "date" => Ok(ValueType::Date),
            "datetime" => Ok(ValueType::DateTime),
            "interval" => Ok(ValueType::Interval),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

/// Runtime representation of a condition value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Enum(String),
    List(Vec<ParamValue>),
    Interval(DateInterval),
}

impl ParamValue {
    /// Check whether this value may be held by a condition declaring `ty`.
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (ParamValue::Text(_), ValueType::Text) => true,
            (ParamValue::Integer(_), ValueType::Integer) => true,
            (ParamValue::Decimal(_), ValueType::Decimal) => true,
            (ParamValue::Boolean(_), ValueType::Boolean) => true,
            (ParamValue::Uuid(_), ValueType::Uuid) => true,
            (ParamValue::Date(_), ValueType::Date) => true,
            (ParamValue::DateTime(_), ValueType::DateTime) => true,
            (ParamValue::Enum(id), ValueType::Enum(ids)) => ids.iter().any(|i| i == id),
            (ParamValue::List(items), ValueType::List(inner)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            (ParamValue::Interval(_), ValueType::Interval) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    Last,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

impl IntervalUnit {
    fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Year => "year",
            IntervalUnit::Month => "month",
            IntervalUnit::Week => "week",
            IntervalUnit::Day => "day",
            IntervalUnit::Hour => "hour",
            IntervalUnit::Minute => "minute",
        }
    }
}

/// A relative date interval such as `last 5 day` or `next 1 month including_current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateInterval {
    pub kind: IntervalKind,
    pub number: u32,
    pub unit: IntervalUnit,
    pub include_current: bool,
}

const INCLUDING_CURRENT: &str = "including_current";

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            IntervalKind::Last => "last",
            IntervalKind::Next => "next",
        };
        write!(f, "{} {} {}", kind, self.number, self.unit.as_str())?;
        if self.include_current {
            write!(f, " {}", INCLUDING_CURRENT)?;
        }
        Ok(())
    }
}

impl FromStr for DateInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() < 3 || parts.len() > 4 {
            return Err(format!("expected '<last|next> <n> <unit>', got '{}'", s));
        }

        let kind = match parts[0].to_ascii_lowercase().as_str() {
            "last" => IntervalKind::Last,
            "next" => IntervalKind::Next,
            other => return Err(format!("unknown interval kind '{}'", other)),
        };
        let number = parts[1]
            .parse::<u32>()
            .map_err(|e| format!("invalid interval number '{}': {}", parts[1], e))?;
        let unit = match parts[2].to_ascii_lowercase().trim_end_matches('s') {
            "year" => IntervalUnit::Year,
            "month" => IntervalUnit::Month,
            "week" => IntervalUnit::Week,
            "day" => IntervalUnit::Day,
            "hour" => IntervalUnit::Hour,
            "minute" => IntervalUnit::Minute,
            other => return Err(format!("unknown interval unit '{}'", other)),
        };
        let include_current = match parts.get(3) {
            None => false,
            Some(flag) if flag.eq_ignore_ascii_case(INCLUDING_CURRENT) => true,
            Some(flag) => return Err(format!("unexpected interval flag '{}'", flag)),
        };

        Ok(DateInterval {
            kind,
            number,
            unit,
            include_current,
        })
    }
}
