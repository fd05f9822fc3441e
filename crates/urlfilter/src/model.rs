//! Core filter data types.
//!
//! A [`Configuration`] is a named (or ad-hoc) set of conditions attached to a
//! data view. Its top level is a list of [`FilterEntry`] values combined with a
//! [`LogicalOperation`]; each entry wraps a [`Condition`] and remembers whether
//! it was added or edited after the configuration was loaded.
//!
//! [`Condition`] is a closed sum type. Its [`ConditionTag`] doubles as the wire
//! discriminator used by [`crate::codec::ConditionCodec`]; only property
//! conditions have a wire form today.

use crate::codec::value::{ParamValue, ValueType};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How a configuration may be changed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigurationKind {
    /// User-editable; accepts new conditions from URL input.
    RunTime,
    /// Declared up front; existing conditions may be updated but none added.
    DesignTime,
}

impl ConfigurationKind {
    pub fn is_mutable(&self) -> bool {
        matches!(self, ConfigurationKind::RunTime)
    }
}

impl FromStr for ConfigurationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "run-time" | "runtime" => Ok(ConfigurationKind::RunTime),
            "design-time" | "designtime" => Ok(ConfigurationKind::DesignTime),
            other => Err(format!("unknown configuration kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperation {
    #[default]
    And,
    Or,
}

/// Shape of the value an operation compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Single value of the property's type.
    Value,
    /// No operand; the value is a boolean switch.
    Unary,
    /// List of values of the property's type.
    List,
    /// Relative date interval.
    Interval,
}

/// Property filter operations.
///
/// Each operation has a short wire name (`eq`, `gt`, `inList`, ...) used in URL
/// tokens. Decoding also accepts the upper-case enum names (`EQUAL`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsSet,
    IsNotSet,
    InList,
    NotInList,
    DateInterval,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::Equal,
        Operation::NotEqual,
        Operation::Greater,
        Operation::GreaterOrEqual,
        Operation::Less,
        Operation::LessOrEqual,
        Operation::Contains,
        Operation::NotContains,
        Operation::StartsWith,
        Operation::EndsWith,
        Operation::IsSet,
        Operation::IsNotSet,
        Operation::InList,
        Operation::NotInList,
        Operation::DateInterval,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Operation::Equal => "eq",
            Operation::NotEqual => "ne",
            Operation::Greater => "gt",
            Operation::GreaterOrEqual => "ge",
            Operation::Less => "lt",
            Operation::LessOrEqual => "le",
            Operation::Contains => "contains",
            Operation::NotContains => "notContains",
            Operation::StartsWith => "startsWith",
            Operation::EndsWith => "endsWith",
            Operation::IsSet => "isSet",
            Operation::IsNotSet => "isNotSet",
            Operation::InList => "inList",
            Operation::NotInList => "notInList",
            Operation::DateInterval => "dateInterval",
        }
    }

    fn enum_name(&self) -> &'static str {
        match self {
            Operation::Equal => "EQUAL",
            Operation::NotEqual => "NOT_EQUAL",
            Operation::Greater => "GREATER",
            Operation::GreaterOrEqual => "GREATER_OR_EQUAL",
            Operation::Less => "LESS",
            Operation::LessOrEqual => "LESS_OR_EQUAL",
            Operation::Contains => "CONTAINS",
            Operation::NotContains => "NOT_CONTAINS",
            Operation::StartsWith => "STARTS_WITH",
            Operation::EndsWith => "ENDS_WITH",
            Operation::IsSet => "IS_SET",
            Operation::IsNotSet => "IS_NOT_SET",
            Operation::InList => "IN_LIST",
            Operation::NotInList => "NOT_IN_LIST",
            Operation::DateInterval => "DATE_INTERVAL",
        }
    }

    pub fn operation_type(&self) -> OperationType {
        match self {
            Operation::IsSet | Operation::IsNotSet => OperationType::Unary,
            Operation::InList | Operation::NotInList => OperationType::List,
            Operation::DateInterval => OperationType::Interval,
            _ => OperationType::Value,
        }
    }

    /// The value type a condition with this operation holds for a property of
    /// type `property_type`.
    pub fn value_type(&self, property_type: &ValueType) -> ValueType {
        match self.operation_type() {
            OperationType::Value => property_type.clone(),
            OperationType::Unary => ValueType::Boolean,
            OperationType::List => ValueType::list_of(property_type.clone()),
            OperationType::Interval => ValueType::Interval,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for Operation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .find(|op| op.wire_name() == s || op.enum_name() == s)
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

/// Discriminator of the [`Condition`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTag {
    Property,
    Group,
}

impl ConditionTag {
    /// Wire prefix for tags that can be carried in URL tokens.
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            ConditionTag::Property => Some("property:"),
            ConditionTag::Group => None,
        }
    }

    /// Split a token into its tag and body.
    pub fn strip(token: &str) -> Option<(ConditionTag, &str)> {
        [ConditionTag::Property, ConditionTag::Group]
            .into_iter()
            .find_map(|tag| {
                let prefix = tag.prefix()?;
                token.strip_prefix(prefix).map(|body| (tag, body))
            })
    }
}

/// One filterable predicate on an entity property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyCondition {
    /// Dot-separated property path, e.g. `customer.name`.
    pub property: String,
    pub operation: Operation,
    /// Whether the operation may be changed by the user or by URL input.
    pub operation_editable: bool,
    pub value: Option<ParamValue>,
    /// Name under which the value is bound in the data query.
    pub parameter_name: String,
}

impl PropertyCondition {
    pub fn new(property: impl Into<String>, operation: Operation) -> Self {
        let property = property.into();
        let parameter_name = generate_parameter_name(&property);
        Self {
            property,
            operation,
            operation_editable: true,
            value: None,
            parameter_name,
        }
    }

    pub fn with_value(mut self, value: ParamValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_operation_editable(mut self, editable: bool) -> Self {
        self.operation_editable = editable;
        self
    }

    /// Same property, operation and value. Parameter names are ignored.
    pub fn same_predicate(&self, other: &PropertyCondition) -> bool {
        self.property == other.property
            && self.operation == other.operation
            && self.value == other.value
    }
}

/// Build a query parameter name from a property path plus a random suffix.
pub fn generate_parameter_name(property: &str) -> String {
    let base: String = property
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", base, &suffix[..8])
}

/// Nested group of conditions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LogicalGroup {
    pub operation: LogicalOperation,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Condition {
    Property(PropertyCondition),
    Group(LogicalGroup),
}

impl Condition {
    pub fn as_property(&self) -> Option<&PropertyCondition> {
        match self {
            Condition::Property(p) => Some(p),
            Condition::Group(_) => None,
        }
    }

    pub fn as_property_mut(&mut self) -> Option<&mut PropertyCondition> {
        match self {
            Condition::Property(p) => Some(p),
            Condition::Group(_) => None,
        }
    }
}

impl From<PropertyCondition> for Condition {
    fn from(p: PropertyCondition) -> Self {
        Condition::Property(p)
    }
}

/// A top-level condition plus its modified flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterEntry {
    pub condition: Condition,
    /// Added or edited after the configuration was loaded.
    pub modified: bool,
}

/// A saved or ad-hoc set of filter conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    /// `None` for the empty (ad-hoc) configuration.
    pub id: Option<String>,
    pub name: Option<String>,
    pub kind: ConfigurationKind,
    pub operation: LogicalOperation,
    pub entries: Vec<FilterEntry>,
}

impl Configuration {
    pub fn new(id: impl Into<String>, kind: ConfigurationKind) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
            kind,
            operation: LogicalOperation::And,
            entries: Vec::new(),
        }
    }

    /// The ad-hoc configuration every filter starts with.
    pub fn empty() -> Self {
        Self {
            id: None,
            name: None,
            kind: ConfigurationKind::RunTime,
            operation: LogicalOperation::And,
            entries: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a condition as loaded (not modified).
    pub fn with_condition(mut self, condition: impl Into<Condition>) -> Self {
        self.entries.push(FilterEntry {
            condition: condition.into(),
            modified: false,
        });
        self
    }

    pub fn is_empty_configuration(&self) -> bool {
        self.id.is_none()
    }

    pub fn add_condition(&mut self, condition: impl Into<Condition>, modified: bool) {
        self.entries.push(FilterEntry {
            condition: condition.into(),
            modified,
        });
    }

    pub fn clear_conditions(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level property conditions, in tree order.
    pub fn property_conditions(&self) -> impl Iterator<Item = &PropertyCondition> {
        self.entries.iter().filter_map(|e| e.condition.as_property())
    }

    pub fn modified_count(&self) -> usize {
        self.entries.iter().filter(|e| e.modified).count()
    }
}
