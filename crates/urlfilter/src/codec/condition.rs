//! Property condition tokens.

use super::escape::{escape, unescape, SEPARATOR};
use super::param::ParamCodec;
use super::value::{ParamValue, ValueType};
use crate::error::{FilterError, Result};
use crate::metadata::EntityMetadata;
use crate::model::{Condition, ConditionTag, Operation, PropertyCondition};
use tracing::{info, warn};

/// Entity model the codec resolves property types against.
#[derive(Clone, Copy)]
pub struct CodecContext<'a> {
    pub entity: &'a str,
    pub metadata: &'a dyn EntityMetadata,
}

impl<'a> CodecContext<'a> {
    pub fn new(entity: &'a str, metadata: &'a dyn EntityMetadata) -> Self {
        Self { entity, metadata }
    }

    /// Declared value type of `operation` on `property`, if the property resolves.
    pub fn value_type(&self, property: &str, operation: Operation) -> Option<ValueType> {
        self.metadata
            .resolve_property_path(self.entity, property)
            .map(|path| operation.value_type(&path.datatype))
    }
}

/// Result of decoding a list of tokens.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub conditions: Vec<PropertyCondition>,
    /// Tokens that could not be decoded, with the reason.
    pub dropped: Vec<(String, FilterError)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionCodec;

impl ConditionCodec {
    /// Encode a condition as a single URL token.
    pub fn encode(condition: &Condition, ctx: &CodecContext<'_>) -> Result<String> {
        match condition {
            Condition::Property(p) => Self::encode_property(p, ctx),
            Condition::Group(_) => Err(FilterError::Encoding {
                expected: "property condition".to_string(),
                value: "group".to_string(),
            }),
        }
    }

    pub fn encode_property(condition: &PropertyCondition, ctx: &CodecContext<'_>) -> Result<String> {
        let value = match &condition.value {
            Some(value) => {
                let declared = ctx
                    .value_type(&condition.property, condition.operation)
                    .unwrap_or_else(|| natural_type(value));
                ParamCodec::serialize(value, &declared)?
            }
            None => String::new(),
        };
        Ok(Self::format_token(
            &condition.property,
            condition.operation,
            &value,
        ))
    }

    /// Encode a condition, leaving the value segment empty if the value cannot
    /// be represented.
    pub fn encode_lenient(condition: &PropertyCondition, ctx: &CodecContext<'_>) -> String {
        match Self::encode_property(condition, ctx) {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    "Cannot serialize value of condition on '{}': {}",
                    condition.property, e
                );
                Self::format_token(&condition.property, condition.operation, "")
            }
        }
    }

    fn format_token(property: &str, operation: Operation, value: &str) -> String {
        let prefix = ConditionTag::Property.prefix().unwrap_or_default();
        format!(
            "{}{}{}{}{}{}",
            prefix,
            escape(property, SEPARATOR),
            SEPARATOR,
            escape(operation.wire_name(), SEPARATOR),
            SEPARATOR,
            escape(value, SEPARATOR)
        )
    }

    /// Decode one token.
    ///
    /// Fails on an unknown prefix, a missing separator or an unknown operation.
    /// A value that cannot be parsed is not an error: the condition is returned
    /// without a value.
    pub fn decode(token: &str, ctx: &CodecContext<'_>) -> Result<PropertyCondition> {
        match ConditionTag::strip(token) {
            Some((ConditionTag::Property, body)) => Self::decode_property(body, ctx),
            _ => Err(FilterError::UnknownConditionType(token.to_string())),
        }
    }

    fn decode_property(body: &str, ctx: &CodecContext<'_>) -> Result<PropertyCondition> {
        let (property_raw, rest) = body
            .split_once(SEPARATOR)
            .ok_or_else(|| FilterError::MalformedCondition(body.to_string()))?;
        let (operation_raw, value_raw) = rest
            .split_once(SEPARATOR)
            .ok_or_else(|| FilterError::MalformedCondition(body.to_string()))?;

        let property = unescape(property_raw, SEPARATOR);
        if property.is_empty() {
            return Err(FilterError::MalformedCondition(body.to_string()));
        }
        let operation = unescape(operation_raw, SEPARATOR)
            .parse::<Operation>()
            .map_err(FilterError::UnknownOperation)?;

        let mut condition = PropertyCondition::new(property, operation);
        if !value_raw.is_empty() {
            condition.value = Self::decode_value(&condition, &unescape(value_raw, SEPARATOR), ctx);
        }
        Ok(condition)
    }

    fn decode_value(
        condition: &PropertyCondition,
        raw: &str,
        ctx: &CodecContext<'_>,
    ) -> Option<ParamValue> {
        let Some(declared) = ctx.value_type(&condition.property, condition.operation) else {
            info!(
                "Cannot parse URL parameter. Unknown property '{}' of {}",
                condition.property, ctx.entity
            );
            return None;
        };

        match ParamCodec::deserialize(raw, &declared) {
            Ok(value) => Some(value),
            Err(e) => {
                info!("Cannot parse URL parameter. {}", e);
                None
            }
        }
    }

    /// Decode every token, dropping (and logging) the ones that fail.
    pub fn decode_batch<S: AsRef<str>>(tokens: &[S], ctx: &CodecContext<'_>) -> DecodedBatch {
        let mut batch = DecodedBatch::default();
        for token in tokens {
            let token = token.as_ref();
            match Self::decode(token, ctx) {
                Ok(condition) => batch.conditions.push(condition),
                Err(e) => {
                    match &e {
                        FilterError::MalformedCondition(_) => {
                            info!("Dropping URL condition '{}': {}", token, e)
                        }
                        _ => warn!("Dropping URL condition '{}': {}", token, e),
                    }
                    batch.dropped.push((token.to_string(), e));
                }
            }
        }
        batch
    }
}

/// Best-effort declared type for a value whose property is unknown.
fn natural_type(value: &ParamValue) -> ValueType {
    match value {
        ParamValue::Text(_) => ValueType::Text,
        ParamValue::Integer(_) => ValueType::Integer,
        ParamValue::Decimal(_) => ValueType::Decimal,
        ParamValue::Boolean(_) => ValueType::Boolean,
        ParamValue::Uuid(_) => ValueType::Uuid,
        ParamValue::Date(_) => ValueType::Date,
        ParamValue::DateTime(_) => ValueType::DateTime,
        ParamValue::Enum(id) => ValueType::Enum(vec![id.clone()]),
        ParamValue::List(items) => {
            ValueType::list_of(items.first().map(natural_type).unwrap_or(ValueType::Text))
        }
        ParamValue::Interval(_) => ValueType::Interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityDef, Schema};

    fn schema() -> Schema {
        Schema::new().with_entity(
            EntityDef::new("Customer")
                .property("name", ValueType::Text)
                .property("age", ValueType::Integer)
                .property("grade", ValueType::Enum(vec!["gold".into(), "silver".into()]))
                .property("a|b", ValueType::Text),
        )
    }

    #[test]
    fn decodes_simple_token() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        let condition = ConditionCodec::decode("property:name|eq|John", &ctx).unwrap();
        assert_eq!(condition.property, "name");
        assert_eq!(condition.operation, Operation::Equal);
        assert_eq!(condition.value, Some(ParamValue::Text("John".into())));
        assert!(condition.operation_editable);
    }

    #[test]
    fn encodes_simple_condition() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);
        let condition = PropertyCondition::new("age", Operation::Greater)
            .with_value(ParamValue::Integer(30));

        assert_eq!(
            ConditionCodec::encode_property(&condition, &ctx).unwrap(),
            "property:age|gt|30"
        );
    }

    #[test]
    fn round_trips_conditions_with_values() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);
        let conditions = vec![
            PropertyCondition::new("name", Operation::Contains)
                .with_value(ParamValue::Text("x|y".into())),
            PropertyCondition::new("a|b", Operation::Equal)
                .with_value(ParamValue::Text("z".into())),
            PropertyCondition::new("grade", Operation::InList).with_value(ParamValue::List(vec![
                ParamValue::Enum("gold".into()),
                ParamValue::Enum("silver".into()),
            ])),
            PropertyCondition::new("age", Operation::IsSet).with_value(ParamValue::Boolean(true)),
        ];

        for condition in conditions {
            let token = ConditionCodec::encode(&Condition::Property(condition.clone()), &ctx).unwrap();
            let decoded = ConditionCodec::decode(&token, &ctx).unwrap();
            assert!(condition.same_predicate(&decoded), "token {}", token);
        }
    }

    #[test]
    fn empty_value_segment_means_no_value() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        let condition = ConditionCodec::decode("property:name|eq|", &ctx).unwrap();
        assert_eq!(condition.value, None);

        let encoded = ConditionCodec::encode_property(&condition, &ctx).unwrap();
        assert_eq!(encoded, "property:name|eq|");
    }

    #[test]
    fn unparsable_value_degrades_to_absent() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        let condition = ConditionCodec::decode("property:age|gt|old", &ctx).unwrap();
        assert_eq!(condition.operation, Operation::Greater);
        assert_eq!(condition.value, None);
    }

    #[test]
    fn value_of_unknown_property_degrades_to_absent() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        let condition = ConditionCodec::decode("property:nickname|eq|Bob", &ctx).unwrap();
        assert_eq!(condition.property, "nickname");
        assert_eq!(condition.value, None);
    }

    #[test]
    fn value_tail_keeps_raw_separators() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        let condition = ConditionCodec::decode("property:name|eq|a|b", &ctx).unwrap();
        assert_eq!(condition.value, Some(ParamValue::Text("a|b".into())));
    }

    #[test]
    fn missing_separators_are_malformed() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        assert!(matches!(
            ConditionCodec::decode("property:onlyonepart", &ctx),
            Err(FilterError::MalformedCondition(_))
        ));
        assert!(matches!(
            ConditionCodec::decode("property:name|eq", &ctx),
            Err(FilterError::MalformedCondition(_))
        ));
        assert!(matches!(
            ConditionCodec::decode("property:|eq|x", &ctx),
            Err(FilterError::MalformedCondition(_))
        ));
    }

    #[test]
    fn unknown_prefix_and_operation_are_rejected() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);

        assert!(matches!(
            ConditionCodec::decode("jpql:name|eq|x", &ctx),
            Err(FilterError::UnknownConditionType(_))
        ));
        assert!(matches!(
            ConditionCodec::decode("property:name|between|x", &ctx),
            Err(FilterError::UnknownOperation(op)) if op == "between"
        ));
    }

    #[test]
    fn batch_keeps_good_tokens_when_others_fail() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);
        let tokens = [
            "property:onlyonepart",
            "property:name|eq|John",
            "group:whatever",
            "property:age|nope|1",
            "property:age|lt|40",
        ];

        let batch = ConditionCodec::decode_batch(&tokens, &ctx);
        let props: Vec<_> = batch.conditions.iter().map(|c| c.property.as_str()).collect();
        assert_eq!(props, vec!["name", "age"]);
        assert_eq!(batch.dropped.len(), 3);
        assert!(batch.dropped.iter().all(|(_, e)| e.is_token_local()));
    }

    #[test]
    fn unrepresentable_value_fails_strict_encoding_but_not_lenient() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);
        let condition = PropertyCondition::new("age", Operation::Equal)
            .with_value(ParamValue::Text("thirty".into()));

        assert!(matches!(
            ConditionCodec::encode_property(&condition, &ctx),
            Err(FilterError::Encoding { .. })
        ));
        assert_eq!(
            ConditionCodec::encode_lenient(&condition, &ctx),
            "property:age|eq|"
        );
    }

    #[test]
    fn unknown_property_encodes_with_natural_type() {
        let schema = schema();
        let ctx = CodecContext::new("Customer", &schema);
        let condition = PropertyCondition::new("score", Operation::Greater)
            .with_value(ParamValue::Decimal(1.5));

        assert_eq!(
            ConditionCodec::encode_property(&condition, &ctx).unwrap(),
            "property:score|gt|1.5"
        );
    }
}
