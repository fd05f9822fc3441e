//! Filter definition files.
//!
//! ```toml
//! entity = "Customer"
//! default_configuration = "adults"
//!
//! [entities.Customer]
//! name = "string"
//! age = "integer"
//! grade = { type = "enum", values = ["BRONZE", "GOLD"] }
//! address = { reference = "Address" }
//! version = { type = "integer", system = true }
//!
//! [entities.Address]
//! city = "string"
//!
//! [access]
//! hidden = ["address"]
//! allowed = ["name", "age", "grade"]
//!
//! [[configurations]]
//! id = "adults"
//! name = "Adults"
//! kind = "design-time"
//!
//! [[configurations.conditions]]
//! property = "age"
//! operation = "ge"
//! value = "18"
//! locked = true
//! ```
//!
//! `hidden` and `allowed` list property paths of the root entity. Condition
//! values use the same text format as URL tokens.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use urlfilter::codec::value::ValueType;
use urlfilter::codec::ParamCodec;
use urlfilter::config::BinderConfig;
use urlfilter::error::{FilterError, Result};
use urlfilter::metadata::{AttributeAccess, EntityDef, EntityMetadata, Schema};
use urlfilter::model::{Configuration, ConfigurationKind, Operation, PropertyCondition};
use urlfilter::{GenericFilter, GenericFilterBinder};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterDefinition {
    pub entity: String,
    #[serde(default)]
    pub default_configuration: Option<String>,
    pub entities: BTreeMap<String, BTreeMap<String, PropertySpec>>,
    #[serde(default)]
    pub access: AccessSpec,
    #[serde(default)]
    pub configurations: Vec<ConfigurationSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertySpec {
    Type(String),
    Detailed(DetailedProperty),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedProperty {
    #[serde(rename = "type", default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub system: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessSpec {
    #[serde(default)]
    pub hidden: Vec<String>,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
}

fn default_kind() -> String {
    "run-time".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionSpec {
    pub property: String,
    pub operation: String,
    #[serde(default)]
    pub value: Option<String>,
    /// Operation cannot be changed.
    #[serde(default)]
    pub locked: bool,
}

impl FilterDefinition {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let definition: FilterDefinition =
            toml::from_str(text).map_err(|e| FilterError::Definition(e.to_string()))?;
        if !definition.entities.contains_key(&definition.entity) {
            return Err(FilterError::Definition(format!(
                "entity '{}' is not declared under [entities]",
                definition.entity
            )));
        }
        Ok(definition)
    }

    pub fn schema(&self) -> Result<Schema> {
        let mut schema = Schema::new();
        for (name, properties) in &self.entities {
            let mut entity = EntityDef::new(name);
            for (property, spec) in properties {
                entity = match spec {
                    PropertySpec::Type(datatype) => entity.property(property, parse_type(datatype, &[])?),
                    PropertySpec::Detailed(detail) => match (&detail.reference, &detail.datatype) {
                        (Some(target), None) => entity.reference(property, target),
                        (None, Some(datatype)) => {
                            let datatype = parse_type(datatype, &detail.values)?;
                            if detail.system {
                                entity.system(property, datatype)
                            } else {
                                entity.property(property, datatype)
                            }
                        }
                        _ => {
                            return Err(FilterError::Definition(format!(
                                "property '{}.{}' needs exactly one of 'type' or 'reference'",
                                name, property
                            )))
                        }
                    },
                };
            }
            schema.add_entity(entity);
        }
        Ok(schema)
    }

    pub fn access(&self) -> AttributeAccess {
        self.access
            .hidden
            .iter()
            .fold(AttributeAccess::new(), |access, path| {
                access.hide(&self.entity, path)
            })
    }

    /// Build the filter with every configuration and `select` (or the
    /// definition's default) active.
    pub fn filter(&self, schema: &Schema, select: Option<&str>) -> Result<GenericFilter> {
        let mut filter = GenericFilter::new(&self.entity);
        if let Some(allowed) = &self.access.allowed {
            let allowed = allowed.clone();
            filter = filter.with_property_predicate(move |path| allowed.contains(&path.path));
        }

        for spec in &self.configurations {
            filter.add_configuration(self.configuration(spec, schema)?)?;
        }

        let active = select.or(self.default_configuration.as_deref());
        if active.is_some() {
            filter.select(active)?;
        }
        Ok(filter)
    }

    pub fn binder(&self, config: &BinderConfig, select: Option<&str>) -> Result<GenericFilterBinder> {
        let schema = self.schema()?;
        let filter = self.filter(&schema, select)?;
        Ok(GenericFilterBinder::new(filter, schema, self.access()).with_config(config))
    }

    fn configuration(&self, spec: &ConfigurationSpec, schema: &Schema) -> Result<Configuration> {
        let kind = spec
            .kind
            .parse::<ConfigurationKind>()
            .map_err(FilterError::Definition)?;
        let mut configuration = Configuration::new(&spec.id, kind);
        if let Some(name) = &spec.name {
            configuration = configuration.with_name(name);
        }

        for condition in &spec.conditions {
            let operation = condition
                .operation
                .parse::<Operation>()
                .map_err(FilterError::UnknownOperation)?;
            let mut property = PropertyCondition::new(&condition.property, operation)
                .with_operation_editable(!condition.locked);

            if let Some(raw) = &condition.value {
                let path = schema
                    .resolve_property_path(&self.entity, &condition.property)
                    .ok_or_else(|| {
                        FilterError::Definition(format!(
                            "unknown property '{}' in configuration '{}'",
                            condition.property, spec.id
                        ))
                    })?;
                let value = ParamCodec::deserialize(raw, &operation.value_type(&path.datatype))?;
                property = property.with_value(value);
            }
            configuration = configuration.with_condition(property);
        }
        Ok(configuration)
    }
}

fn parse_type(raw: &str, values: &[String]) -> Result<ValueType> {
    if raw.eq_ignore_ascii_case("enum") {
        if values.is_empty() {
            return Err(FilterError::Definition(
                "enum properties need a non-empty 'values' list".to_string(),
            ));
        }
        return Ok(ValueType::Enum(values.to_vec()));
    }
    raw.parse::<ValueType>().map_err(FilterError::Definition)
}
