//! In-memory entity model.

use super::{EntityMetadata, PropertyPath};
use crate::codec::value::ValueType;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// Scalar attribute of the given type.
    Datatype(ValueType),
    /// Reference to another entity. Filtering on the reference itself compares
    /// entity ids, which are UUIDs.
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    pub system_level: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    pub name: String,
    pub properties: Vec<PropertyDef>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, datatype: ValueType) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            kind: PropertyKind::Datatype(datatype),
            system_level: false,
        });
        self
    }

    pub fn reference(mut self, name: impl Into<String>, entity: impl Into<String>) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            kind: PropertyKind::Reference(entity.into()),
            system_level: false,
        });
        self
    }

    /// Add an internal attribute that filters must never expose.
    pub fn system(mut self, name: impl Into<String>, datatype: ValueType) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            kind: PropertyKind::Datatype(datatype),
            system_level: true,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<String, EntityDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.add_entity(entity);
        self
    }

    pub fn add_entity(&mut self, entity: EntityDef) {
        self.entities.insert(entity.name.clone(), entity);
    }
}

impl EntityMetadata for Schema {
    fn resolve_property_path(&self, entity: &str, path: &str) -> Option<PropertyPath> {
        if path.is_empty() {
            return None;
        }

        let mut current = self.entities.get(entity)?;
        let segments: Vec<&str> = path.split('.').collect();
        let (last, init) = segments.split_last()?;

        for segment in init {
            match &current.get(segment)?.kind {
                PropertyKind::Reference(target) => current = self.entities.get(target)?,
                PropertyKind::Datatype(_) => return None,
            }
        }

        let leaf = current.get(last)?;
        let datatype = match &leaf.kind {
            PropertyKind::Datatype(ty) => ty.clone(),
            PropertyKind::Reference(_) => ValueType::Uuid,
        };

        Some(PropertyPath {
            entity: entity.to_string(),
            path: path.to_string(),
            datatype,
            system_level: leaf.system_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(
                EntityDef::new("Order")
                    .property("number", ValueType::Text)
                    .reference("customer", "Customer")
                    .system("version", ValueType::Integer),
            )
            .with_entity(
                EntityDef::new("Customer")
                    .property("name", ValueType::Text)
                    .property("age", ValueType::Integer),
            )
    }

    #[test]
    fn resolves_direct_property() {
        let path = schema().resolve_property_path("Order", "number").unwrap();
        assert_eq!(path.datatype, ValueType::Text);
        assert!(!path.system_level);
    }

    #[test]
    fn resolves_through_references() {
        let path = schema()
            .resolve_property_path("Order", "customer.age")
            .unwrap();
        assert_eq!(path.path, "customer.age");
        assert_eq!(path.entity, "Order");
        assert_eq!(path.datatype, ValueType::Integer);
    }

    #[test]
    fn reference_leaf_compares_ids() {
        let path = schema().resolve_property_path("Order", "customer").unwrap();
        assert_eq!(path.datatype, ValueType::Uuid);
    }

    #[test]
    fn flags_system_level_properties() {
        let path = schema().resolve_property_path("Order", "version").unwrap();
        assert!(path.system_level);
    }

    #[test]
    fn unknown_segments_do_not_resolve() {
        let s = schema();
        assert!(s.resolve_property_path("Order", "missing").is_none());
        assert!(s.resolve_property_path("Order", "number.length").is_none());
        assert!(s.resolve_property_path("Order", "customer.missing").is_none());
        assert!(s.resolve_property_path("Invoice", "number").is_none());
        assert!(s.resolve_property_path("Order", "").is_none());
    }
}
