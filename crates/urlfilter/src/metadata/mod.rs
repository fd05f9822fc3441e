//! # Collaborator Ports
//!
//! The binder never looks up services on its own. Everything it needs to know
//! about the entity model and the current user is passed in through the traits
//! below, so reconciliation and decoding can be exercised with plain fakes.
//!
//! - [`EntityMetadata`]: resolves a dotted property path on an entity.
//! - [`AccessControl`]: answers whether the current user may view a property.
//! - [`PropertyPredicate`]: optional per-filter allow-list for properties.
//!
//! [`schema::Schema`] and [`access::AttributeAccess`] are small in-memory
//! implementations used by tests and by the command-line client.

use crate::codec::value::ValueType;

pub mod access;
pub mod schema;

pub use access::AttributeAccess;
pub use schema::{EntityDef, PropertyDef, PropertyKind, Schema};

/// A property path that resolved against the entity model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    /// Entity the path starts from.
    pub entity: String,
    /// Dotted path as written, e.g. `customer.address.city`.
    pub path: String,
    /// Datatype of the last property in the path.
    pub datatype: ValueType,
    /// The last property is an internal, system-level attribute.
    pub system_level: bool,
}

/// Entity metadata lookup.
pub trait EntityMetadata {
    /// Resolve `path` on `entity`, or `None` if any segment is unknown.
    fn resolve_property_path(&self, entity: &str, path: &str) -> Option<PropertyPath>;
}

/// Attribute-level access check for the current user.
pub trait AccessControl {
    fn can_view(&self, path: &PropertyPath) -> bool;
}

/// Extra restriction on which properties a filter accepts.
pub type PropertyPredicate = Box<dyn Fn(&PropertyPath) -> bool>;

/// Grants view access to everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessControl for AllowAll {
    fn can_view(&self, _path: &PropertyPath) -> bool {
        true
    }
}
