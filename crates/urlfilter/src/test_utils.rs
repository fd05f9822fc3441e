use crate::codec::value::ValueType;
use crate::facet::Router;
use crate::metadata::{EntityDef, Schema};
use crate::params::QueryParameters;

/// `Customer` with a nested `address` reference and a system-level `version`.
pub fn customer_schema() -> Schema {
    Schema::new()
        .with_entity(
            EntityDef::new("Customer")
                .property("name", ValueType::Text)
                .property("email", ValueType::Text)
                .property("age", ValueType::Integer)
                .property("active", ValueType::Boolean)
                .property("since", ValueType::Date)
                .property(
                    "grade",
                    ValueType::Enum(vec!["BRONZE".into(), "SILVER".into(), "GOLD".into()]),
                )
                .reference("address", "Address")
                .system("version", ValueType::Integer),
        )
        .with_entity(EntityDef::new("Address").property("city", ValueType::Text))
}

/// Router that stores the location and counts writes.
#[derive(Debug, Default)]
pub struct RecordingRouter {
    pub location: QueryParameters,
    pub writes: Vec<QueryParameters>,
}

impl Router for RecordingRouter {
    fn location(&self) -> QueryParameters {
        self.location.clone()
    }

    fn set_query_parameters(&mut self, params: QueryParameters) {
        self.writes.push(params.clone());
        self.location = params;
    }
}
