//! # Reconciliation
//!
//! Merges conditions decoded from the URL into an existing configuration.
//!
//! For each incoming condition, in input order:
//!
//! 1. **Permission**: if the property resolves, it must pass the filter's
//!    property predicate, be viewable by the current user and not be a
//!    system-level attribute. Rejected conditions are discarded. Properties
//!    that do not resolve are kept.
//! 2. **Match**: the first still-unconsumed top-level property condition with
//!    the same property (exact string match) is the candidate.
//!    - If its operation is editable it takes the incoming operation.
//!    - If the operations now agree, the incoming value (when present)
//!      replaces the existing one and the candidate is consumed.
//!    - Otherwise the incoming condition counts as unmatched.
//! 3. **Insert**: unmatched conditions are appended (marked modified) to
//!    run-time configurations and dropped for design-time ones.
//!
//! [`ReconciliationEngine::append`] skips the match step: every permitted
//! condition is inserted, even if the property already has one.
//!
//! Activating the configuration afterwards is the caller's job.

use crate::metadata::{AccessControl, EntityMetadata, PropertyPredicate};
use crate::model::{Condition, Configuration, FilterEntry, PropertyCondition};
use serde::Serialize;
use tracing::debug;

/// What a reconciliation did, by property path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Existing conditions that absorbed an incoming one.
    pub updated: Vec<String>,
    /// Incoming conditions appended to the configuration.
    pub inserted: Vec<String>,
    /// Unmatched conditions a design-time configuration could not take.
    pub dropped: Vec<String>,
    /// Conditions discarded by the permission check.
    pub rejected: Vec<String>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.updated.is_empty() && self.inserted.is_empty()
    }
}

pub struct ReconciliationEngine<'a> {
    entity: &'a str,
    metadata: &'a dyn EntityMetadata,
    access: &'a dyn AccessControl,
    predicate: Option<&'a PropertyPredicate>,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(
        entity: &'a str,
        metadata: &'a dyn EntityMetadata,
        access: &'a dyn AccessControl,
    ) -> Self {
        Self {
            entity,
            metadata,
            access,
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Option<&'a PropertyPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Whether a URL condition on this property may touch the filter.
    pub fn is_permitted(&self, condition: &PropertyCondition) -> bool {
        let Some(path) = self
            .metadata
            .resolve_property_path(self.entity, &condition.property)
        else {
            return true;
        };

        if let Some(predicate) = self.predicate {
            if !predicate(&path) {
                return false;
            }
        }
        if !self.access.can_view(&path) {
            return false;
        }
        !path.system_level
    }

    pub fn reconcile(
        &self,
        configuration: &mut Configuration,
        incoming: Vec<PropertyCondition>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut pool: Vec<usize> = configuration
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.condition.as_property().is_some())
            .map(|(i, _)| i)
            .collect();

        for condition in incoming {
            let Some(condition) = self.admit(condition, &mut report) else {
                continue;
            };

            let candidate = pool.iter().position(|&i| {
                configuration.entries[i]
                    .condition
                    .as_property()
                    .is_some_and(|p| p.property == condition.property)
            });

            if let Some(pos) = candidate {
                let entry = &mut configuration.entries[pool[pos]];
                if self.absorb(entry, &condition) {
                    pool.remove(pos);
                    report.updated.push(condition.property);
                    continue;
                }
            }

            insert(configuration, condition, &mut report);
        }

        report
    }

    /// Append every permitted condition without looking for matches. Used
    /// when the URL carries conditions but no configuration id.
    pub fn append(
        &self,
        configuration: &mut Configuration,
        incoming: Vec<PropertyCondition>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for condition in incoming {
            if let Some(condition) = self.admit(condition, &mut report) {
                insert(configuration, condition, &mut report);
            }
        }
        report
    }

    fn admit(
        &self,
        condition: PropertyCondition,
        report: &mut ReconcileReport,
    ) -> Option<PropertyCondition> {
        if self.is_permitted(&condition) {
            return Some(condition);
        }
        debug!(
            "Condition on '{}' is not permitted for {}",
            condition.property, self.entity
        );
        report.rejected.push(condition.property);
        None
    }

    /// Apply `incoming` onto a matching entry. Returns false if the operations
    /// cannot be brought into agreement.
    fn absorb(&self, entry: &mut FilterEntry, incoming: &PropertyCondition) -> bool {
        let Condition::Property(existing) = &mut entry.condition else {
            return false;
        };

        let previous_operation = existing.operation;
        if existing.operation_editable {
            existing.operation = incoming.operation;
        }
        if existing.operation != incoming.operation {
            return false;
        }

        let operation_changed = previous_operation != existing.operation;
        let mut value_changed = false;
        if let Some(value) = &incoming.value {
            value_changed = existing.value.as_ref() != Some(value);
            existing.value = Some(value.clone());
        } else if operation_changed && !self.value_still_fits(existing, previous_operation) {
            existing.value = None;
            value_changed = true;
        }

        if operation_changed || value_changed {
            entry.modified = true;
        }
        true
    }

    fn value_still_fits(
        &self,
        condition: &PropertyCondition,
        previous: crate::model::Operation,
    ) -> bool {
        let Some(value) = &condition.value else {
            return true;
        };
        match self
            .metadata
            .resolve_property_path(self.entity, &condition.property)
        {
            Some(path) => value.conforms_to(&condition.operation.value_type(&path.datatype)),
            None => previous.operation_type() == condition.operation.operation_type(),
        }
    }
}

fn insert(
    configuration: &mut Configuration,
    condition: PropertyCondition,
    report: &mut ReconcileReport,
) {
    if configuration.kind.is_mutable() {
        report.inserted.push(condition.property.clone());
        configuration.add_condition(condition, true);
    } else {
        debug!(
            "Can't add condition on '{}' to design-time configuration {:?}",
            condition.property, configuration.id
        );
        report.dropped.push(condition.property);
    }
}
