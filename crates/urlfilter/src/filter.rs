//! The filter component state a binder is attached to.
//!
//! [`GenericFilter`] owns the configuration registry and exposes the edit
//! operations a UI performs. Every mutation bumps [`GenericFilter::revision`],
//! which is how the binder notices UI-side changes without a callback per edit.

use crate::codec::value::ParamValue;
use crate::error::{FilterError, Result};
use crate::metadata::{AccessControl, EntityMetadata, PropertyPath, PropertyPredicate};
use crate::model::{Condition, Configuration, Operation, PropertyCondition};
use crate::notify::{Listeners, Subscription};
use crate::reconcile::{ReconcileReport, ReconciliationEngine};
use crate::registry::{ConfigurationChanged, ConfigurationKey, ConfigurationRegistry};

/// Fired after the conditions of a configuration changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionsChanged {
    pub configuration: ConfigurationKey,
}

pub struct GenericFilter {
    entity: String,
    registry: ConfigurationRegistry,
    property_predicate: Option<PropertyPredicate>,
    revision: u64,
    conditions_changed: Listeners<ConditionsChanged>,
}

impl GenericFilter {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            registry: ConfigurationRegistry::new(),
            property_predicate: None,
            revision: 0,
            conditions_changed: Listeners::new(),
        }
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Result<Self> {
        self.add_configuration(configuration)?;
        Ok(self)
    }

    pub fn with_property_predicate(
        mut self,
        predicate: impl Fn(&PropertyPath) -> bool + 'static,
    ) -> Self {
        self.property_predicate = Some(Box::new(predicate));
        self
    }

    pub fn add_configuration(&mut self, configuration: Configuration) -> Result<ConfigurationKey> {
        self.registry.add(configuration)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn registry(&self) -> &ConfigurationRegistry {
        &self.registry
    }

    /// Increases on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current_configuration(&self) -> &Configuration {
        self.registry.active()
    }

    pub fn current_key(&self) -> ConfigurationKey {
        self.registry.active_key()
    }

    pub fn configuration(&self, key: ConfigurationKey) -> Option<&Configuration> {
        self.registry.get(key)
    }

    /// Make `key` the current configuration and notify listeners.
    pub fn set_current_configuration(&mut self, key: ConfigurationKey) -> Result<()> {
        self.registry.set_active(key, true)?;
        self.revision += 1;
        Ok(())
    }

    /// Select a named configuration, or the empty one for `None`.
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        let key = match id {
            Some(id) => self
                .registry
                .resolve(id)
                .ok_or_else(|| FilterError::UnknownConfiguration(id.to_string()))?,
            None => ConfigurationRegistry::EMPTY,
        };
        self.set_current_configuration(key)
    }

    /// Append a condition to the current configuration.
    pub fn add_condition(&mut self, condition: impl Into<Condition>) -> Result<usize> {
        self.edit_current(|config| {
            if !config.kind.is_mutable() {
                return Err(FilterError::IllegalState(
                    "conditions cannot be added to a design-time configuration".to_string(),
                ));
            }
            config.add_condition(condition, true);
            Ok(config.len() - 1)
        })
    }

    pub fn remove_condition(&mut self, index: usize) -> Result<Condition> {
        self.edit_current(|config| {
            if !config.kind.is_mutable() {
                return Err(FilterError::IllegalState(
                    "conditions cannot be removed from a design-time configuration".to_string(),
                ));
            }
            if index >= config.len() {
                return Err(out_of_range(index, config.len()));
            }
            Ok(config.entries.remove(index).condition)
        })
    }

    pub fn clear_conditions(&mut self) -> Result<()> {
        self.edit_current(|config| {
            if !config.kind.is_mutable() {
                return Err(FilterError::IllegalState(
                    "design-time configurations cannot be cleared".to_string(),
                ));
            }
            config.clear_conditions();
            Ok(())
        })
    }

    pub fn set_condition_value(&mut self, index: usize, value: Option<ParamValue>) -> Result<()> {
        self.edit_property(index, |condition| {
            condition.value = value;
            Ok(())
        })
    }

    pub fn set_condition_operation(&mut self, index: usize, operation: Operation) -> Result<()> {
        self.edit_property(index, |condition| {
            if !condition.operation_editable && condition.operation != operation {
                return Err(FilterError::IllegalState(format!(
                    "operation of condition on '{}' is not editable",
                    condition.property
                )));
            }
            condition.operation = operation;
            Ok(())
        })
    }

    /// Merge URL-decoded conditions into the configuration under `key`.
    pub fn reconcile(
        &mut self,
        key: ConfigurationKey,
        incoming: Vec<PropertyCondition>,
        metadata: &dyn EntityMetadata,
        access: &dyn AccessControl,
    ) -> Result<ReconcileReport> {
        self.merge_into(key, metadata, access, |engine, configuration| {
            engine.reconcile(configuration, incoming)
        })
    }

    /// Append permitted URL conditions to configuration `key` without
    /// matching them against existing ones.
    pub fn append_conditions(
        &mut self,
        key: ConfigurationKey,
        incoming: Vec<PropertyCondition>,
        metadata: &dyn EntityMetadata,
        access: &dyn AccessControl,
    ) -> Result<ReconcileReport> {
        self.merge_into(key, metadata, access, |engine, configuration| {
            engine.append(configuration, incoming)
        })
    }

    fn merge_into(
        &mut self,
        key: ConfigurationKey,
        metadata: &dyn EntityMetadata,
        access: &dyn AccessControl,
        merge: impl FnOnce(&ReconciliationEngine<'_>, &mut Configuration) -> ReconcileReport,
    ) -> Result<ReconcileReport> {
        let engine = ReconciliationEngine::new(&self.entity, metadata, access)
            .with_predicate(self.property_predicate.as_ref());
        let configuration = self
            .registry
            .get_mut(key)
            .ok_or_else(|| FilterError::UnknownConfiguration(format!("{:?}", key)))?;

        let report = merge(&engine, configuration);
        if !report.is_noop() {
            self.touch(key);
        }
        Ok(report)
    }

    /// Drop every condition of a run-time configuration. Design-time ones are
    /// left alone.
    pub(crate) fn reset_conditions(&mut self, key: ConfigurationKey) -> Result<()> {
        let configuration = self
            .registry
            .get_mut(key)
            .ok_or_else(|| FilterError::UnknownConfiguration(format!("{:?}", key)))?;
        if configuration.kind.is_mutable() {
            configuration.clear_conditions();
            self.touch(key);
        }
        Ok(())
    }

    pub fn on_configuration_changed(
        &self,
        listener: impl FnMut(&ConfigurationChanged) + 'static,
    ) -> Subscription {
        self.registry.on_configuration_changed(listener)
    }

    pub fn on_conditions_changed(
        &self,
        listener: impl FnMut(&ConditionsChanged) + 'static,
    ) -> Subscription {
        self.conditions_changed.subscribe(listener)
    }

    fn edit_current<T>(&mut self, edit: impl FnOnce(&mut Configuration) -> Result<T>) -> Result<T> {
        let key = self.registry.active_key();
        let configuration = self
            .registry
            .get_mut(key)
            .ok_or_else(|| FilterError::UnknownConfiguration(format!("{:?}", key)))?;
        let result = edit(configuration)?;
        self.touch(key);
        Ok(result)
    }

    fn edit_property(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut PropertyCondition) -> Result<()>,
    ) -> Result<()> {
        self.edit_current(|config| {
            let len = config.len();
            let entry = config
                .entries
                .get_mut(index)
                .ok_or_else(|| out_of_range(index, len))?;
            let condition = entry.condition.as_property_mut().ok_or_else(|| {
                FilterError::IllegalState(format!("condition {} is not a property condition", index))
            })?;
            edit(condition)?;
            entry.modified = true;
            Ok(())
        })
    }

    fn touch(&mut self, key: ConfigurationKey) {
        self.revision += 1;
        self.conditions_changed
            .emit(&ConditionsChanged { configuration: key });
    }
}

impl std::fmt::Debug for GenericFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericFilter")
            .field("entity", &self.entity)
            .field("registry", &self.registry)
            .field("revision", &self.revision)
            .finish()
    }
}

fn out_of_range(index: usize, len: usize) -> FilterError {
    FilterError::IllegalState(format!(
        "condition index {} out of range (configuration has {})",
        index, len
    ))
}
