//! Known configurations of one filter and which one is active.
//!
//! The registry always contains the empty (ad-hoc) configuration under
//! [`ConfigurationRegistry::EMPTY`]. Named configurations are looked up by a
//! linear scan; filters carry a handful of them at most.

use crate::error::{FilterError, Result};
use crate::model::Configuration;
use crate::notify::{Listeners, Subscription};

/// Stable handle to a configuration inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigurationKey(usize);

/// Fired whenever a configuration is made active with notification enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationChanged {
    pub previous: ConfigurationKey,
    pub current: ConfigurationKey,
}

pub struct ConfigurationRegistry {
    configurations: Vec<Configuration>,
    active: ConfigurationKey,
    listeners: Listeners<ConfigurationChanged>,
}

impl Default for ConfigurationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationRegistry {
    pub const EMPTY: ConfigurationKey = ConfigurationKey(0);

    pub fn new() -> Self {
        Self {
            configurations: vec![Configuration::empty()],
            active: Self::EMPTY,
            listeners: Listeners::new(),
        }
    }

    /// Register a named configuration.
    pub fn add(&mut self, configuration: Configuration) -> Result<ConfigurationKey> {
        let Some(id) = configuration.id.as_deref() else {
            return Err(FilterError::IllegalState(
                "the empty configuration is built in and cannot be added".to_string(),
            ));
        };
        if id.trim().is_empty() || id.trim() != id {
            return Err(FilterError::IllegalState(format!(
                "configuration id '{}' is blank or padded with whitespace",
                id
            )));
        }
        if self.resolve(id).is_some() {
            return Err(FilterError::DuplicateConfiguration(id.to_string()));
        }

        self.configurations.push(configuration);
        Ok(ConfigurationKey(self.configurations.len() - 1))
    }

    /// Find a named configuration by id.
    pub fn resolve(&self, id: &str) -> Option<ConfigurationKey> {
        self.configurations
            .iter()
            .position(|c| c.id.as_deref() == Some(id))
            .map(ConfigurationKey)
    }

    pub fn get(&self, key: ConfigurationKey) -> Option<&Configuration> {
        self.configurations.get(key.0)
    }

    pub fn get_mut(&mut self, key: ConfigurationKey) -> Option<&mut Configuration> {
        self.configurations.get_mut(key.0)
    }

    pub fn active(&self) -> &Configuration {
        &self.configurations[self.active.0]
    }

    pub fn active_key(&self) -> ConfigurationKey {
        self.active
    }

    /// Make `key` active. With `notify`, listeners are called even when `key`
    /// was already active.
    pub fn set_active(&mut self, key: ConfigurationKey, notify: bool) -> Result<()> {
        if self.get(key).is_none() {
            return Err(FilterError::UnknownConfiguration(format!("{:?}", key)));
        }

        let previous = self.active;
        self.active = key;
        if notify {
            self.listeners.emit(&ConfigurationChanged {
                previous,
                current: key,
            });
        }
        Ok(())
    }

    /// Number of configurations, including the empty one.
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn on_configuration_changed(
        &self,
        listener: impl FnMut(&ConfigurationChanged) + 'static,
    ) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

impl std::fmt::Debug for ConfigurationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationRegistry")
            .field("configurations", &self.configurations)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigurationKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_with_active_empty_configuration() {
        let registry = ConfigurationRegistry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_key(), ConfigurationRegistry::EMPTY);
        assert!(registry.active().is_empty_configuration());
    }

    #[test]
    fn resolves_named_configurations() {
        let mut registry = ConfigurationRegistry::new();
        let vip = registry
            .add(Configuration::new("vip", ConfigurationKind::DesignTime))
            .unwrap();
        let mine = registry
            .add(Configuration::new("mine", ConfigurationKind::RunTime))
            .unwrap();

        assert_eq!(registry.resolve("vip"), Some(vip));
        assert_eq!(registry.resolve("mine"), Some(mine));
        assert_eq!(registry.resolve("other"), None);
    }

    #[test]
    fn rejects_duplicate_ids_and_second_empty() {
        let mut registry = ConfigurationRegistry::new();
        registry
            .add(Configuration::new("vip", ConfigurationKind::RunTime))
            .unwrap();

        assert!(matches!(
            registry.add(Configuration::new("vip", ConfigurationKind::DesignTime)),
            Err(FilterError::DuplicateConfiguration(_))
        ));
        assert!(matches!(
            registry.add(Configuration::empty()),
            Err(FilterError::IllegalState(_))
        ));
    }

    #[test]
    fn rejects_ids_that_would_not_survive_the_url() {
        let mut registry = ConfigurationRegistry::new();
        for id in [" vip", "vip ", "  "] {
            assert!(matches!(
                registry.add(Configuration::new(id, ConfigurationKind::RunTime)),
                Err(FilterError::IllegalState(_))
            ));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn set_active_notifies_every_time() {
        let mut registry = ConfigurationRegistry::new();
        let vip = registry
            .add(Configuration::new("vip", ConfigurationKind::RunTime))
            .unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _sub = registry.on_configuration_changed(move |e| sink.borrow_mut().push(*e));

        registry.set_active(vip, true).unwrap();
        registry.set_active(vip, true).unwrap();
        registry.set_active(ConfigurationRegistry::EMPTY, false).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].previous, ConfigurationRegistry::EMPTY);
        assert_eq!(events[1].previous, vip);
        assert_eq!(events[1].current, vip);
        assert_eq!(registry.active_key(), ConfigurationRegistry::EMPTY);
    }

    #[test]
    fn set_active_rejects_foreign_keys() {
        let mut registry = ConfigurationRegistry::new();
        assert!(matches!(
            registry.set_active(ConfigurationKey(9), true),
            Err(FilterError::UnknownConfiguration(_))
        ));
    }
}
