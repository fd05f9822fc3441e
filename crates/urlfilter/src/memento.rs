//! Snapshot of which configuration was active when a binder was bound.

use crate::error::{FilterError, Result};
use crate::filter::GenericFilter;
use crate::registry::ConfigurationKey;
use tracing::debug;

/// Remembers the configuration that was current at bind time.
///
/// Only the handle is stored: restoring re-activates that configuration but
/// does not bring back its conditions. Run-time configurations are cleared on
/// restore, design-time ones are re-activated as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitialStateMemento {
    captured: Option<ConfigurationKey>,
}

impl InitialStateMemento {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current configuration. Only the first call has an effect.
    pub fn save(&mut self, filter: &GenericFilter) -> bool {
        if self.captured.is_some() {
            debug!("Initial filter state already captured");
            return false;
        }
        self.captured = Some(filter.current_key());
        true
    }

    pub fn captured(&self) -> Option<ConfigurationKey> {
        self.captured
    }

    pub fn restore(&self, filter: &mut GenericFilter) -> Result<()> {
        let key = self.captured.ok_or_else(|| {
            FilterError::IllegalState("initial filter state was never saved".to_string())
        })?;

        filter.reset_conditions(key)?;
        filter.set_current_configuration(key)
    }
}
