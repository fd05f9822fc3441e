//! # Generic Filter Binder
//!
//! Keeps one [`GenericFilter`] and two URL query parameters in sync.
//!
//! ## Wire Format
//!
//! - `genericFilterConfiguration`: at most one value, the id of the active
//!   configuration. The empty configuration is written as an empty list, which
//!   removes the key from the location.
//! - `genericFilterCondition`: one token per top-level property condition of
//!   the active configuration (see [`crate::codec::ConditionCodec`]).
//!
//! Both names can be overridden per binder; an empty override falls back to
//! the default.
//!
//! ## Location → Filter
//!
//! [`GenericFilterBinder::apply_query_parameters`]:
//!
//! 1. If the configuration key names a known configuration, that configuration
//!    is the target and condition tokens (if any) are reconciled into it.
//! 2. Otherwise, if condition tokens are present, the target is the current
//!    configuration when it is run-time, else the empty configuration. Every
//!    permitted condition is appended to it, marked modified, without looking
//!    for an existing condition on the same property. Restore the initial state
//!    ([`crate::facet::UrlQueryParametersFacet::restore_initial_state`]) before
//!    applying a new location to keep appended conditions from piling up.
//! 3. The target becomes current, firing one configuration-changed event.
//!
//! A blank or unknown configuration id is logged and treated as absent.
//!
//! ## Filter → Location
//!
//! UI edits bump the filter revision. [`GenericFilterBinder::collect_changes`]
//! is called once per response flush: if anything changed since the last flush
//! it serializes the final state, drops the emission if it equals what the
//! location already holds, and otherwise notifies listeners once.

use crate::codec::{CodecContext, ConditionCodec, ParamCodec};
use crate::config::{non_empty_or, BinderConfig, DEFAULT_CONDITION_PARAM, DEFAULT_CONFIGURATION_PARAM};
use crate::error::Result;
use crate::facet::{HasInitialState, UrlQueryParametersBinder};
use crate::filter::GenericFilter;
use crate::memento::InitialStateMemento;
use crate::metadata::{AccessControl, EntityMetadata};
use crate::notify::{ChangeTracker, Listeners, Subscription, SyncDirection};
use crate::params::QueryParameters;
use crate::reconcile::ReconcileReport;
use crate::registry::{ConfigurationKey, ConfigurationRegistry};
use serde::Serialize;
use std::any::Any;
use tracing::{debug, info, warn};

/// Fired when the binder wants the location to change.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParametersChanged {
    pub binder: Option<String>,
    pub parameters: QueryParameters,
}

/// Outcome of applying location parameters to the filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    /// A configuration was (re-)activated.
    pub applied: bool,
    /// Id of the configuration that is current afterwards; `None` for the
    /// empty configuration.
    pub configuration: Option<String>,
    pub report: ReconcileReport,
    /// Condition tokens that could not be decoded.
    pub undecodable: Vec<String>,
}

pub struct GenericFilterBinder {
    id: Option<String>,
    filter: GenericFilter,
    metadata: Box<dyn EntityMetadata>,
    access: Box<dyn AccessControl>,
    configuration_param: Option<String>,
    condition_param: Option<String>,
    tracker: ChangeTracker,
    memento: InitialStateMemento,
    parameters_changed: Listeners<QueryParametersChanged>,
}

impl GenericFilterBinder {
    pub fn new(
        filter: GenericFilter,
        metadata: impl EntityMetadata + 'static,
        access: impl AccessControl + 'static,
    ) -> Self {
        let mut tracker = ChangeTracker::new(DEFAULT_CONFIGURATION_PARAM, DEFAULT_CONDITION_PARAM);
        tracker.baseline(filter.revision());
        Self {
            id: None,
            filter,
            metadata: Box::new(metadata),
            access: Box::new(access),
            configuration_param: None,
            condition_param: None,
            tracker,
            memento: InitialStateMemento::new(),
            parameters_changed: Listeners::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Use the parameter names from `config`.
    pub fn with_config(mut self, config: &BinderConfig) -> Self {
        self.set_configuration_param(Some(config.configuration_param.clone()));
        self.set_condition_param(Some(config.condition_param.clone()));
        self
    }

    pub fn filter(&self) -> &GenericFilter {
        &self.filter
    }

    /// Mutable access for UI-side edits.
    pub fn filter_mut(&mut self) -> &mut GenericFilter {
        &mut self.filter
    }

    pub fn configuration_param(&self) -> &str {
        non_empty_or(
            self.configuration_param.as_deref().unwrap_or_default(),
            DEFAULT_CONFIGURATION_PARAM,
        )
    }

    pub fn set_configuration_param(&mut self, name: Option<String>) {
        self.configuration_param = name;
        self.refresh_keys();
    }

    pub fn condition_param(&self) -> &str {
        non_empty_or(
            self.condition_param.as_deref().unwrap_or_default(),
            DEFAULT_CONDITION_PARAM,
        )
    }

    pub fn set_condition_param(&mut self, name: Option<String>) {
        self.condition_param = name;
        self.refresh_keys();
    }

    fn refresh_keys(&mut self) {
        let keys = (
            self.configuration_param().to_string(),
            self.condition_param().to_string(),
        );
        self.tracker.set_keys(keys.0, keys.1);
    }

    pub fn codec_context(&self) -> CodecContext<'_> {
        CodecContext::new(self.filter.entity(), self.metadata.as_ref())
    }

    /// Current filter state as query parameters for both keys.
    pub fn serialize_query_parameters(&self) -> QueryParameters {
        let current = self.filter.current_configuration();

        let configuration = match current.id.as_deref() {
            Some(id) => match ParamCodec::serialize_identifier(id) {
                Ok(value) => vec![value],
                Err(e) => {
                    warn!("Cannot serialize configuration id: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let ctx = self.codec_context();
        let conditions = current
            .property_conditions()
            .map(|c| ConditionCodec::encode_lenient(c, &ctx))
            .collect();

        QueryParameters::new()
            .with(self.configuration_param(), configuration)
            .with(self.condition_param(), conditions)
    }

    /// Apply location parameters to the filter.
    pub fn apply_query_parameters(&mut self, params: &QueryParameters) -> Result<StateUpdate> {
        self.tracker.begin(SyncDirection::FromLocation)?;
        let result = self.apply_location(params);
        self.tracker.end();
        result
    }

    fn apply_location(&mut self, params: &QueryParameters) -> Result<StateUpdate> {
        let mut update = StateUpdate::default();
        let tokens = params.get(self.condition_param());
        let named = params
            .first(self.configuration_param())
            .and_then(|raw| self.resolve_configuration(raw));

        let target = match (named, tokens) {
            (Some(key), _) => key,
            (None, Some(_)) => {
                if self.filter.current_configuration().kind.is_mutable() {
                    self.filter.current_key()
                } else {
                    ConfigurationRegistry::EMPTY
                }
            }
            (None, None) => {
                self.tracker.acknowledge(params);
                return Ok(update);
            }
        };

        if let Some(tokens) = tokens {
            let batch = ConditionCodec::decode_batch(tokens, &self.codec_context());
            update.undecodable = batch.dropped.into_iter().map(|(token, _)| token).collect();
            let (metadata, access) = (self.metadata.as_ref(), self.access.as_ref());
            update.report = match named {
                Some(_) => self
                    .filter
                    .reconcile(target, batch.conditions, metadata, access)?,
                None => self
                    .filter
                    .append_conditions(target, batch.conditions, metadata, access)?,
            };
        }

        self.filter.set_current_configuration(target)?;
        update.applied = true;
        update.configuration = self.filter.current_configuration().id.clone();

        self.tracker.observe(self.filter.revision());
        self.tracker.acknowledge(params);
        self.tracker.mark_pending();
        Ok(update)
    }

    fn resolve_configuration(&self, raw: &str) -> Option<ConfigurationKey> {
        let id = match ParamCodec::deserialize_identifier(raw) {
            Ok(id) => id,
            Err(e) => {
                info!("Ignoring configuration parameter: {}", e);
                return None;
            }
        };
        let key = self.filter.registry().resolve(&id);
        if key.is_none() {
            debug!(
                "Unknown configuration '{}' for {}, ignoring",
                id,
                self.filter.entity()
            );
        }
        key
    }

    /// Serialize pending UI changes, at most once per call. Listeners are
    /// notified with the emitted parameters.
    pub fn collect_changes(&mut self) -> Option<QueryParameters> {
        if let Err(e) = self.tracker.begin(SyncDirection::ToLocation) {
            debug!("Skipping change collection: {}", e);
            return None;
        }

        self.tracker.observe(self.filter.revision());
        let emission = if self.tracker.is_pending() {
            let current = self.serialize_query_parameters();
            self.tracker.take_emission(current)
        } else {
            None
        };
        self.tracker.end();

        if let Some(parameters) = &emission {
            self.parameters_changed.emit(&QueryParametersChanged {
                binder: self.id.clone(),
                parameters: parameters.clone(),
            });
        }
        emission
    }

    pub fn on_query_parameters_changed(
        &self,
        listener: impl FnMut(&QueryParametersChanged) + 'static,
    ) -> Subscription {
        self.parameters_changed.subscribe(listener)
    }
}

impl UrlQueryParametersBinder for GenericFilterBinder {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn update_state(&mut self, params: &QueryParameters) -> Result<()> {
        self.apply_query_parameters(params).map(|_| ())
    }

    fn collect_changes(&mut self) -> Option<QueryParameters> {
        GenericFilterBinder::collect_changes(self)
    }

    fn initial_state(&mut self) -> Option<&mut dyn HasInitialState> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl HasInitialState for GenericFilterBinder {
    fn save_initial_state(&mut self) {
        self.memento.save(&self.filter);
    }

    fn apply_initial_state(&mut self) -> Result<()> {
        self.memento.restore(&mut self.filter)
    }
}

impl std::fmt::Debug for GenericFilterBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericFilterBinder")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("configuration_param", &self.configuration_param())
            .field("condition_param", &self.condition_param())
            .finish()
    }
}
