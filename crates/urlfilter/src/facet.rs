//! # URL Query Parameters Facet
//!
//! Connects any number of binders to one view's location.
//!
//! - Location changes are forwarded to every binder, in registration order.
//! - Once per response, [`UrlQueryParametersFacet::before_client_response`]
//!   collects binder emissions, overlays them on the current location and
//!   hands the merged result to the [`Router`] in a single call.
//! - Binders that implement [`HasInitialState`] snapshot their state when the
//!   facet is attached and can be restored later.
//!
//! A facet attached to a dialog has no location of its own and does nothing.

use crate::error::Result;
use crate::params::QueryParameters;
use std::any::Any;
use tracing::debug;

/// Location side of the host view.
pub trait Router {
    /// Query parameters of the current location.
    fn location(&self) -> QueryParameters;

    /// Replace the location's query parameters.
    fn set_query_parameters(&mut self, params: QueryParameters);
}

/// Component state that can be captured at bind time and restored later.
pub trait HasInitialState {
    fn save_initial_state(&mut self);

    fn apply_initial_state(&mut self) -> Result<()>;
}

/// A component kept in sync with URL query parameters.
pub trait UrlQueryParametersBinder {
    fn id(&self) -> Option<&str>;

    /// Apply location parameters to the component.
    fn update_state(&mut self, params: &QueryParameters) -> Result<()>;

    /// Parameters the component wants written to the location, if any.
    fn collect_changes(&mut self) -> Option<QueryParameters>;

    fn initial_state(&mut self) -> Option<&mut dyn HasInitialState> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct UrlQueryParametersFacet<R: Router> {
    router: R,
    binders: Vec<Box<dyn UrlQueryParametersBinder>>,
    attached_to_dialog: bool,
    initial_state_saved: bool,
}

impl<R: Router> UrlQueryParametersFacet<R> {
    pub fn new(router: R) -> Self {
        Self {
            router,
            binders: Vec::new(),
            attached_to_dialog: false,
            initial_state_saved: false,
        }
    }

    pub fn register_binder(&mut self, binder: impl UrlQueryParametersBinder + 'static) {
        self.binders.push(Box::new(binder));
    }

    pub fn binders(&self) -> impl Iterator<Item = &dyn UrlQueryParametersBinder> {
        self.binders.iter().map(|b| b.as_ref())
    }

    /// Look up a binder by id.
    pub fn binder(&self, id: &str) -> Option<&dyn UrlQueryParametersBinder> {
        self.binders
            .iter()
            .find(|b| b.id() == Some(id))
            .map(|b| b.as_ref())
    }

    pub fn binder_mut(&mut self, id: &str) -> Option<&mut (dyn UrlQueryParametersBinder + 'static)> {
        self.binders
            .iter_mut()
            .find(|b| b.id() == Some(id))
            .map(|b| b.as_mut())
    }

    /// Look up a binder by id and concrete type.
    pub fn binder_as<B: 'static>(&self, id: &str) -> Option<&B> {
        self.binder(id)?.as_any().downcast_ref()
    }

    pub fn binder_as_mut<B: 'static>(&mut self, id: &str) -> Option<&mut B> {
        self.binder_mut(id)?.as_any_mut().downcast_mut()
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn is_attached_to_dialog(&self) -> bool {
        self.attached_to_dialog
    }

    pub fn set_attached_to_dialog(&mut self, attached: bool) {
        self.attached_to_dialog = attached;
    }

    /// Snapshot every binder's initial state. Later calls do nothing.
    pub fn attach(&mut self) {
        if self.initial_state_saved {
            return;
        }
        for binder in &mut self.binders {
            if let Some(state) = binder.initial_state() {
                state.save_initial_state();
            }
        }
        self.initial_state_saved = true;
    }

    /// Forward a location change to every binder.
    pub fn on_location_changed(&mut self, params: &QueryParameters) -> Result<()> {
        if self.attached_to_dialog {
            debug!("Facet attached to a dialog, ignoring location change");
            return Ok(());
        }
        for binder in &mut self.binders {
            binder.update_state(params)?;
        }
        Ok(())
    }

    /// Restore every binder that captured an initial state.
    pub fn restore_initial_state(&mut self) -> Result<()> {
        if self.attached_to_dialog {
            return Ok(());
        }
        for binder in &mut self.binders {
            if let Some(state) = binder.initial_state() {
                state.apply_initial_state()?;
            }
        }
        Ok(())
    }

    /// Flush binder changes to the router. Returns the parameters written, or
    /// `None` if no binder had anything to say.
    pub fn before_client_response(&mut self) -> Option<QueryParameters> {
        if self.attached_to_dialog {
            return None;
        }

        let mut update: Option<QueryParameters> = None;
        for binder in &mut self.binders {
            if let Some(changes) = binder.collect_changes() {
                update = Some(match update {
                    Some(acc) => acc.overlay(&changes),
                    None => changes,
                });
            }
        }

        let update = update?;
        let merged = self.router.location().merge(&update);
        debug!("Updating location query parameters: {}", merged.to_query_string());
        self.router.set_query_parameters(merged.clone());
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::test_utils::RecordingRouter;

    struct PageBinder {
        id: String,
        page: Option<String>,
        dirty: bool,
        saved: Option<Option<String>>,
    }

    impl PageBinder {
        fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                page: None,
                dirty: false,
                saved: None,
            }
        }
    }

    impl HasInitialState for PageBinder {
        fn save_initial_state(&mut self) {
            self.saved = Some(self.page.clone());
        }

        fn apply_initial_state(&mut self) -> Result<()> {
            let saved = self
                .saved
                .clone()
                .ok_or_else(|| FilterError::IllegalState("not saved".into()))?;
            self.page = saved;
            self.dirty = true;
            Ok(())
        }
    }

    impl UrlQueryParametersBinder for PageBinder {
        fn id(&self) -> Option<&str> {
            Some(&self.id)
        }

        fn update_state(&mut self, params: &QueryParameters) -> Result<()> {
            self.page = params.first(&self.id).map(str::to_string);
            Ok(())
        }

        fn collect_changes(&mut self) -> Option<QueryParameters> {
            if !std::mem::take(&mut self.dirty) {
                return None;
            }
            let values = self.page.iter().cloned().collect();
            Some(QueryParameters::new().with(self.id.clone(), values))
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

    fn facet() -> UrlQueryParametersFacet<RecordingRouter> {
        let mut facet = UrlQueryParametersFacet::new(RecordingRouter::default());
        facet.register_binder(PageBinder::new("a"));
        facet.register_binder(PageBinder::new("b"));
        facet
    }

    #[test]
    fn location_change_reaches_every_binder() {
        let mut facet = facet();
        let params = QueryParameters::new()
            .with("a", vec!["1".into()])
            .with("b", vec!["2".into()]);
        facet.on_location_changed(&params).unwrap();

        assert_eq!(facet.binder_as::<PageBinder>("a").unwrap().page.as_deref(), Some("1"));
        assert_eq!(facet.binder_as::<PageBinder>("b").unwrap().page.as_deref(), Some("2"));
    }

    #[test]
    fn changes_are_merged_into_one_router_call() {
        let mut facet = facet();
        facet.router_mut().location = QueryParameters::new()
            .with("other", vec!["x".into()])
            .with("b", vec!["old".into()]);

        for (id, page) in [("a", Some("1")), ("b", None)] {
            let binder = facet.binder_as_mut::<PageBinder>(id).unwrap();
            binder.page = page.map(str::to_string);
            binder.dirty = true;
        }

        let merged = facet.before_client_response().unwrap();
        assert_eq!(facet.router().writes.len(), 1);
        assert_eq!(merged.first("a"), Some("1"));
        assert_eq!(merged.first("other"), Some("x"));
        assert!(!merged.contains_key("b"));

        assert!(facet.before_client_response().is_none());
        assert_eq!(facet.router().writes.len(), 1);
    }

    #[test]
    fn dialog_facet_is_inert() {
        let mut facet = facet();
        facet.set_attached_to_dialog(true);
        assert!(facet.is_attached_to_dialog());
        facet.binder_as_mut::<PageBinder>("a").unwrap().dirty = true;

        facet
            .on_location_changed(&QueryParameters::new().with("a", vec!["9".into()]))
            .unwrap();
        assert!(facet.before_client_response().is_none());
        assert_eq!(facet.binder_as::<PageBinder>("a").unwrap().page, None);
        assert_eq!(facet.router().writes.len(), 0);
    }

    #[test]
    fn restore_applies_saved_state() {
        let mut facet = facet();
        facet.attach();
        facet
            .on_location_changed(&QueryParameters::new().with("a", vec!["5".into()]))
            .unwrap();

        facet.restore_initial_state().unwrap();
        assert_eq!(facet.binder_as::<PageBinder>("a").unwrap().page, None);
        let merged = facet.before_client_response().unwrap();
        assert!(!merged.contains_key("a"));
    }

    #[test]
    fn restore_without_attach_fails() {
        let mut facet = facet();
        assert!(matches!(
            facet.restore_initial_state(),
            Err(FilterError::IllegalState(_))
        ));
    }

    #[test]
    fn binder_lookup_by_id() {
        let facet = facet();
        assert!(facet.binder("a").is_some());
        assert!(facet.binder("zzz").is_none());
        assert!(facet.binder_as::<String>("a").is_none());
        assert_eq!(facet.binders().count(), 2);
    }
}
