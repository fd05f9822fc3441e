//! # urlfilter Architecture
//!
//! urlfilter keeps the state of a **generic filter** (saved configurations of
//! property conditions) in sync with a view's **URL query parameters**, in both
//! directions. It is a UI-agnostic library: the host framework plugs in through
//! small traits and drives the two sync directions explicitly.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Facet (facet.rs)                                           │
//! │  - One per view; hosts binders, talks to the Router port    │
//! │  - Merges binder emissions into a single location update    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Binder (binder.rs)                                         │
//! │  - Location → filter: decode, reconcile, activate           │
//! │  - Filter → location: coalesce edits, serialize, dedupe     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core (codec/, reconcile.rs, registry.rs, filter.rs)        │
//! │  - Pure logic over Rust types                               │
//! │  - Entity model and permissions via metadata/ ports         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! A condition travels as one token:
//!
//! ```text
//! property:<path>|<operation>|<value>
//! ```
//!
//! `|` inside any segment is written as `%7C` and `%` as `%25`, so decoding is
//! exact. The value is formatted according to the property's datatype (see
//! [`codec::ParamCodec`]). An empty value segment means "no value".
//!
//! ## Key Principle: No I/O Assumptions
//!
//! Nothing in this crate writes to stdout, reads the environment (apart from
//! [`config::BinderConfig::load`]) or assumes a particular UI toolkit. Failures
//! that only affect one token are logged through `tracing` and skipped; every
//! other failure is returned as a [`error::FilterError`].
//!
//! ## Module Overview
//!
//! - [`binder`]: `GenericFilterBinder`, the two-way sync for one filter
//! - [`facet`]: `UrlQueryParametersFacet` and the `Router` port
//! - [`filter`]: `GenericFilter`, the state the UI edits
//! - [`codec`]: value and condition token codecs
//! - [`reconcile`]: merging URL conditions into a configuration
//! - [`registry`]: known configurations and the active one
//! - [`memento`]: initial-state snapshot
//! - [`notify`]: listeners and the change tracker
//! - [`metadata`]: entity model and access control ports
//! - [`model`]: configurations and conditions
//! - [`params`]: query parameter maps
//! - [`config`]: binder settings
//! - [`error`]: error types

pub mod binder;
pub mod codec;
pub mod config;
pub mod error;
pub mod facet;
pub mod filter;
pub mod memento;
pub mod metadata;
pub mod model;
pub mod notify;
pub mod params;
pub mod reconcile;
pub mod registry;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use binder::{GenericFilterBinder, QueryParametersChanged, StateUpdate};
pub use error::{FilterError, Result};
pub use facet::{HasInitialState, Router, UrlQueryParametersBinder, UrlQueryParametersFacet};
pub use filter::GenericFilter;
pub use params::QueryParameters;
