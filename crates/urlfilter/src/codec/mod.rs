//! # URL Codecs
//!
//! Two stateless layers turn filter state into flat URL parameter values and back:
//!
//! - [`ParamCodec`] handles single typed values and configuration ids.
//! - [`ConditionCodec`] handles whole property conditions, one token each:
//!
//! ```text
//! property:<property>|<operation>|<value>
//! ```
//!
//! Every segment is escaped (see [`escape`]) so a literal `|` never splits a
//! segment. An empty value segment means "no value set".
//!
//! Decoding is forgiving: a bad value degrades to an absent value, and a bad
//! token is dropped from its batch without affecting its siblings.

pub mod condition;
pub mod escape;
pub mod param;
pub mod value;

pub use condition::{CodecContext, ConditionCodec, DecodedBatch};
pub use param::ParamCodec;
pub use value::{DateInterval, ParamValue, ValueType};
