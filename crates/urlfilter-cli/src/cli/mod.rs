//! # CLI Behavior
//!
//! The CLI is one client of the library. It is the only place that knows about
//! stdout, stderr and exit codes.
//!
//! Every command takes `--definition <FILE>` (except `config`) and prints either
//! styled text or, with `--json`, a single JSON document on stdout. Logs go to
//! stderr; `-v` raises the level to `debug`, `RUST_LOG` overrides both.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: dispatch and per-command handlers
//! - `definition`: filter definition files
//! - `render`: text output
//! - `styles`: terminal styles

mod commands;
mod definition;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
