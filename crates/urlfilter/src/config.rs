//! # Configuration
//!
//! Binder settings are loaded with [`confique`] from, in priority order:
//!
//! 1. **Environment variables**: `URLFILTER_CONFIGURATION_PARAM`,
//!    `URLFILTER_CONDITION_PARAM`.
//! 2. **TOML file**: passed explicitly; a missing file is skipped.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `configuration_param` | `genericFilterConfiguration` | URL key carrying the configuration id |
//! | `condition_param` | `genericFilterCondition` | URL key carrying condition tokens |
//!
//! An empty value means "use the default".

use crate::error::Result;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIGURATION_PARAM: &str = "genericFilterConfiguration";
pub const DEFAULT_CONDITION_PARAM: &str = "genericFilterCondition";

/// Settings of a filter binder, stored in `urlfilter.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// Query parameter that names the active configuration.
    #[config(default = "genericFilterConfiguration", env = "URLFILTER_CONFIGURATION_PARAM")]
    pub configuration_param: String,

    /// Query parameter that carries condition tokens.
    #[config(default = "genericFilterCondition", env = "URLFILTER_CONDITION_PARAM")]
    pub condition_param: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            configuration_param: DEFAULT_CONFIGURATION_PARAM.to_string(),
            condition_param: DEFAULT_CONDITION_PARAM.to_string(),
        }
    }
}

impl BinderConfig {
    /// Load from the environment and an optional TOML file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    pub fn configuration_param(&self) -> &str {
        non_empty_or(&self.configuration_param, DEFAULT_CONFIGURATION_PARAM)
    }

    pub fn condition_param(&self) -> &str {
        non_empty_or(&self.condition_param, DEFAULT_CONDITION_PARAM)
    }
}

pub(crate) fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}
