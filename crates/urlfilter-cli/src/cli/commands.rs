//! # CLI Layer
//!
//! The only place in the workspace that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs the tracing subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! Handlers return plain outcome structs; `run` decides whether they are
//! printed as JSON or rendered as text.

use super::definition::FilterDefinition;
use super::render;
use super::setup::{parse_cli, Cli, Commands, FilterArgs};
use serde::Serialize;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use urlfilter::codec::ConditionCodec;
use urlfilter::config::BinderConfig;
use urlfilter::error::{FilterError, Result};
use urlfilter::model::{Configuration, PropertyCondition};
use urlfilter::{GenericFilterBinder, QueryParameters, Router, StateUpdate, UrlQueryParametersFacet};

const DEFAULT_CONFIG_FILE: &str = "urlfilter.toml";
const BINDER_ID: &str = "filter";

#[derive(Debug, Serialize)]
pub struct EncodeOutcome {
    pub configuration: Option<String>,
    pub parameters: QueryParameters,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyOutcome {
    pub update: StateUpdate,
    pub configuration: Configuration,
    /// Location after the binder's echo was merged in; `None` if the binder
    /// had nothing to write.
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DroppedToken {
    pub token: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct DecodeOutcome {
    pub conditions: Vec<PropertyCondition>,
    pub dropped: Vec<DroppedToken>,
}

/// Location of a single simulated view.
struct LocationRouter {
    location: QueryParameters,
}

impl Router for LocationRouter {
    fn location(&self) -> QueryParameters {
        self.location.clone()
    }

    fn set_query_parameters(&mut self, params: QueryParameters) {
        self.location = params;
    }
}

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE).to_path_buf());
    let config = BinderConfig::load(Some(config_path.as_path()))?;
    debug!(
        "Using parameters {} / {}",
        config.configuration_param(),
        config.condition_param()
    );

    let output = dispatch(&cli, &config)?;
    print!("{}", output);
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_target(false)
        .with_file(true)
        .try_init();
}

fn dispatch(cli: &Cli, config: &BinderConfig) -> Result<String> {
    match &cli.command {
        Commands::Encode { filter } => {
            let outcome = handle_encode(filter, config)?;
            output(cli.json, &outcome, render::render_encode)
        }
        Commands::Apply { filter, query } => {
            let outcome = handle_apply(filter, config, query)?;
            output(cli.json, &outcome, render::render_apply)
        }
        Commands::Decode { filter, tokens } => {
            let outcome = handle_decode(filter, config, tokens)?;
            output(cli.json, &outcome, render::render_decode)
        }
        Commands::Config => {
            if cli.json {
                to_json(config)
            } else {
                toml::to_string(config).map_err(|e| FilterError::Config(e.to_string()))
            }
        }
    }
}

fn output<T: Serialize>(json: bool, outcome: &T, text: fn(&T) -> String) -> Result<String> {
    if json {
        to_json(outcome)
    } else {
        Ok(text(outcome))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    Ok(format!("{}\n", json))
}

fn load_binder(args: &FilterArgs, config: &BinderConfig) -> Result<GenericFilterBinder> {
    let definition = FilterDefinition::load(&args.definition)?;
    Ok(definition
        .binder(config, args.configuration.as_deref())?
        .with_id(BINDER_ID))
}

pub fn handle_encode(args: &FilterArgs, config: &BinderConfig) -> Result<EncodeOutcome> {
    let binder = load_binder(args, config)?;
    let parameters = binder.serialize_query_parameters();
    Ok(EncodeOutcome {
        configuration: binder.filter().current_configuration().id.clone(),
        query: parameters.to_query_string(),
        parameters,
    })
}

pub fn handle_apply(args: &FilterArgs, config: &BinderConfig, query: &str) -> Result<ApplyOutcome> {
    let location = QueryParameters::parse(query)?;
    let mut binder = load_binder(args, config)?;
    let update = binder.apply_query_parameters(&location)?;

    let mut facet = UrlQueryParametersFacet::new(LocationRouter { location });
    facet.register_binder(binder);
    let written = facet.before_client_response();

    let configuration = facet
        .binder_as::<GenericFilterBinder>(BINDER_ID)
        .map(|b| b.filter().current_configuration().clone())
        .ok_or_else(|| FilterError::IllegalState("binder not registered".to_string()))?;

    Ok(ApplyOutcome {
        update,
        configuration,
        location: written.map(|params| params.to_query_string()),
    })
}

pub fn handle_decode(
    args: &FilterArgs,
    config: &BinderConfig,
    tokens: &[String],
) -> Result<DecodeOutcome> {
    let binder = load_binder(args, config)?;
    let batch = ConditionCodec::decode_batch(tokens, &binder.codec_context());
    Ok(DecodeOutcome {
        conditions: batch.conditions,
        dropped: batch
            .dropped
            .into_iter()
            .map(|(token, e)| DroppedToken {
                token,
                reason: e.to_string(),
            })
            .collect(),
    })
}
