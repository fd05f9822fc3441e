use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "urlfilter",
    bin_name = "urlfilter",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Sync generic filter state with URL query parameters", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Binder settings file (defaults to ./urlfilter.toml when present)
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Filter definition file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub definition: PathBuf,

    /// Configuration to activate before running (default: the definition's own)
    #[arg(short = 'c', long = "configuration", value_name = "ID")]
    pub configuration: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serialize the active configuration to query parameters
    Encode {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Apply a query string as a location change and show the resulting state
    Apply {
        #[command(flatten)]
        filter: FilterArgs,

        /// Query string of the new location, e.g. 'genericFilterCondition=property:name|eq|John'
        query: String,
    },

    /// Decode condition tokens
    Decode {
        #[command(flatten)]
        filter: FilterArgs,

        /// Tokens such as 'property:age|gt|30'
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Show the resolved binder settings
    Config,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_apply_with_global_flags() {
        let cli = Cli::try_parse_from([
            "urlfilter",
            "apply",
            "-d",
            "filter.toml",
            "--json",
            "genericFilterCondition=property:name|eq|x",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Apply { filter, query } => {
                assert_eq!(filter.definition, PathBuf::from("filter.toml"));
                assert_eq!(filter.configuration, None);
                assert!(query.starts_with("genericFilterCondition="));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn decode_requires_tokens() {
        assert!(Cli::try_parse_from(["urlfilter", "decode", "-d", "f.toml"]).is_err());
    }

    #[test]
    fn encode_accepts_configuration() {
        let cli =
            Cli::try_parse_from(["urlfilter", "encode", "-d", "f.toml", "-c", "vip"]).unwrap();
        match cli.command {
            Commands::Encode { filter } => assert_eq!(filter.configuration.as_deref(), Some("vip")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
