//! # urlfilter CLI
//!
//! A thin command-line client over the `urlfilter` library. It loads a filter
//! definition (entity schema, hidden properties, saved configurations) from a
//! TOML file, builds a binder for it and runs one sync step:
//!
//! - `encode`: serialize a configuration to query parameters
//! - `apply`: apply a query string as a location change and show the result
//! - `decode`: decode individual condition tokens
//! - `config`: print the resolved binder settings
//!
//! All terminal concerns (argument parsing, logging setup, styling, exit codes)
//! live under `src/cli/`; this file only calls `cli::run()`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
