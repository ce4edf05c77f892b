//! Command-line interface handling for the CodeClash client.
//!
//! Flags override the matching settings of the configuration file.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "codeclash.toml";

/// Command line arguments parsed from user input.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the battle server URL
    pub url: Option<String>,
    /// Bearer token; stored for later runs once accepted
    pub token: Option<String>,
    /// Optional override for the matchmaking mode
    pub mode: Option<String>,
    /// Optional override for the persisted state directory
    pub storage_dir: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Rejoin the persisted match instead of discarding it
    pub resume: bool,
}

impl CliArgs {
    pub fn command() -> Command {
        Command::new("CodeClash")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Headless 1v1 battle client for CodeClash")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value(DEFAULT_CONFIG_PATH),
            )
            .arg(
                Arg::new("url")
                    .short('u')
                    .long("url")
                    .value_name("URL")
                    .help("Battle server socket URL (e.g., ws://localhost:5000/battle)"),
            )
            .arg(
                Arg::new("token")
                    .short('t')
                    .long("token")
                    .value_name("TOKEN")
                    .env("CODECLASH_TOKEN")
                    .help("Bearer token issued at login"),
            )
            .arg(
                Arg::new("mode")
                    .short('m')
                    .long("mode")
                    .value_name("MODE")
                    .help("Matchmaking mode (e.g., STANDARD)"),
            )
            .arg(
                Arg::new("storage-dir")
                    .short('s')
                    .long("storage-dir")
                    .value_name("DIR")
                    .help("Directory holding the persisted client state"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("resume")
                    .long("resume")
                    .help("Rejoin the persisted match instead of searching for a new one")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            url: matches.get_one::<String>("url").cloned(),
            token: matches.get_one::<String>("token").cloned(),
            mode: matches.get_one::<String>("mode").cloned(),
            storage_dir: matches.get_one::<String>("storage-dir").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            resume: matches.get_flag("resume"),
        }
    }
}
