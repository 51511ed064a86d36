// src/config.rs
// =============================================================================
// Turns parsed CLI flags into a validated run configuration.
//
// Clap already checked types and mutually exclusive flags. What is left here
// is the checking clap cannot express:
// - the index and archive bases must be absolute http(s) URLs
// - date bounds must be 1 to 14 digits (the CDX server accepts prefixes)
// - the per-request timeout must be non-zero
//
// Anything rejected here is fatal: the run stops before touching the network.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cli::Cli;
use crate::fetch::{FetchSettings, RatePolicy};
use crate::index::IndexQuery;
use crate::output::OutputMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--url must not be empty")]
    EmptyUrl,

    #[error("--{flag} is not a valid URL ({value}): {source}")]
    InvalidBase {
        flag: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("--{flag} must use http or https, got {value}")]
    UnsupportedScheme { flag: &'static str, value: String },

    #[error("--{flag} must be 1 to 14 digits (yyyyMMddhhmmss), got {value:?}")]
    InvalidTimestamp { flag: &'static str, value: String },

    #[error("--timeout must be at least one second")]
    ZeroTimeout,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub query: IndexQuery,
    pub index_base: String,
    pub archive_base: String,
    pub mode: OutputMode,
    pub rate: RatePolicy,
    pub fetch: FetchSettings,
    pub failure_log: Option<PathBuf>,
    pub estimate_time: bool,
}

impl TryFrom<Cli> for SweepConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        validate_base("index-base", &cli.index_base)?;
        validate_base("archive-base", &cli.archive_base)?;
        let from = validate_timestamp("from", cli.from)?;
        let to = validate_timestamp("to", cli.to)?;
        if cli.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let mode = if cli.print_urls {
            OutputMode::UrlList
        } else if cli.unique {
            OutputMode::Unique
        } else if let Some(dir) = cli.output {
            OutputMode::Archive(dir)
        } else {
            OutputMode::Raw
        };

        Ok(SweepConfig {
            query: IndexQuery {
                from,
                to,
                limit: cli.limit,
                filters: cli.filter,
                collapse: cli.collapse,
                ..IndexQuery::new(cli.url)
            },
            index_base: cli.index_base,
            archive_base: cli.archive_base,
            mode,
            rate: RatePolicy::new(cli.rate, Duration::from_secs(cli.interval)),
            fetch: FetchSettings {
                request_timeout: Duration::from_secs(cli.timeout),
                ..FetchSettings::default()
            },
            failure_log: cli.failures,
            estimate_time: cli.time,
        })
    }
}

fn validate_base(flag: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|source| ConfigError::InvalidBase {
        flag,
        value: value.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::UnsupportedScheme {
            flag,
            value: value.to_string(),
        }),
    }
}

// Empty values are treated as "not given", like the CDX server does
fn validate_timestamp(
    flag: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ConfigError> {
    match value {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v.len() <= 14 && v.bytes().all(|b| b.is_ascii_digit()) => Ok(Some(v)),
        Some(v) => Err(ConfigError::InvalidTimestamp { flag, value: v }),
        None => Ok(None),
    }
}
