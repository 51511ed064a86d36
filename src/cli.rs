// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags mirror the CDX server's query parameters (url, from, to, limit,
// filter, collapse) plus the knobs for output mode and rate limiting.
//
// Output modes are mutually exclusive. With none of them set, every
// successful response body is streamed to stdout.
//
// The rate limit flags can also come from the environment, which is handy
// when the archive tightens its limits and you don't want to edit scripts.
// =============================================================================

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::fetch::{DEFAULT_INTERVAL, DEFAULT_MAX_REQUESTS};

pub const DEFAULT_INDEX_BASE: &str = "https://web.archive.org/cdx/search/cdx";
pub const DEFAULT_ARCHIVE_BASE: &str = "https://web.archive.org";

#[derive(Parser, Debug)]
#[command(
    name = "wayback-sweep",
    version,
    about = "Fetch every archived snapshot of a URL from the Wayback Machine",
    long_about = "wayback-sweep lists every snapshot of a URL pattern in the Wayback Machine's \
                  CDX index, fetches each stored response, and prints them, prints only the \
                  unique ones, or saves the unique ones as files named by their SHA-1."
)]
pub struct Cli {
    /// URL pattern to collect responses for (e.g. example.com/robots.txt)
    #[arg(long)]
    pub url: String,

    /// First capture date to include, yyyyMMddhhmmss (prefixes allowed)
    #[arg(long)]
    pub from: Option<String>,

    /// Last capture date to include, yyyyMMddhhmmss (prefixes allowed)
    #[arg(long)]
    pub to: Option<String>,

    /// Maximum number of snapshots to list (0 = no limit, -N = the last N)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub limit: i64,

    /// CDX filter, e.g. "statuscode:200" or "!mimetype:text/html" (repeatable)
    #[arg(long)]
    pub filter: Vec<String>,

    /// CDX collapse field, e.g. "digest" to skip adjacent identical captures
    #[arg(long)]
    pub collapse: Option<String>,

    /// Print (to stderr) how long dispatching all requests will take
    #[arg(long)]
    pub time: bool,

    /// Only print the snapshot URLs, without fetching them
    #[arg(long, conflicts_with_all = ["unique", "output"])]
    pub print_urls: bool,

    /// Only print responses whose content was not seen before
    #[arg(long, conflicts_with = "output")]
    pub unique: bool,

    /// Save every unique response into this directory, one file per SHA-1
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Requests dispatched per interval
    #[arg(long, env = "WAYBACK_SWEEP_RATE", default_value_t = NonZeroUsize::new(DEFAULT_MAX_REQUESTS).unwrap_or(NonZeroUsize::MIN))]
    pub rate: NonZeroUsize,

    /// Interval length in seconds
    #[arg(long, env = "WAYBACK_SWEEP_INTERVAL", default_value_t = DEFAULT_INTERVAL.as_secs())]
    pub interval: u64,

    /// Per-snapshot request timeout in seconds
    #[arg(long, env = "WAYBACK_SWEEP_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Append failed fetches to this file as JSON lines
    #[arg(long, value_name = "FILE")]
    pub failures: Option<PathBuf>,

    /// CDX index endpoint
    #[arg(long, default_value = DEFAULT_INDEX_BASE)]
    pub index_base: String,

    /// Archive endpoint that serves snapshots under /web/
    #[arg(long, default_value = DEFAULT_ARCHIVE_BASE)]
    pub archive_base: String,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors on stderr
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by -v / -q. Warnings are on by default so failed
    /// fetches are visible without any flag.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. conflicts_with / conflicts_with_all
//    - clap refuses to parse when two conflicting flags are both present
//    - This is how the output modes stay mutually exclusive
//
// 2. env = "..."
//    - If the flag is absent, clap reads the environment variable instead
//    - Needs the 'env' feature of clap (see Cargo.toml)
//
// 3. ArgAction::Count
//    - Counts how many times a flag appears: -vvv gives 3
//
// 4. NonZeroUsize
//    - An integer type that cannot be zero
//    - clap parses it through FromStr, so "--rate 0" is rejected for us
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("wayback-sweep").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--url", "example.com"]).unwrap();
        assert_eq!(cli.rate.get(), 28);
        assert_eq!(cli.interval, 4);
        assert_eq!(cli.limit, 0);
        assert!(cli.filter.is_empty());
        assert_eq!(cli.index_base, DEFAULT_INDEX_BASE);
        assert_eq!(cli.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_url_is_required() {
        assert!(parse(&["--unique"]).is_err());
    }

    #[test]
    fn test_output_modes_are_exclusive() {
        assert!(parse(&["--url", "a.com", "--print-urls", "--unique"]).is_err());
        assert!(parse(&["--url", "a.com", "--print-urls", "--output", "out"]).is_err());
        assert!(parse(&["--url", "a.com", "--unique", "--output", "out"]).is_err());
        assert!(parse(&["--url", "a.com", "--unique"]).is_ok());
    }

    #[test]
    fn test_negative_limit_is_accepted() {
        let cli = parse(&["--url", "a.com", "--limit", "-5"]).unwrap();
        assert_eq!(cli.limit, -5);
        assert_eq!(parse(&["--url", "a.com", "--limit=-1"]).unwrap().limit, -1);
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert!(parse(&["--url", "a.com", "--rate", "0"]).is_err());
    }

    #[test]
    fn test_repeatable_filter() {
        let cli = parse(&[
            "--url",
            "a.com",
            "--filter",
            "statuscode:200",
            "--filter",
            "!mimetype:image.*",
        ])
        .unwrap();
        assert_eq!(cli.filter, vec!["statuscode:200", "!mimetype:image.*"]);
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["--url", "a", "-vv"]).unwrap().log_level(), LevelFilter::Debug);
        assert_eq!(parse(&["--url", "a", "-q"]).unwrap().log_level(), LevelFilter::Error);
        assert!(parse(&["--url", "a", "-q", "-v"]).is_err());
    }
}
