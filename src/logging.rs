//! Logger initialization.
//!
//! Diagnostics always go to stderr. Stdout carries nothing but snapshot
//! bodies or URLs, so the tool can be piped into grep or another scanner.

use log::LevelFilter;
use simplelog::{ColorChoice, Config, ConfigBuilder, TermLogger, TerminalMode};

/// Installs the global stderr logger at the given level.
///
/// Safe to call more than once; later calls are ignored.
pub fn initialize(level: LevelFilter) {
    let _ = TermLogger::init(level, build_config(), TerminalMode::Stderr, ColorChoice::Auto);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        // reqwest/hyper internals are noise at -vvv
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_twice_is_harmless() {
        initialize(LevelFilter::Debug);
        initialize(LevelFilter::Info);
        log::debug!("logger initialized for tests");
    }
}
