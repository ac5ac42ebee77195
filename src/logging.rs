// File: ./src/logging.rs
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

/// Overrides the `-v` level when set, e.g. `CAKE_LOG=debug`.
pub const LOG_ENV: &str = "CAKE_LOG";

/// Maps CLI verbosity to a level.
///
/// - 0 (none) -> warn
/// - 1 (-v)   -> info
/// - 2 (-vv)  -> debug
/// - 3+ (-vvv)-> trace
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs a stderr logger for this crate's targets.
/// Calling it twice keeps the first logger.
pub fn init(verbosity: u8) {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| level_for(verbosity));

    let config = ConfigBuilder::new().add_filter_allow_str("cake").build();

    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
