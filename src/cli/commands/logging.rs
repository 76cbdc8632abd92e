//! `-v` / `EQ_LOG_LEVEL` handling. The value picks how much of the client's
//! tracing output reaches stderr. Credentials and tokens are never logged at
//! any level.

use clap::{Arg, ArgMatches, Command, builder::ValueParser};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ENV_LOG_LEVEL: &str = "EQ_LOG_LEVEL";

/// Level names in verbosity order; the index is the `-v` count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a count (`0`-`4`) or a level name, case-insensitive.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|raw: &str| -> Result<u8, String> {
        let level = raw.trim().to_ascii_lowercase();
        if let Ok(count) = level.parse::<u8>() {
            if usize::from(count) < LEVEL_NAMES.len() {
                return Ok(count);
            }
        }

        let level = if level == "warning" { "warn" } else { level.as_str() };
        LEVEL_NAMES
            .iter()
            .position(|name| *name == level)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| {
                format!(
                    "invalid log level {raw:?}, expected 0-4 or one of: {}",
                    LEVEL_NAMES.join(", ")
                )
            })
    })
}

/// Tracing level for a verbosity count. `0` keeps the subscriber default.
#[must_use]
pub const fn level_for(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Reads the verbosity from `matches`. Global args land in the subcommand
/// matches, so the active subcommand is checked first.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> Option<Level> {
    let scoped = matches.subcommand().map_or(matches, |(_, sub)| sub);
    level_for(scoped.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
