use crate::api::{
    AppConfig,
    config::{ConfigOverrides, ENV_API_BASE_URL, ENV_DATA_DIR, ENV_REQUEST_TIMEOUT},
};
use clap::{Arg, ArgMatches, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_DATA_DIR: &str = "data-dir";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Backend base URL, example: https://api.eq.example")
                .env(ENV_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_DATA_DIR)
                .long(ARG_DATA_DIR)
                .help("Directory holding the remembered session (default: ~/.eq-portal)")
                .env(ENV_DATA_DIR)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request deadline in seconds (default: 10)")
                .env(ENV_REQUEST_TIMEOUT)
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Builds the client configuration from the environment and these arguments.
#[must_use]
pub fn config(matches: &ArgMatches) -> AppConfig {
    AppConfig::load_with(overrides(matches))
}

fn overrides(matches: &ArgMatches) -> ConfigOverrides {
    // Helper to filter empty strings which clap might pass through if env vars are set to ""
    let get_non_empty = |id: &str| {
        matches
            .get_one::<String>(id)
            .cloned()
            .filter(|v| !v.trim().is_empty())
    };

    ConfigOverrides {
        api_base_url: get_non_empty(ARG_API_URL),
        data_dir: get_non_empty(ARG_DATA_DIR),
        request_timeout_secs: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
    }
}
