use clap::{Arg, ArgAction, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_CAPTCHA: &str = "captcha";

pub const ARG_IDENTIFIER: &str = "identifier";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_REMEMBER_ME: &str = "remember-me";
pub const ARG_CAPTCHA_OUT: &str = "captcha-out";
pub const ARG_OUT: &str = "out";

pub const ENV_IDENTIFIER: &str = "EQ_IDENTIFIER";
pub const ENV_PASSWORD: &str = "EQ_PASSWORD";

pub const DEFAULT_CAPTCHA_FILE: &str = "captcha.svg";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(login())
        .subcommand(Command::new(CMD_LOGOUT).about("Forget the stored session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in user"))
        .subcommand(
            Command::new(CMD_CAPTCHA)
                .about("Render a CAPTCHA challenge to an SVG file")
                .arg(
                    Arg::new(ARG_OUT)
                        .short('o')
                        .long(ARG_OUT)
                        .help("Output file")
                        .default_value(DEFAULT_CAPTCHA_FILE),
                ),
        )
}

fn login() -> Command {
    Command::new(CMD_LOGIN)
        .about("Sign in with email or username, CAPTCHA and optional 2FA")
        .arg(
            Arg::new(ARG_IDENTIFIER)
                .short('i')
                .long(ARG_IDENTIFIER)
                .help("Email address or username")
                .env(ENV_IDENTIFIER)
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long(ARG_PASSWORD)
                .help("Password; prompted for when not set")
                .env(ENV_PASSWORD)
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_REMEMBER_ME)
                .short('r')
                .long(ARG_REMEMBER_ME)
                .help("Keep the session after this process exits")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_CAPTCHA_OUT)
                .long(ARG_CAPTCHA_OUT)
                .help("Where to write the CAPTCHA image (default: <data-dir>/captcha.svg)"),
        )
}
