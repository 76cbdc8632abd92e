use super::auth::{ARG_PASSWORD, ENV_PASSWORD};
use clap::{Arg, Command};

pub const CMD_REGISTER: &str = "register";
pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

pub const ARG_EMAIL: &str = "email";
pub const ARG_NAME: &str = "name";
pub const ARG_PASSWORD_CONFIRM: &str = "password-confirm";
pub const ARG_TOKEN: &str = "token";

pub const ENV_RESET_TOKEN: &str = "EQ_RESET_TOKEN";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account")
                .arg(email_arg())
                .arg(
                    Arg::new(ARG_NAME)
                        .long(ARG_NAME)
                        .help("Display name")
                        .required(true),
                )
                .arg(password_arg())
                .arg(password_confirm_arg()),
        )
        .subcommand(
            Command::new(CMD_FORGOT_PASSWORD)
                .about("Request a password reset link")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Set a new password with a reset token")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .long(ARG_TOKEN)
                        .help("Token from the reset link")
                        .env(ENV_RESET_TOKEN)
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(password_arg())
                .arg(password_confirm_arg()),
        )
}

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Email address")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("New password; prompted for when not set")
        .env(ENV_PASSWORD)
        .hide_env_values(true)
}

fn password_confirm_arg() -> Arg {
    Arg::new(ARG_PASSWORD_CONFIRM)
        .long(ARG_PASSWORD_CONFIRM)
        .help("Password confirmation; prompted for when not set")
}
