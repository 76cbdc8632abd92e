//! Maps parsed CLI arguments to an [`Action`].

use crate::cli::{
    actions::{Action, account, captcha, login},
    commands::{self, account as account_args, auth, client},
    globals::GlobalArgs,
};
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if the subcommand is missing or a required argument is empty.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing subcommand, see --help");
    };
    let globals = GlobalArgs::new(client::config(sub));

    let action = match name {
        auth::CMD_LOGIN => Action::Login(login::Args {
            globals,
            identifier: read_required(sub, auth::ARG_IDENTIFIER)?,
            password: read_secret(sub, auth::ARG_PASSWORD),
            remember_me: sub.get_flag(auth::ARG_REMEMBER_ME),
            captcha_out: read_optional(sub, auth::ARG_CAPTCHA_OUT).map(PathBuf::from),
        }),
        auth::CMD_LOGOUT => Action::Logout(globals),
        auth::CMD_WHOAMI => Action::Whoami(globals),
        auth::CMD_CAPTCHA => Action::Captcha(captcha::Args {
            out: read_optional(sub, auth::ARG_OUT)
                .map_or_else(|| PathBuf::from(auth::DEFAULT_CAPTCHA_FILE), PathBuf::from),
        }),
        commands::CMD_HEALTH => Action::Health(globals),
        account_args::CMD_REGISTER => Action::Register(account::RegisterArgs {
            globals,
            email: read_required(sub, account_args::ARG_EMAIL)?,
            name: read_required(sub, account_args::ARG_NAME)?,
            password: read_secret(sub, auth::ARG_PASSWORD),
            confirmation: read_secret(sub, account_args::ARG_PASSWORD_CONFIRM),
        }),
        account_args::CMD_FORGOT_PASSWORD => Action::ForgotPassword(account::ForgotArgs {
            globals,
            email: read_required(sub, account_args::ARG_EMAIL)?,
        }),
        account_args::CMD_RESET_PASSWORD => Action::ResetPassword(account::ResetArgs {
            globals,
            token: SecretString::from(read_required(sub, account_args::ARG_TOKEN)?),
            password: read_secret(sub, auth::ARG_PASSWORD),
            confirmation: read_secret(sub, account_args::ARG_PASSWORD_CONFIRM),
        }),
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}

// Clap passes through empty strings when env vars are set to ""
fn read_optional(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .filter(|v| !v.trim().is_empty())
}

fn read_required(matches: &ArgMatches, id: &str) -> Result<String> {
    read_optional(matches, id)
        .map(|v| v.trim().to_string())
        .with_context(|| format!("missing required argument: --{id}"))
}

fn read_secret(matches: &ArgMatches, id: &str) -> Option<SecretString> {
    matches
        .get_one::<String>(id)
        .filter(|v| !v.is_empty())
        .map(|v| SecretString::from(v.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn dispatch(args: &[&str]) -> Result<Action> {
        let matches = commands::new().get_matches_from(args);
        handler(&matches)
    }

    #[test]
    fn login_action_carries_arguments() {
        temp_env::with_vars([(auth::ENV_PASSWORD, Some("hunter2"))], || {
            let action = dispatch(&[
                "eq-portal",
                "login",
                "-i",
                " ada@eq.test ",
                "--captcha-out",
                "/tmp/c.svg",
                "--data-dir",
                "/tmp/eq-dispatch",
            ])
            .expect("action");

            let Action::Login(args) = action else {
                panic!("expected login action");
            };
            assert_eq!(args.identifier, "ada@eq.test");
            assert_eq!(
                args.password.as_ref().map(|p| p.expose_secret().to_string()),
                Some("hunter2".to_string())
            );
            assert!(!args.remember_me);
            assert_eq!(args.captcha_out, Some(PathBuf::from("/tmp/c.svg")));
            assert_eq!(
                args.globals.config.data_dir(),
                std::path::Path::new("/tmp/eq-dispatch")
            );
        });
    }

    #[test]
    fn empty_identifier_is_rejected() {
        temp_env::with_vars([(auth::ENV_IDENTIFIER, Some("  "))], || {
            let result = dispatch(&["eq-portal", "login"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn captcha_defaults_output_file() {
        let Action::Captcha(args) = dispatch(&["eq-portal", "captcha"]).expect("action") else {
            panic!("expected captcha action");
        };
        assert_eq!(args.out, PathBuf::from(auth::DEFAULT_CAPTCHA_FILE));
    }

    #[test]
    fn session_and_account_actions() {
        assert!(matches!(
            dispatch(&["eq-portal", "whoami"]),
            Ok(Action::Whoami(_))
        ));
        assert!(matches!(
            dispatch(&["eq-portal", "logout"]),
            Ok(Action::Logout(_))
        ));
        assert!(matches!(
            dispatch(&["eq-portal", "health"]),
            Ok(Action::Health(_))
        ));
        assert!(matches!(
            dispatch(&["eq-portal", "forgot-password", "-e", "ada@eq.test"]),
            Ok(Action::ForgotPassword(_))
        ));
    }
}
