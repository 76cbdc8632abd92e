//! Line prompts on the terminal. Prompts go to stderr so stdout only carries
//! command output.

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use std::io::{self, BufRead, Write};

/// Reads one line from stdin without blocking the runtime.
pub async fn line(label: &str) -> Result<String> {
    let label = label.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{label}: ")?;
        stderr.flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            bail!("input closed while waiting for {label}");
        }
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    })
    .await
    .context("prompt task failed")?
}

/// Reads a secret. The terminal still echoes it; prefer the env variables
/// in shared sessions.
pub async fn secret(label: &str) -> Result<SecretString> {
    line(label).await.map(SecretString::from)
}

/// Uses the provided value or prompts for it.
pub async fn secret_or_prompt(value: Option<SecretString>, label: &str) -> Result<SecretString> {
    match value {
        Some(value) => Ok(value),
        None => secret(label).await,
    }
}
