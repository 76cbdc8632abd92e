use crate::features::auth::captcha::{CaptchaChallenge, SvgSurface};
use anyhow::{Context, Result};
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub out: PathBuf,
}

/// Renders a fresh challenge to `args.out`.
/// # Errors
/// Returns an error if the file cannot be written.
pub fn execute(args: &Args) -> Result<()> {
    let challenge = CaptchaChallenge::new();
    write_svg(&challenge, &args.out)?;
    println!("{}", args.out.display());
    Ok(())
}

/// Writes the challenge as an SVG image, creating parent directories.
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn write_svg(challenge: &CaptchaChallenge, path: &Path) -> Result<()> {
    let mut surface = SvgSurface::default();
    challenge.render(&mut surface);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, surface.to_svg())
        .with_context(|| format!("failed to write CAPTCHA image to {}", path.display()))?;
    debug!(path = %path.display(), "captcha written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_svg_into_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("captcha.svg");

        write_svg(&CaptchaChallenge::with_code("AbC23"), &path).expect("write");

        let svg = fs::read_to_string(&path).expect("read");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
