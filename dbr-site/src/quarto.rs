//! Calling the external `quarto` CLI.
//!
//! A missing or outdated quarto only costs the render step; the generated
//! sources are still written.

use log::{info, warn};
use std::fmt;
use std::path::Path;
use std::process::Command;

pub const DEFAULT_QUARTO_BIN: &str = "quarto";

/// Oldest quarto that understands the generated site.
pub const MIN_VERSION: QuartoVersion = QuartoVersion {
    major: 1,
    minor: 4,
    patch: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QuartoVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl QuartoVersion {
    /// Parse `major.minor[.patch]` from `quarto --version` output.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().find(|t| t.starts_with(|c: char| c.is_ascii_digit()))?;
        let mut parts = token.split('.').map(|p| {
            p.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse::<u32>()
        });
        let major = parts.next()?.ok()?;
        let minor = parts.next()?.ok()?;
        let patch = parts.next().and_then(|p| p.ok()).unwrap_or(0);
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for QuartoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuartoStatus {
    Missing,
    TooOld(QuartoVersion),
    Ready(QuartoVersion),
}

/// Run `<bin> --version` and compare against [`MIN_VERSION`].
pub fn check_quarto(bin: &str) -> QuartoStatus {
    let output = match Command::new(bin).arg("--version").output() {
        Ok(o) if o.status.success() => o,
        _ => return QuartoStatus::Missing,
    };
    match QuartoVersion::parse(&String::from_utf8_lossy(&output.stdout)) {
        Some(v) if v >= MIN_VERSION => QuartoStatus::Ready(v),
        Some(v) => QuartoStatus::TooOld(v),
        None => QuartoStatus::Missing,
    }
}

/// Render the site in `dir`. Returns whether quarto ran and succeeded.
pub fn render_site(bin: &str, dir: &Path) -> bool {
    match check_quarto(bin) {
        QuartoStatus::Missing => {
            warn!("Quarto CLI '{}' not found; skipping render", bin);
            return false;
        }
        QuartoStatus::TooOld(v) => {
            warn!(
                "Quarto {} is older than the required {}; skipping render",
                v, MIN_VERSION
            );
            return false;
        }
        QuartoStatus::Ready(v) => info!("Rendering {} with quarto {}", dir.display(), v),
    }

    match Command::new(bin).arg("render").current_dir(dir).output() {
        Ok(out) if out.status.success() => true,
        Ok(out) => {
            warn!(
                "quarto render failed ({}): {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            false
        }
        Err(e) => {
            warn!("Could not run quarto render: {}", e);
            false
        }
    }
}
