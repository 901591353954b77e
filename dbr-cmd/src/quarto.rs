//! `check-quarto`.

use anyhow::bail;
use dbr_site::quarto::MIN_VERSION;
use dbr_site::{check_quarto, QuartoStatus};
use log::info;

pub fn run_check_quarto(bin: &str) -> anyhow::Result<()> {
    match check_quarto(bin) {
        QuartoStatus::Ready(v) => {
            info!("Quarto {} found at '{}'", v, bin);
            Ok(())
        }
        QuartoStatus::TooOld(v) => bail!(
            "Quarto {} at '{}' is too old; version {} or newer is required",
            v,
            bin,
            MIN_VERSION
        ),
        QuartoStatus::Missing => bail!(
            "Quarto CLI '{}' not found; install it from https://quarto.org/docs/get-started/",
            bin
        ),
    }
}
