//! `generate` and `batch`.

use anyhow::bail;
use dbr_site::{generate_dashboard, generate_dashboards, load_project, GenerateOptions};
use log::{info, warn};

pub fn options(render: bool, incremental: bool, quarto_bin: String) -> GenerateOptions {
    GenerateOptions {
        render,
        incremental,
        quarto_bin,
    }
}

/// Generate one dashboard from `config_path`.
pub fn run_generate(
    config_path: &str,
    output_dir: Option<&str>,
    opts: &GenerateOptions,
) -> anyhow::Result<()> {
    let mut project = load_project(config_path)?;
    if let Some(dir) = output_dir {
        project.output_dir = dir.into();
    }

    let report = generate_dashboard(&project, opts)?;
    info!(
        "Generated {} ({} written, {} unchanged)",
        report.output_dir.display(),
        report.pages_written.len(),
        report.pages_skipped.len()
    );
    if opts.render && !report.rendered {
        warn!("Sources are in {} but were not rendered", report.output_dir.display());
    }
    Ok(())
}

/// Generate every dashboard in `config_paths`.
///
/// A config that fails to load counts as a failed dashboard. With
/// `continue_on_error` the run finishes and fails at the end if anything
/// failed; otherwise it stops at the first failure.
pub fn run_batch(
    config_paths: &[String],
    opts: &GenerateOptions,
    continue_on_error: bool,
) -> anyhow::Result<()> {
    let mut projects = Vec::with_capacity(config_paths.len());
    let mut load_failures = 0;
    for path in config_paths {
        match load_project(path) {
            Ok(project) => projects.push(project),
            Err(e) if continue_on_error => {
                warn!("Skipping {}: {:#}", path, e);
                load_failures += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let report = generate_dashboards(&projects, opts, continue_on_error)?;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(r) => info!("  ok      {} -> {}", outcome.title, r.output_dir.display()),
            Err(e) => info!("  failed  {}: {:#}", outcome.title, e),
        }
    }

    let failed = report.failed() + load_failures;
    if failed > 0 {
        bail!("{} of {} dashboard(s) failed", failed, config_paths.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dbr_cmd_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config(dir: &PathBuf, file: &str, title: &str) -> String {
        let path = dir.join(file);
        fs::write(
            &path,
            format!(
                "title = \"{}\"\noutput_dir = \"{}\"\n\n[[pages]]\nname = \"Home\"\ntext = \"Hello\"\n",
                title,
                file.trim_end_matches(".toml")
            ),
        )
        .unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn generate_honours_output_override() {
        let dir = scratch("generate");
        let config = write_config(&dir, "one.toml", "One");
        let out = dir.join("elsewhere");
        run_generate(
            &config,
            Some(out.to_str().unwrap()),
            &GenerateOptions::default(),
        )
        .unwrap();
        assert!(out.join("index.qmd").exists());
        assert!(out.join("_quarto.yml").exists());
        assert!(!dir.join("one").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn batch_reports_failures_after_finishing() {
        let dir = scratch("batch");
        let good = write_config(&dir, "good.toml", "Good");
        let bad = write_config(&dir, "bad.toml", "");
        let missing = dir.join("missing.toml").to_string_lossy().to_string();
        let configs = vec![bad, missing, good];

        let err = run_batch(&configs, &GenerateOptions::default(), true).unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 dashboard(s) failed");
        assert!(dir.join("good/index.qmd").exists());

        let _ = fs::remove_dir_all(dir.join("good"));
        assert!(run_batch(&configs, &GenerateOptions::default(), false).is_err());
        assert!(!dir.join("good").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
