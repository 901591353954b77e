//! Loading a [`DashboardProject`] from a TOML, JSON or YAML file.
//!
//! The file format follows the extension. Environment variables prefixed
//! with `DASHBOARDR_` override top-level settings (`DASHBOARDR_THEME=darkly`,
//! `DASHBOARDR_CHART_HEIGHT=500`), with `__` separating nested keys. Relative
//! paths in the file are taken relative to the file's directory.

use crate::model::DashboardProject;
use anyhow::Context;
use log::debug;
use std::path::Path;

pub const ENV_PREFIX: &str = "DASHBOARDR";

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

pub fn load_project(path: impl AsRef<Path>) -> anyhow::Result<DashboardProject> {
    load_with_env(path.as_ref(), environment())
}

fn load_with_env(path: &Path, env: config::Environment) -> anyhow::Result<DashboardProject> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env)
        .build()
        .with_context(|| format!("reading dashboard config {}", path.display()))?;
    let mut project: DashboardProject = settings
        .try_deserialize()
        .with_context(|| format!("invalid dashboard config {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    if project.output_dir.is_relative() {
        project.output_dir = base.join(&project.output_dir);
    }
    project.resolve_paths(base);
    debug!(
        "config: loaded '{}' with {} page(s) from {}",
        project.title,
        project.pages.len(),
        path.display()
    );
    Ok(project)
}
