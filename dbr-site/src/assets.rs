//! Stylesheet and chart bootstrap script shipped with every site.

use anyhow::Context;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

// Embedded at compile time
static DASHBOARDR_CSS: &str = include_str!("../assets/dashboardr.css");
static DASHBOARDR_JS: &str = include_str!("../assets/dashboardr.js");

pub const ASSET_DIR: &str = "assets";
pub const CSS_FILE: &str = "assets/dashboardr.css";
pub const JS_FILE: &str = "assets/dashboardr.js";

/// Highcharts modules loaded in every page header.
pub const HIGHCHARTS_SCRIPTS: [&str; 5] = [
    "https://code.highcharts.com/highcharts.js",
    "https://code.highcharts.com/modules/heatmap.js",
    "https://code.highcharts.com/modules/sankey.js",
    "https://code.highcharts.com/modules/treemap.js",
    "https://code.highcharts.com/modules/exporting.js",
];

/// Write the bundled assets under `output_dir`, returning the paths written.
pub fn write_assets(output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let dir = output_dir.join(ASSET_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for (rel, body) in [(CSS_FILE, DASHBOARDR_CSS), (JS_FILE, DASHBOARDR_JS)] {
        let path = output_dir.join(rel);
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        debug!("assets: wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
