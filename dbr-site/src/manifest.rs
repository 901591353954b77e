//! Incremental builds: per-page content digests and the manifest that
//! remembers them between runs.
//!
//! A page is regenerated when its digest differs from the previous build's
//! or one of the files it produced has gone missing.

use crate::model::{ContentBlock, DashboardProject, Page};
use anyhow::Context;
use dbr_data::DataFrame;
use dbr_utils::digest::Digester;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = ".dashboardr_manifest.json";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub digest: String,
    /// Files written for the page, relative to the output directory.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub generated_at: String,
    pub pages: BTreeMap<String, PageRecord>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            generated_at: String::new(),
            pages: BTreeMap::new(),
        }
    }
}

impl Manifest {
    pub fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(MANIFEST_FILE)
    }

    /// Previous manifest, or an empty one if there is none or it is unreadable.
    pub fn load(output_dir: &Path) -> Self {
        let path = Self::path(output_dir);
        let Ok(text) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str::<Manifest>(&text) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            Ok(m) => {
                warn!(
                    "Ignoring manifest version {} (expected {}), rebuilding all pages",
                    m.version, MANIFEST_VERSION
                );
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, output_dir: &Path) -> anyhow::Result<()> {
        let path = Self::path(output_dir);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!("manifest: saved {} pages to {}", self.pages.len(), path.display());
        Ok(())
    }

    /// The page was built from identical input and its files are still there.
    pub fn is_current(&self, page: &str, digest: &str, output_dir: &Path) -> bool {
        match self.pages.get(page) {
            Some(record) => {
                record.digest == digest
                    && !record.files.is_empty()
                    && record.files.iter().all(|f| output_dir.join(f).exists())
            }
            None => false,
        }
    }
}

/// Digest of everything that shapes a page's output.
///
/// Covers the page definition, the bytes of every file it reads, and the
/// project settings that leak into page text.
pub fn page_digest(project: &DashboardProject, page: &Page) -> anyhow::Result<String> {
    let mut d = Digester::new();
    d.part_str(&serde_json::to_string(page)?);
    d.part_str(&project.page_stem(page));
    d.part_str(&project.theme);
    d.part_str(&serde_json::to_string(&project.tabset_theme)?);
    d.part_str(&serde_json::to_string(&project.tabgroup_labels)?);
    d.part(&project.chart_height.to_le_bytes());

    if let Some(frame) = &page.frame {
        hash_frame(&mut d, frame);
    }
    let viz_data = page.content.iter().filter_map(|b| match b {
        ContentBlock::Viz(v) => v.data.as_ref(),
        _ => None,
    });
    let template = page.template.as_ref().map(|t| &t.path);
    for path in page.data.iter().chain(viz_data).chain(template) {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        d.part(&bytes);
    }
    Ok(d.finish())
}

/// Digest of an in-memory frame's header and cells.
pub fn frame_digest(frame: &DataFrame) -> String {
    let mut d = Digester::new();
    hash_frame(&mut d, frame);
    d.finish()
}

fn hash_frame(d: &mut Digester, frame: &DataFrame) {
    for name in frame.columns() {
        d.part_str(name);
        if let Ok(cells) = frame.column(name) {
            for cell in cells {
                match cell {
                    Some(v) => d.part_str(v),
                    None => d.part(&[0xff]),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dbr_manifest_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn digest_tracks_data_bytes() {
        let dir = scratch("digest");
        let csv = dir.join("a.csv");
        fs::write(&csv, "x\n1\n").unwrap();
        let project = DashboardProject::new("T", &dir).add_page(Page::new("A").data_path(&csv));
        let first = page_digest(&project, &project.pages[0]).unwrap();
        assert_eq!(first, page_digest(&project, &project.pages[0]).unwrap());

        fs::write(&csv, "x\n2\n").unwrap();
        assert_ne!(first, page_digest(&project, &project.pages[0]).unwrap());

        let themed = project.clone().theme("darkly");
        fs::write(&csv, "x\n1\n").unwrap();
        assert_ne!(first, page_digest(&themed, &themed.pages[0]).unwrap());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_data_file_is_an_error() {
        let project = DashboardProject::new("T", "out")
            .add_page(Page::new("A").data_path("/nonexistent/dbr/a.csv"));
        let err = page_digest(&project, &project.pages[0]).unwrap_err();
        assert!(format!("{:#}", err).contains("a.csv"));
    }

    #[test]
    fn inline_frames_are_hashed() {
        let a = DataFrame::from_records(&["x"], &[&["1"]]).unwrap();
        let b = DataFrame::from_records(&["x"], &[&["2"]]).unwrap();
        let pa = DashboardProject::new("T", "out").add_page(Page::new("A").data_frame(a));
        let pb = DashboardProject::new("T", "out").add_page(Page::new("A").data_frame(b));
        assert_ne!(
            page_digest(&pa, &pa.pages[0]).unwrap(),
            page_digest(&pb, &pb.pages[0]).unwrap()
        );
    }

    #[test]
    fn manifest_round_trip_and_currency() {
        let dir = scratch("roundtrip");
        fs::write(dir.join("index.qmd"), "x").unwrap();
        let mut m = Manifest::default();
        m.pages.insert(
            "Home".to_string(),
            PageRecord {
                digest: "abc".to_string(),
                files: vec!["index.qmd".to_string()],
            },
        );
        m.save(&dir).unwrap();
        let loaded = Manifest::load(&dir);
        assert_eq!(loaded, m);
        assert!(loaded.is_current("Home", "abc", &dir));
        assert!(!loaded.is_current("Home", "abd", &dir));
        fs::remove_file(dir.join("index.qmd")).unwrap();
        assert!(!loaded.is_current("Home", "abc", &dir));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_manifest_loads_empty() {
        let dir = scratch("corrupt");
        fs::write(Manifest::path(&dir), "{ not json").unwrap();
        assert!(Manifest::load(&dir).pages.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
