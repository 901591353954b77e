//! Gzip-compressed chart cache.
//!
//! Built charts are stored as `<output>/.dashboardr_cache/<key>.json.gz`
//! where the key digests the viz definition and its data. A cache entry
//! that fails to decode is treated as a miss.

use crate::model::VizSpec;
use anyhow::Context;
use dbr_utils::digest::Digester;
use dbr_viz::Chart;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

pub const CACHE_DIR: &str = ".dashboardr_cache";

#[derive(Debug, Clone)]
pub struct ChartCache {
    dir: PathBuf,
}

impl ChartCache {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            dir: output_dir.join(CACHE_DIR),
        }
    }

    /// Cache key for a viz drawn from data with digest `data_digest`.
    pub fn key(viz: &VizSpec, data_digest: &str) -> anyhow::Result<String> {
        let mut d = Digester::new();
        d.part_str(&serde_json::to_string(viz)?).part_str(data_digest);
        Ok(d.finish())
    }

    fn entry(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.gz", key))
    }

    pub fn get(&self, key: &str) -> Option<Chart> {
        let file = File::open(self.entry(key)).ok()?;
        match serde_json::from_reader(GzDecoder::new(BufReader::new(file))) {
            Ok(chart) => Some(chart),
            Err(e) => {
                debug!("cache: discarding entry {}: {}", key, e);
                None
            }
        }
    }

    pub fn put(&self, key: &str, chart: &Chart) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.entry(key);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(serde_json::to_string(chart)?.as_bytes())?;
        encoder.finish()?;
        Ok(())
    }

    /// Remove entries not in `keep`. Returns how many were removed.
    pub fn prune(&self, keep: &[String]) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(key) = name.strip_suffix(".json.gz") else {
                continue;
            };
            if !keep.iter().any(|k| k == key) && fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbr_viz::{ChartSpec, PieParams};
    use serde_json::json;

    #[test]
    fn put_get_and_prune() {
        let dir = std::env::temp_dir().join("dbr_cache_test");
        let _ = fs::remove_dir_all(&dir);
        let cache = ChartCache::new(&dir);
        let viz = VizSpec::new(ChartSpec::Pie(PieParams::new("x")));
        let key = ChartCache::key(&viz, "data-1").unwrap();
        assert_ne!(key, ChartCache::key(&viz, "data-2").unwrap());
        assert!(cache.get(&key).is_none());

        let mut chart = Chart::new(json!({ "chart": { "type": "pie" } }));
        chart.js_function("function() { return 1; }".to_string());
        cache.put(&key, &chart).unwrap();
        assert_eq!(cache.get(&key), Some(chart));

        fs::write(dir.join(CACHE_DIR).join("stale.json.gz"), b"not gzip").unwrap();
        assert!(cache.get("stale").is_none());
        assert_eq!(cache.prune(&[key.clone()]), 1);
        assert!(cache.get(&key).is_some());
        let _ = fs::remove_dir_all(&dir);
    }
}
