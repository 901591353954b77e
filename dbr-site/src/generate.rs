//! Writing a dashboard project to disk and, optionally, rendering it.

use crate::assets::write_assets;
use crate::cache::ChartCache;
use crate::manifest::{frame_digest, page_digest, Manifest, PageRecord};
use crate::model::{ContentBlock, DashboardProject, Page};
use crate::qmd::{render_page, render_template_page, PageFile};
use crate::quarto::{render_site, DEFAULT_QUARTO_BIN};
use crate::quarto_yml::render_quarto_yml;
use anyhow::{anyhow, Context};
use dbr_data::DataFrame;
use dbr_utils::dates::timestamp;
use dbr_utils::digest::sha256_hex;
use dbr_viz::Chart;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

pub const QUARTO_YML: &str = "_quarto.yml";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Run `quarto render` after writing the sources.
    pub render: bool,
    /// Skip pages whose content digest matches the previous build.
    pub incremental: bool,
    pub quarto_bin: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            render: false,
            incremental: false,
            quarto_bin: DEFAULT_QUARTO_BIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    /// Pages whose files were (re)written, in page order.
    pub pages_written: Vec<String>,
    /// Pages left untouched by an incremental build.
    pub pages_skipped: Vec<String>,
    /// Every file written this run.
    pub files: Vec<PathBuf>,
    pub rendered: bool,
}

/// CSV files read so far, with the digest of their bytes.
#[derive(Default)]
struct DataStore {
    loaded: HashMap<PathBuf, (DataFrame, String)>,
}

impl DataStore {
    fn load(&mut self, path: &Path) -> anyhow::Result<&(DataFrame, String)> {
        if !self.loaded.contains_key(path) {
            let bytes = fs::read(path).with_context(|| format!("reading data {}", path.display()))?;
            let text = String::from_utf8_lossy(&bytes);
            let frame = DataFrame::from_csv_str(&text)
                .with_context(|| format!("parsing data {}", path.display()))?;
            debug!("data: loaded {} ({} rows)", path.display(), frame.len());
            self.loaded.insert(path.to_path_buf(), (frame, sha256_hex(&bytes)));
        }
        self.loaded
            .get(path)
            .ok_or_else(|| anyhow!("data {} vanished from the store", path.display()))
    }
}

struct Run<'a> {
    project: &'a DashboardProject,
    opts: &'a GenerateOptions,
    out_dir: &'a Path,
    data: DataStore,
    cache: ChartCache,
    cache_keys: Vec<String>,
}

impl Run<'_> {
    /// Build every chart on a page, keyed by content index.
    fn charts(&mut self, page: &Page) -> anyhow::Result<BTreeMap<usize, Chart>> {
        let inline = page.frame.as_ref().map(|f| (f, frame_digest(f)));
        let mut charts = BTreeMap::new();
        for (index, block) in page.content.iter().enumerate() {
            let ContentBlock::Viz(viz) = block else {
                continue;
            };
            let (frame, data_digest) = match (&viz.data, &inline, &page.data) {
                (Some(path), _, _) | (None, None, Some(path)) => {
                    let (frame, digest) = self.data.load(path)?;
                    (frame, digest.clone())
                }
                (None, Some((frame, digest)), _) => (*frame, digest.clone()),
                (None, None, None) => {
                    return Err(anyhow!(
                        "page '{}': visualization {} has no data",
                        page.name,
                        index + 1
                    ))
                }
            };

            let key = ChartCache::key(viz, &data_digest)?;
            let cached = if self.opts.incremental {
                self.cache.get(&key)
            } else {
                None
            };
            let chart = match cached {
                Some(chart) => {
                    debug!("page '{}': chart {} from cache", page.name, index + 1);
                    chart
                }
                None => {
                    let filtered;
                    let frame = match &viz.filter {
                        Some(filter) => {
                            filtered = frame.filter(filter)?;
                            &filtered
                        }
                        None => frame,
                    };
                    let chart = viz.chart.build(frame).with_context(|| {
                        format!(
                            "page '{}': building {} chart {}",
                            page.name,
                            viz.chart.type_name(),
                            index + 1
                        )
                    })?;
                    self.cache.put(&key, &chart)?;
                    chart
                }
            };
            self.cache_keys.push(key);
            charts.insert(index, chart);
        }
        Ok(charts)
    }

    fn page_files(&mut self, page: &Page) -> anyhow::Result<Vec<PageFile>> {
        match &page.template {
            Some(template) => {
                let text = fs::read_to_string(&template.path)
                    .with_context(|| format!("reading template {}", template.path.display()))?;
                Ok(vec![render_template_page(self.project, page, &text)])
            }
            None => {
                let charts = self.charts(page)?;
                Ok(render_page(self.project, page, &charts))
            }
        }
    }

    fn write(&self, rel: &str, content: &str) -> anyhow::Result<PathBuf> {
        let path = self.out_dir.join(rel);
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Write the project's `.qmd` pages, `_quarto.yml`, assets and manifest.
///
/// Validation and IO failures abort with an error. A missing or failing
/// quarto only clears `rendered` in the report.
pub fn generate_dashboard(
    project: &DashboardProject,
    opts: &GenerateOptions,
) -> anyhow::Result<GenerationReport> {
    project
        .validate()
        .with_context(|| format!("invalid dashboard '{}'", project.title))?;
    let out_dir = project.output_dir.as_path();
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    info!("Generating '{}' into {}", project.title, out_dir.display());

    let mut report = GenerationReport {
        output_dir: out_dir.to_path_buf(),
        ..Default::default()
    };
    report.files.extend(write_assets(out_dir)?);

    // read on every run so files of removed pages and parts get cleaned up
    let previous = Manifest::load(out_dir);
    let mut manifest = Manifest::default();
    let mut run = Run {
        project,
        opts,
        out_dir,
        data: DataStore::default(),
        cache: ChartCache::new(out_dir),
        cache_keys: Vec::new(),
    };

    for page in &project.pages {
        let digest = page_digest(project, page)?;
        if opts.incremental && previous.is_current(&page.name, &digest, out_dir) {
            info!("Page '{}' unchanged, skipping", page.name);
            if let Some(record) = previous.pages.get(&page.name) {
                manifest.pages.insert(page.name.clone(), record.clone());
            }
            report.pages_skipped.push(page.name.clone());
            continue;
        }

        let files = run.page_files(page)?;
        let mut names = Vec::new();
        for file in &files {
            report.files.push(run.write(&file.file_name, &file.content)?);
            names.push(file.file_name.clone());
        }
        info!("Wrote page '{}' ({} file(s))", page.name, names.len());
        manifest.pages.insert(
            page.name.clone(),
            PageRecord {
                digest,
                files: names,
            },
        );
        report.pages_written.push(page.name.clone());
    }

    let current: Vec<String> = manifest
        .pages
        .values()
        .flat_map(|r| r.files.iter().cloned())
        .collect();
    for (name, old) in &previous.pages {
        if project.page(name).is_none() {
            info!("Removing files of deleted page '{}'", name);
        }
        remove_stale(out_dir, &old.files, &current);
    }

    let yml = render_quarto_yml(project);
    report.files.push(run.write(QUARTO_YML, &yml)?);

    manifest.generated_at = timestamp();
    manifest.save(out_dir)?;
    if !opts.incremental {
        let pruned = run.cache.prune(&run.cache_keys);
        if pruned > 0 {
            debug!("cache: pruned {} stale chart(s)", pruned);
        }
    }

    info!(
        "Dashboard '{}': {} page(s) written, {} skipped",
        project.title,
        report.pages_written.len(),
        report.pages_skipped.len()
    );

    if opts.render {
        report.rendered = render_site(&opts.quarto_bin, out_dir);
    }
    Ok(report)
}

fn remove_stale(out_dir: &Path, old: &[String], keep: &[String]) {
    for rel in old.iter().filter(|f| !keep.contains(f)) {
        let path = out_dir.join(rel);
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed stale {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove stale {}: {}", path.display(), e),
        }
    }
}

/// Outcome of one project in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub title: String,
    pub result: anyhow::Result<GenerationReport>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Generate several dashboards in order.
///
/// With `continue_on_error` a failing project is logged and recorded and the
/// rest still run; otherwise the first failure is returned.
pub fn generate_dashboards(
    projects: &[DashboardProject],
    opts: &GenerateOptions,
    continue_on_error: bool,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    for (i, project) in projects.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, projects.len(), project.title);
        match generate_dashboard(project, opts) {
            Ok(r) => report.outcomes.push(BatchOutcome {
                title: project.title.clone(),
                result: Ok(r),
            }),
            Err(e) if continue_on_error => {
                warn!("Dashboard '{}' failed: {:#}", project.title, e);
                report.outcomes.push(BatchOutcome {
                    title: project.title.clone(),
                    result: Err(e),
                });
            }
            Err(e) => {
                return Err(e.context(format!(
                    "batch stopped at dashboard {} of {}",
                    i + 1,
                    projects.len()
                )))
            }
        }
    }
    info!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Page, VizSpec};
    use crate::quarto_yml::navbar_texts;
    use dbr_data::Filter;
    use dbr_viz::{ChartSpec, HeatmapParams, PieParams, StackedBarParams};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dbr_generate_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn survey_csv(dir: &Path) -> PathBuf {
        let path = dir.join("survey.csv");
        fs::write(
            &path,
            "wave,region,party,trust\n1,north,A,4\n1,south,B,2\n2,north,A,5\n2,NA,B,3\n",
        )
        .unwrap();
        path
    }

    fn project(dir: &Path) -> DashboardProject {
        let csv = survey_csv(dir);
        DashboardProject::new("Survey Dashboard", dir.join("site"))
            .add_page(Page::new("Home").landing().text("Welcome"))
            .add_page(
                Page::new("Party")
                    .data_path(&csv)
                    .add_viz(VizSpec::new(ChartSpec::Pie(PieParams::new("party"))).title("Vote").tabgroup("votes"))
                    .add_viz(
                        VizSpec::new(ChartSpec::Stackedbar(StackedBarParams::new("region", "party")))
                            .tabgroup("votes/by region"),
                    ),
            )
            .add_page(
                Page::new("Trust").data_path(&csv).add_viz(VizSpec::new(ChartSpec::Heatmap(
                    HeatmapParams::new("region", "wave", "trust"),
                ))),
            )
    }

    fn qmd_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".qmd"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn round_trip_writes_navbar_and_one_qmd_per_page() {
        let dir = scratch("round_trip");
        let project = project(&dir);
        let report = generate_dashboard(&project, &GenerateOptions::default()).unwrap();

        assert_eq!(report.pages_written, vec!["Home", "Party", "Trust"]);
        assert!(!report.rendered);
        let site = dir.join("site");
        let yml = fs::read_to_string(site.join(QUARTO_YML)).unwrap();
        let names: Vec<String> = project.pages.iter().map(|p| p.name.clone()).collect();
        assert_eq!(navbar_texts(&yml), names);
        assert_eq!(qmd_files(&site), vec!["index.qmd", "party.qmd", "trust.qmd"]);
        assert!(site.join("assets/dashboardr.js").exists());
        assert!(site.join(".dashboardr_manifest.json").exists());

        let party = fs::read_to_string(site.join("party.qmd")).unwrap();
        assert!(party.contains("dbrRenderChart('dbr-party-1'"));
        assert!(party.contains("\"type\":\"pie\""));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn second_incremental_run_regenerates_nothing() {
        let dir = scratch("incremental");
        let project = project(&dir);
        let opts = GenerateOptions {
            incremental: true,
            ..Default::default()
        };
        let first = generate_dashboard(&project, &opts).unwrap();
        assert_eq!(first.pages_written.len(), 3);

        let second = generate_dashboard(&project, &opts).unwrap();
        assert!(second.pages_written.is_empty());
        assert_eq!(second.pages_skipped, vec!["Home", "Party", "Trust"]);

        // touching a page's definition rebuilds only that page
        let mut changed = project.clone();
        changed.pages[2].text = Some("Trust over time".to_string());
        let third = generate_dashboard(&changed, &opts).unwrap();
        assert_eq!(third.pages_written, vec!["Trust"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn incremental_rebuilds_deleted_output() {
        let dir = scratch("deleted_output");
        let project = project(&dir);
        let opts = GenerateOptions {
            incremental: true,
            ..Default::default()
        };
        generate_dashboard(&project, &opts).unwrap();
        fs::remove_file(dir.join("site/trust.qmd")).unwrap();
        let again = generate_dashboard(&project, &opts).unwrap();
        assert_eq!(again.pages_written, vec!["Trust"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn filters_restrict_chart_rows() {
        let dir = scratch("filter");
        let csv = survey_csv(&dir);
        let project = DashboardProject::new("F", dir.join("site")).add_page(
            Page::new("Waves")
                .data_path(&csv)
                .add_viz(
                    VizSpec::new(ChartSpec::Pie(PieParams::new("party")))
                        .filter(Filter::eq("wave", "2"))
                        .tabgroup("w"),
                )
                .add_viz(
                    VizSpec::new(ChartSpec::Pie(PieParams::new("party")))
                        .filter(Filter::eq("wave", "1"))
                        .tabgroup("w"),
                ),
        );
        generate_dashboard(&project, &GenerateOptions::default()).unwrap();
        let qmd = fs::read_to_string(dir.join("site/index.qmd")).unwrap();
        assert!(qmd.contains("wave == 2"));
        assert!(qmd.contains("wave == 1"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn removed_pagination_cleans_up_parts() {
        let dir = scratch("pagination");
        let csv = survey_csv(&dir);
        let pie = || VizSpec::new(ChartSpec::Pie(PieParams::new("party")));
        let paged = DashboardProject::new("P", dir.join("site"))
            .add_page(Page::new("Home"))
            .add_page(
                Page::new("Long")
                    .data_path(&csv)
                    .add_viz(pie())
                    .add_pagination(None)
                    .add_viz(pie()),
            );
        let opts = GenerateOptions {
            incremental: true,
            ..Default::default()
        };
        generate_dashboard(&paged, &opts).unwrap();
        assert!(dir.join("site/long_p2.qmd").exists());

        let mut flat = paged.clone();
        flat.pages[1].content.remove(1);
        generate_dashboard(&flat, &opts).unwrap();
        assert!(!dir.join("site/long_p2.qmd").exists());
        assert!(dir.join("site/long.qmd").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn full_rebuild_removes_dropped_pages_and_parts() {
        let dir = scratch("full_rebuild_cleanup");
        let csv = survey_csv(&dir);
        let pie = || VizSpec::new(ChartSpec::Pie(PieParams::new("party")));
        let before = DashboardProject::new("C", dir.join("site"))
            .add_page(Page::new("Home"))
            .add_page(Page::new("Old").text("gone soon"))
            .add_page(
                Page::new("Long")
                    .data_path(&csv)
                    .add_viz(pie())
                    .add_pagination(None)
                    .add_viz(pie()),
            );
        generate_dashboard(&before, &GenerateOptions::default()).unwrap();
        assert_eq!(
            qmd_files(&dir.join("site")),
            vec!["index.qmd", "long.qmd", "long_p2.qmd", "old.qmd"]
        );

        let mut after = before.clone();
        after.pages.remove(1);
        after.pages[1].content.remove(1);
        generate_dashboard(&after, &GenerateOptions::default()).unwrap();
        assert_eq!(qmd_files(&dir.join("site")), vec!["index.qmd", "long.qmd"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn renamed_landing_page_keeps_index() {
        let dir = scratch("landing_rename");
        let first = DashboardProject::new("L", dir.join("site")).add_page(Page::new("Home"));
        generate_dashboard(&first, &GenerateOptions::default()).unwrap();
        let second = DashboardProject::new("L", dir.join("site")).add_page(Page::new("Intro"));
        generate_dashboard(&second, &GenerateOptions::default()).unwrap();
        assert_eq!(qmd_files(&dir.join("site")), vec!["index.qmd"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn template_pages_are_filled_from_file() {
        let dir = scratch("template");
        let template = dir.join("about.qmd");
        fs::write(&template, "---\ntitle: \"{{title}}\"\n---\n\nContact {{email}}\n").unwrap();
        let project = DashboardProject::new("T", dir.join("site"))
            .add_page(Page::new("Home"))
            .add_page(Page::new("About").template(&template, &[("email", "team@example.org")]));
        generate_dashboard(&project, &GenerateOptions::default()).unwrap();
        let about = fs::read_to_string(dir.join("site/about.qmd")).unwrap();
        assert_eq!(about, "---\ntitle: \"About\"\n---\n\nContact team@example.org\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bad_column_aborts_with_context() {
        let dir = scratch("bad_column");
        let csv = survey_csv(&dir);
        let project = DashboardProject::new("B", dir.join("site")).add_page(
            Page::new("P")
                .data_path(&csv)
                .add_viz(VizSpec::new(ChartSpec::Pie(PieParams::new("age")))),
        );
        let err = generate_dashboard(&project, &GenerateOptions::default()).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("building pie chart 1"), "{}", msg);
        assert!(msg.contains("'age'"), "{}", msg);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn render_without_quarto_still_writes_sources() {
        let dir = scratch("no_quarto");
        let project = project(&dir);
        let opts = GenerateOptions {
            render: true,
            quarto_bin: "dbr-no-such-quarto-binary".to_string(),
            ..Default::default()
        };
        let report = generate_dashboard(&project, &opts).unwrap();
        assert!(!report.rendered);
        assert_eq!(report.pages_written.len(), 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn batch_isolates_failures_when_asked() {
        let dir = scratch("batch");
        let good = project(&dir);
        let bad = DashboardProject::new("", dir.join("bad"));
        let projects = vec![bad, good];

        let report = generate_dashboards(&projects, &GenerateOptions::default(), true).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let err = generate_dashboards(&projects, &GenerateOptions::default(), false).unwrap_err();
        assert!(format!("{:#}", err).contains("batch stopped at dashboard 1 of 2"));
        let _ = fs::remove_dir_all(&dir);
    }
}
