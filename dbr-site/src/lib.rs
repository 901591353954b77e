//! Dashboard projects and their Quarto website output.
//!
//! A [`DashboardProject`] holds pages; a [`Page`] holds content blocks, most
//! of them [`VizSpec`] charts tagged with a `/`-separated tab group path.
//! [`generate_dashboard`] turns the project into a directory of `.qmd` files
//! plus `_quarto.yml`, nesting tagged charts into tabsets
//! ([`build_hierarchy`]) and skipping unchanged pages on incremental runs.
//!
//! ```no_run
//! use dbr_site::{generate_dashboard, DashboardProject, GenerateOptions, Page, VizSpec};
//! use dbr_viz::{ChartSpec, PieParams};
//!
//! let project = DashboardProject::new("Survey", "site").add_page(
//!     Page::new("Votes")
//!         .data_path("survey.csv")
//!         .add_viz(VizSpec::new(ChartSpec::Pie(PieParams::new("party"))).tabgroup("votes")),
//! );
//! let report = generate_dashboard(&project, &GenerateOptions::default())?;
//! println!("{} pages written", report.pages_written.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod assets;
pub mod cache;
pub mod config;
pub mod error;
pub mod generate;
pub mod hierarchy;
pub mod manifest;
pub mod model;
pub mod qmd;
pub mod quarto;
pub mod quarto_yml;
pub mod validate;

pub use config::load_project;
pub use error::{Result, SiteError};
pub use generate::{
    generate_dashboard, generate_dashboards, BatchOutcome, BatchReport, GenerateOptions,
    GenerationReport,
};
pub use hierarchy::{build_hierarchy, HierarchyOptions, LayoutNode, TabLabels};
pub use model::{
    combine_viz, create_viz, CalloutKind, ContentBlock, DashboardProject, NavAlign, NavbarSection,
    Page, PageTemplate, SidebarGroup, TabPath, TabsetTheme, VizCollection, VizSpec,
};
pub use quarto::{check_quarto, QuartoStatus, QuartoVersion};
