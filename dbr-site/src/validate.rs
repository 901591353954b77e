//! Structural checks run before anything is written.

use crate::error::{Result, SiteError};
use crate::model::{ContentBlock, DashboardProject};
use std::collections::HashMap;

impl DashboardProject {
    /// Check the project is internally consistent.
    ///
    /// Column-level problems are caught later, when each chart is built.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(SiteError::EmptyTitle);
        }

        let mut files: HashMap<String, &str> = HashMap::new();
        let mut landing: Option<&str> = None;
        for page in &self.pages {
            if self.pages.iter().filter(|p| p.name == page.name).count() > 1 {
                return Err(SiteError::DuplicatePage(page.name.clone()));
            }
            let stem = self.page_stem(page);
            if let Some(first) = files.insert(stem.clone(), &page.name) {
                return Err(SiteError::FileCollision {
                    first: first.to_string(),
                    second: page.name.clone(),
                    file: format!("{}.qmd", stem),
                });
            }
            if page.is_landing_page {
                if let Some(first) = landing {
                    return Err(SiteError::MultipleLandingPages {
                        first: first.to_string(),
                        second: page.name.clone(),
                    });
                }
                landing = Some(&page.name);
            }

            if page.template.is_some() && !page.content.is_empty() {
                return Err(SiteError::TemplateWithContent(page.name.clone()));
            }
            for (index, block) in page.content.iter().enumerate() {
                if let ContentBlock::Viz(viz) = block {
                    if viz.data.is_none() && !page.has_data() {
                        return Err(SiteError::MissingData {
                            page: page.name.clone(),
                            index: index + 1,
                            chart: viz.chart.type_name(),
                        });
                    }
                }
            }
        }

        let referenced = self
            .navbar_sections
            .iter()
            .map(|s| (format!("Navbar section '{}'", s.text), &s.pages))
            .chain(
                self.sidebar_groups
                    .iter()
                    .map(|g| (format!("Sidebar group '{}'", g.title), &g.pages)),
            );
        for (context, pages) in referenced {
            for name in pages {
                if self.page(name).is_none() {
                    return Err(SiteError::UnknownPage {
                        context,
                        page: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
