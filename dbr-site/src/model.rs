//! Dashboard project, pages and the content blocks placed on them.
//!
//! Everything here is plain data with builder methods; nothing is computed
//! until [`crate::generate::generate_dashboard`] runs. All types round-trip
//! through serde so a project can also come from a config file.

use dbr_data::{DataFrame, Filter};
use dbr_viz::ChartSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Nested tab group path, written `"outer/inner"`.
///
/// Blank segments are dropped, so `"a//b/"` is the same path as `"a/b"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TabPath(Vec<String>);

impl TabPath {
    pub fn parse(path: &str) -> Self {
        TabPath(
            path.split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The first `n` segments.
    pub fn prefix(&self, n: usize) -> TabPath {
        TabPath(self.0[..n.min(self.0.len())].to_vec())
    }

    pub fn child(&self, segment: &str) -> TabPath {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        TabPath(segments)
    }
}

impl fmt::Display for TabPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<String> for TabPath {
    fn from(s: String) -> Self {
        TabPath::parse(&s)
    }
}

impl From<&str> for TabPath {
    fn from(s: &str) -> Self {
        TabPath::parse(s)
    }
}

impl From<TabPath> for String {
    fn from(p: TabPath) -> Self {
        p.to_string()
    }
}

/// One chart on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizSpec {
    pub chart: ChartSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabgroup: Option<TabPath>,
    /// Rows the chart sees; the rest of the page data is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Container height in pixels, overriding the project default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_label: Option<String>,
    /// CSV used instead of the page data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
}

impl VizSpec {
    pub fn new(chart: ChartSpec) -> Self {
        Self {
            chart,
            tabgroup: None,
            filter: None,
            height: None,
            text_before: None,
            text_after: None,
            tab_label: None,
            data: None,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.chart.common_mut().title = Some(title.to_string());
        self
    }

    pub fn subtitle(mut self, subtitle: &str) -> Self {
        self.chart.common_mut().subtitle = Some(subtitle.to_string());
        self
    }

    pub fn tabgroup(mut self, path: &str) -> Self {
        let path = TabPath::parse(path);
        self.tabgroup = (!path.is_empty()).then_some(path);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn height(mut self, px: u32) -> Self {
        self.height = Some(px);
        self
    }

    pub fn text_before(mut self, markdown: &str) -> Self {
        self.text_before = Some(markdown.to_string());
        self
    }

    pub fn text_after(mut self, markdown: &str) -> Self {
        self.text_after = Some(markdown.to_string());
        self
    }

    pub fn tab_label(mut self, label: &str) -> Self {
        self.tab_label = Some(label.to_string());
        self
    }

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data = Some(path.into());
        self
    }

    pub fn display_title(&self) -> Option<&str> {
        self.chart.common().title.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutKind {
    #[default]
    Note,
    Tip,
    Warning,
    Important,
    Caution,
}

impl CalloutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalloutKind::Note => "note",
            CalloutKind::Tip => "tip",
            CalloutKind::Warning => "warning",
            CalloutKind::Important => "important",
            CalloutKind::Caution => "caution",
        }
    }
}

/// Anything placed on a page, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum ContentBlock {
    Viz(VizSpec),
    Text {
        markdown: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tabgroup: Option<TabPath>,
    },
    Callout {
        #[serde(default)]
        kind: CalloutKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tabgroup: Option<TabPath>,
    },
    Divider,
    /// Splits the page here into separate files.
    Pagination {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl ContentBlock {
    pub fn tabgroup(&self) -> Option<&TabPath> {
        let path = match self {
            ContentBlock::Viz(v) => v.tabgroup.as_ref(),
            ContentBlock::Text { tabgroup, .. } | ContentBlock::Callout { tabgroup, .. } => {
                tabgroup.as_ref()
            }
            ContentBlock::Divider | ContentBlock::Pagination { .. } => None,
        };
        path.filter(|p| !p.is_empty())
    }

    pub fn filter(&self) -> Option<&Filter> {
        match self {
            ContentBlock::Viz(v) => v.filter.as_ref(),
            _ => None,
        }
    }
}

/// Content blocks collected independently of a page, then attached with
/// [`Page::add_content`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizCollection {
    blocks: Vec<ContentBlock>,
}

/// Start an empty collection.
pub fn create_viz() -> VizCollection {
    VizCollection::default()
}

/// Concatenate collections, keeping order.
pub fn combine_viz(collections: impl IntoIterator<Item = VizCollection>) -> VizCollection {
    let mut combined = VizCollection::default();
    for c in collections {
        combined.blocks.extend(c.blocks);
    }
    combined
}

impl VizCollection {
    pub fn add_viz(mut self, viz: VizSpec) -> Self {
        self.blocks.push(ContentBlock::Viz(viz));
        self
    }

    pub fn add_text(mut self, markdown: &str) -> Self {
        self.blocks.push(ContentBlock::Text {
            markdown: markdown.to_string(),
            tabgroup: None,
        });
        self
    }

    pub fn add_pagination(mut self) -> Self {
        self.blocks.push(ContentBlock::Pagination { label: None });
        self
    }

    pub fn combine(mut self, other: VizCollection) -> Self {
        self.blocks.extend(other.blocks);
        self
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAlign {
    #[default]
    Left,
    Right,
}

/// A user-supplied `.qmd` template with `{{key}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    pub path: PathBuf,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    /// CSV read by every viz on the page without its own data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    /// In-memory data, used instead of `data` when set.
    #[serde(skip)]
    pub frame: Option<DataFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_landing_page: bool,
    #[serde(default)]
    pub navbar_align: NavAlign,
    /// Markdown shown above the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PageTemplate>,
    /// Tab group labels for this page only, by path or segment.
    #[serde(default)]
    pub tabgroup_labels: BTreeMap<String, String>,
}

impl Page {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: None,
            frame: None,
            icon: None,
            is_landing_page: false,
            navbar_align: NavAlign::Left,
            text: None,
            content: Vec::new(),
            template: None,
            tabgroup_labels: BTreeMap::new(),
        }
    }

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data = Some(path.into());
        self
    }

    pub fn data_frame(mut self, frame: DataFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn landing(mut self) -> Self {
        self.is_landing_page = true;
        self
    }

    pub fn align_right(mut self) -> Self {
        self.navbar_align = NavAlign::Right;
        self
    }

    pub fn text(mut self, markdown: &str) -> Self {
        self.text = Some(markdown.to_string());
        self
    }

    pub fn add_viz(mut self, viz: VizSpec) -> Self {
        self.content.push(ContentBlock::Viz(viz));
        self
    }

    pub fn add_text(mut self, markdown: &str) -> Self {
        self.content.push(ContentBlock::Text {
            markdown: markdown.to_string(),
            tabgroup: None,
        });
        self
    }

    pub fn add_callout(mut self, kind: CalloutKind, title: Option<&str>, body: &str) -> Self {
        self.content.push(ContentBlock::Callout {
            kind,
            title: title.map(str::to_string),
            body: body.to_string(),
            tabgroup: None,
        });
        self
    }

    pub fn add_divider(mut self) -> Self {
        self.content.push(ContentBlock::Divider);
        self
    }

    pub fn add_pagination(mut self, label: Option<&str>) -> Self {
        self.content.push(ContentBlock::Pagination {
            label: label.map(str::to_string),
        });
        self
    }

    pub fn add_content(mut self, collection: VizCollection) -> Self {
        self.content.extend(collection.blocks);
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>, params: &[(&str, &str)]) -> Self {
        self.template = Some(PageTemplate {
            path: path.into(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }

    pub fn tabgroup_label(mut self, path: &str, label: &str) -> Self {
        self.tabgroup_labels.insert(path.to_string(), label.to_string());
        self
    }

    pub fn vizzes(&self) -> impl Iterator<Item = &VizSpec> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::Viz(v) => Some(v),
            _ => None,
        })
    }

    pub fn has_data(&self) -> bool {
        self.frame.is_some() || self.data.is_some()
    }
}

/// Navbar drop-down grouping several pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavbarSection {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarGroup {
    pub title: String,
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabsetTheme {
    #[default]
    Default,
    Modern,
    Pills,
    Minimal,
    Underline,
}

impl TabsetTheme {
    pub fn css_class(&self) -> &'static str {
        match self {
            TabsetTheme::Default => "dbr-tabset-default",
            TabsetTheme::Modern => "dbr-tabset-modern",
            TabsetTheme::Pills => "dbr-tabset-pills",
            TabsetTheme::Minimal => "dbr-tabset-minimal",
            TabsetTheme::Underline => "dbr-tabset-underline",
        }
    }
}

fn default_theme() -> String {
    "cosmo".to_string()
}

fn default_true() -> bool {
    true
}

fn default_chart_height() -> u32 {
    400
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardProject {
    pub title: String,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Bootswatch theme name.
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub tabset_theme: TabsetTheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_footer: Option<String>,
    #[serde(default = "default_true")]
    pub search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_analytics: Option<String>,
    #[serde(default)]
    pub breadcrumbs: bool,
    #[serde(default)]
    pub page_navigation: bool,
    #[serde(default = "default_true")]
    pub back_to_top: bool,
    #[serde(default)]
    pub reader_mode: bool,
    #[serde(default)]
    pub toc: bool,
    /// Extra stylesheets, relative to the output directory.
    #[serde(default)]
    pub custom_css: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navbar_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default)]
    pub navbar_sections: Vec<NavbarSection>,
    #[serde(default)]
    pub sidebar_groups: Vec<SidebarGroup>,
    /// Display labels for tab groups, by full path (`"a/b"`) or segment (`"b"`).
    #[serde(default)]
    pub tabgroup_labels: BTreeMap<String, String>,
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl DashboardProject {
    pub fn new(title: &str, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            title: title.to_string(),
            output_dir: output_dir.into(),
            pages: Vec::new(),
            theme: default_theme(),
            tabset_theme: TabsetTheme::default(),
            author: None,
            description: None,
            page_footer: None,
            search: true,
            github: None,
            twitter: None,
            linkedin: None,
            google_analytics: None,
            breadcrumbs: false,
            page_navigation: false,
            back_to_top: true,
            reader_mode: false,
            toc: false,
            custom_css: Vec::new(),
            navbar_bg: None,
            logo: None,
            favicon: None,
            navbar_sections: Vec::new(),
            sidebar_groups: Vec::new(),
            tabgroup_labels: BTreeMap::new(),
            chart_height: default_chart_height(),
        }
    }

    pub fn add_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn theme(mut self, theme: &str) -> Self {
        self.theme = theme.to_string();
        self
    }

    pub fn tabset_theme(mut self, theme: TabsetTheme) -> Self {
        self.tabset_theme = theme;
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn page_footer(mut self, footer: &str) -> Self {
        self.page_footer = Some(footer.to_string());
        self
    }

    pub fn search(mut self, enabled: bool) -> Self {
        self.search = enabled;
        self
    }

    pub fn github(mut self, url: &str) -> Self {
        self.github = Some(url.to_string());
        self
    }

    pub fn google_analytics(mut self, id: &str) -> Self {
        self.google_analytics = Some(id.to_string());
        self
    }

    pub fn navbar_section(mut self, text: &str, pages: &[&str]) -> Self {
        self.navbar_sections.push(NavbarSection {
            text: text.to_string(),
            icon: None,
            pages: pages.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn sidebar_group(mut self, title: &str, pages: &[&str]) -> Self {
        self.sidebar_groups.push(SidebarGroup {
            title: title.to_string(),
            pages: pages.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn tabgroup_label(mut self, path: &str, label: &str) -> Self {
        self.tabgroup_labels.insert(path.to_string(), label.to_string());
        self
    }

    pub fn chart_height(mut self, px: u32) -> Self {
        self.chart_height = px;
        self
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.name == name)
    }

    /// The page written as `index.qmd`: the marked one, else the first.
    pub fn landing_page(&self) -> Option<&Page> {
        self.pages
            .iter()
            .find(|p| p.is_landing_page)
            .or_else(|| self.pages.first())
    }

    /// File stem of a page's first `.qmd`.
    pub fn page_stem(&self, page: &Page) -> String {
        match self.landing_page() {
            Some(landing) if landing.name == page.name => "index".to_string(),
            _ => dbr_utils::text::slugify(&page.name),
        }
    }

    /// Resolve relative data, template and viz paths against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for page in &mut self.pages {
            if let Some(data) = page.data.as_mut() {
                resolve(data);
            }
            if let Some(template) = page.template.as_mut() {
                resolve(&mut template.path);
            }
            for block in &mut page.content {
                if let ContentBlock::Viz(v) = block {
                    if let Some(data) = v.data.as_mut() {
                        resolve(data);
                    }
                }
            }
        }
    }
}
