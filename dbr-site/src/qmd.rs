//! Quarto markdown for a single page.
//!
//! Top-level items are written in order. A tab group becomes a
//! `.panel-tabset` div whose tabs are headings, `###` for the outermost
//! tabset and one level deeper for each nested one. Charts are raw HTML
//! blocks that hand their Highcharts config to `dbrRenderChart`.

use crate::hierarchy::{build_hierarchy, HierarchyOptions, LayoutNode, TabLabels};
use crate::model::{ContentBlock, DashboardProject, Page, VizSpec};
use dbr_utils::text::{html_escape, js_string, yaml_quote};
use dbr_viz::Chart;
use std::collections::BTreeMap;

/// One generated `.qmd` file, named relative to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFile {
    pub file_name: String,
    pub content: String,
}

/// `overview.qmd`, `overview_p2.qmd`, ...
pub fn part_file_name(stem: &str, part: usize) -> String {
    if part <= 1 {
        format!("{}.qmd", stem)
    } else {
        format!("{}_p{}.qmd", stem, part)
    }
}

fn html_name(qmd: &str) -> String {
    qmd.trim_end_matches(".qmd").to_string() + ".html"
}

/// Replace `{{key}}` (or `{{ key }}`) with `params[key]`, plus `{{title}}`.
/// Placeholders without a value stay in the text.
pub fn fill_template(template: &str, title: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = after[..close].trim();
        match params.get(key).map(String::as_str).or((key == "title").then_some(title)) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

/// Write a page's `.qmd` files. `charts` maps content index to built chart.
pub fn render_page(
    project: &DashboardProject,
    page: &Page,
    charts: &BTreeMap<usize, Chart>,
) -> Vec<PageFile> {
    let stem = project.page_stem(page);
    let opts = HierarchyOptions {
        labels: TabLabels::new(&project.tabgroup_labels, &page.tabgroup_labels),
        ..Default::default()
    };
    let nodes = build_hierarchy(&page.content, &opts);

    // cut at pagination markers; the marker label titles the part it opens
    let mut parts: Vec<(Option<String>, Vec<&LayoutNode<'_>>)> = vec![(None, Vec::new())];
    for node in &nodes {
        match node {
            LayoutNode::Pagination { label, .. } => parts.push((label.clone(), Vec::new())),
            other => {
                if let Some((_, current)) = parts.last_mut() {
                    current.push(other);
                }
            }
        }
    }

    let names: Vec<String> = (1..=parts.len()).map(|i| part_file_name(&stem, i)).collect();
    let writer = Writer {
        project,
        stem: &stem,
        charts,
    };

    parts
        .iter()
        .enumerate()
        .map(|(i, (label, nodes))| {
            let mut out = front_matter(&page.name);
            if i == 0 {
                if let Some(text) = &page.text {
                    out.push_str(text.trim_end());
                    out.push_str("\n\n");
                }
            } else if let Some(label) = label {
                out.push_str(&format!("## {}\n\n", label));
            }
            for node in nodes {
                writer.node(&mut out, node);
            }
            if names.len() > 1 {
                out.push_str(&pagination_nav(&names, i));
            }
            PageFile {
                file_name: names[i].clone(),
                content: out,
            }
        })
        .collect()
}

/// A template page: the filled-in template text, as is.
pub fn render_template_page(project: &DashboardProject, page: &Page, template: &str) -> PageFile {
    let params = page
        .template
        .as_ref()
        .map(|t| t.params.clone())
        .unwrap_or_default();
    PageFile {
        file_name: part_file_name(&project.page_stem(page), 1),
        content: fill_template(template, &page.name, &params),
    }
}

fn front_matter(title: &str) -> String {
    format!("---\ntitle: {}\n---\n\n", yaml_quote(title))
}

fn pagination_nav(names: &[String], current: usize) -> String {
    let link = |target: Option<&String>, text: &str| match target {
        Some(name) => format!("<a href=\"{}\">{}</a>", html_name(name), text),
        None => format!("<span class=\"dbr-page-disabled\">{}</span>", text),
    };
    let prev = current.checked_sub(1).and_then(|i| names.get(i));
    let next = names.get(current + 1);
    format!(
        "```{{=html}}\n<nav class=\"dbr-pagination\">\n{}\n<span class=\"dbr-page-info\">Page {} of {}</span>\n{}\n</nav>\n```\n",
        link(prev, "&laquo; Previous"),
        current + 1,
        names.len(),
        link(next, "Next &raquo;"),
    )
}

struct Writer<'w> {
    project: &'w DashboardProject,
    stem: &'w str,
    charts: &'w BTreeMap<usize, Chart>,
}

impl Writer<'_> {
    fn node(&self, out: &mut String, node: &LayoutNode<'_>) {
        match node {
            LayoutNode::Item { index, block, .. } => self.block(out, *index, block),
            LayoutNode::Group { children, .. } => self.tabset(out, children, 0),
            LayoutNode::Pagination { .. } => {}
        }
    }

    fn tabset(&self, out: &mut String, children: &[LayoutNode<'_>], depth: usize) {
        let heading = "#".repeat((3 + depth).min(6));
        out.push_str(&format!(
            "::: {{.panel-tabset .{}}}\n\n",
            self.project.tabset_theme.css_class()
        ));
        for (n, child) in children.iter().enumerate() {
            match child {
                LayoutNode::Item {
                    index,
                    block,
                    tab_label,
                } => {
                    let title = tab_label
                        .clone()
                        .or_else(|| block_title(block))
                        .unwrap_or_else(|| format!("Tab {}", n + 1));
                    out.push_str(&format!("{} {}\n\n", heading, title));
                    self.block(out, *index, block);
                }
                LayoutNode::Group {
                    label, children, ..
                } => {
                    out.push_str(&format!("{} {}\n\n", heading, label));
                    self.tabset(out, children, depth + 1);
                }
                LayoutNode::Pagination { .. } => {}
            }
        }
        out.push_str(":::\n\n");
    }

    fn block(&self, out: &mut String, index: usize, block: &ContentBlock) {
        match block {
            ContentBlock::Viz(viz) => self.viz(out, index, viz),
            ContentBlock::Text { markdown, .. } => {
                out.push_str(markdown.trim_end());
                out.push_str("\n\n");
            }
            ContentBlock::Callout {
                kind, title, body, ..
            } => {
                out.push_str(&format!("::: {{.callout-{}}}\n", kind.as_str()));
                if let Some(title) = title {
                    out.push_str(&format!("## {}\n\n", title));
                }
                out.push_str(body.trim_end());
                out.push_str("\n:::\n\n");
            }
            ContentBlock::Divider => out.push_str("---\n\n"),
            ContentBlock::Pagination { .. } => {}
        }
    }

    fn viz(&self, out: &mut String, index: usize, viz: &VizSpec) {
        if let Some(text) = &viz.text_before {
            out.push_str(text.trim_end());
            out.push_str("\n\n");
        }
        if let Some(chart) = self.charts.get(&index) {
            let id = format!("dbr-{}-{}", self.stem, index + 1);
            let height = viz
                .height
                .or(viz.chart.common().height)
                .unwrap_or(self.project.chart_height);
            let config = chart.to_js_object().replace("</", "<\\/");
            out.push_str(&format!(
                "```{{=html}}\n<div id=\"{id}\" class=\"dbr-chart\" style=\"height: {height}px;\" aria-label=\"{label}\"></div>\n<script>\ndbrRenderChart({js_id}, {config});\n</script>\n```\n\n",
                id = id,
                height = height,
                label = html_escape(viz.display_title().unwrap_or(viz.chart.type_name())),
                js_id = js_string(&id),
                config = config,
            ));
        }
        if let Some(text) = &viz.text_after {
            out.push_str(text.trim_end());
            out.push_str("\n\n");
        }
    }
}

fn block_title(block: &ContentBlock) -> Option<String> {
    match block {
        ContentBlock::Viz(v) => v.display_title().map(str::to_string),
        ContentBlock::Callout { title, .. } => title.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CalloutKind;
    use dbr_data::DataFrame;
    use dbr_viz::{ChartSpec, PieParams};

    fn pie(title: &str) -> VizSpec {
        VizSpec::new(ChartSpec::Pie(PieParams::new("party"))).title(title)
    }

    fn built(page: &Page) -> BTreeMap<usize, Chart> {
        let df = DataFrame::from_records(&["party"], &[&["A"], &["B"]]).unwrap();
        page.content
            .iter()
            .enumerate()
            .filter_map(|(i, b)| match b {
                ContentBlock::Viz(v) => Some((i, v.chart.build(&df).unwrap())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fill_template() {
        let mut params = BTreeMap::new();
        params.insert("wave".to_string(), "3".to_string());
        assert_eq!(
            fill_template("# {{title}} / wave {{ wave }} / {{unknown}} / {{", "Trust", &params),
            "# Trust / wave 3 / {{unknown}} / {{"
        );
    }

    #[test]
    fn tabs_nest_with_deeper_headings() {
        let page = Page::new("Overview")
            .text("Welcome")
            .add_viz(pie("Top").tabgroup("a"))
            .add_viz(pie("Inner one").tabgroup("a/b"))
            .add_viz(pie("Inner two").tabgroup("a/b"))
            .add_callout(CalloutKind::Tip, Some("Note"), "Read me");
        let project = DashboardProject::new("T", "out")
            .tabgroup_label("b", "Breakdown")
            .add_page(page);
        let page = &project.pages[0];
        let files = render_page(&project, page, &built(page));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "index.qmd");
        let qmd = &files[0].content;
        assert!(qmd.starts_with("---\ntitle: \"Overview\"\n---\n\nWelcome\n\n"));
        assert!(qmd.contains("::: {.panel-tabset .dbr-tabset-default}"));
        assert!(qmd.contains("### Top\n"));
        assert!(qmd.contains("### Breakdown\n"));
        assert!(qmd.contains("#### Inner one\n"));
        assert!(qmd.contains("dbrRenderChart('dbr-index-2', {"));
        assert!(qmd.contains("::: {.callout-tip}\n## Note\n\nRead me\n:::"));
        assert!(qmd.find("Inner one").unwrap() < qmd.find("Inner two").unwrap());
    }

    #[test]
    fn pagination_writes_linked_parts() {
        let project = DashboardProject::new("T", "out")
            .add_page(Page::new("Home"))
            .add_page(
                Page::new("Key Results")
                    .text("Intro")
                    .add_viz(pie("One"))
                    .add_pagination(Some("Details"))
                    .add_viz(pie("Two")),
            );
        let page = &project.pages[1];
        let files = render_page(&project, page, &built(page));
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["key_results.qmd", "key_results_p2.qmd"]);
        assert!(files[0].content.contains("Intro"));
        assert!(!files[1].content.contains("Intro"));
        assert!(files[1].content.contains("## Details"));
        assert!(files[0].content.contains("<a href=\"key_results_p2.html\">Next &raquo;</a>"));
        assert!(files[1].content.contains("Page 2 of 2"));
        assert!(files[1].content.contains("<a href=\"key_results.html\">&laquo; Previous</a>"));
    }

    #[test]
    fn script_close_in_titles_is_escaped() {
        let project = DashboardProject::new("T", "out")
            .add_page(Page::new("P").add_viz(pie("</script><b>")));
        let page = &project.pages[0];
        let files = render_page(&project, page, &built(page));
        assert!(!files[0].content.contains("</script><b>"));
    }

    #[test]
    fn template_page_is_filled() {
        let project = DashboardProject::new("T", "out")
            .add_page(Page::new("Home"))
            .add_page(Page::new("About Us").template("about.qmd", &[("org", "ACME")]));
        let file = render_template_page(&project, &project.pages[1], "# {{title}} at {{org}}\n");
        assert_eq!(file.file_name, "about_us.qmd");
        assert_eq!(file.content, "# About Us at ACME\n");
    }
}
