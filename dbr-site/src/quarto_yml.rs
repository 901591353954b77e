//! `_quarto.yml` for the dashboard website.

use crate::assets::{CSS_FILE, HIGHCHARTS_SCRIPTS, JS_FILE};
use crate::model::{DashboardProject, NavAlign, Page};
use crate::qmd::part_file_name;
use dbr_utils::text::yaml_quote;

/// Quarto renders the site into this directory, relative to the output dir.
pub const RENDER_DIR: &str = "docs";

pub fn render_quarto_yml(project: &DashboardProject) -> String {
    let mut y = String::new();
    y.push_str("project:\n  type: website\n");
    y.push_str(&format!("  output-dir: {}\n\n", RENDER_DIR));

    if let Some(author) = &project.author {
        y.push_str(&format!("author: {}\n\n", yaml_quote(author)));
    }

    y.push_str("website:\n");
    y.push_str(&format!("  title: {}\n", yaml_quote(&project.title)));
    if let Some(description) = &project.description {
        y.push_str(&format!("  description: {}\n", yaml_quote(description)));
    }
    if let Some(favicon) = &project.favicon {
        y.push_str(&format!("  favicon: {}\n", yaml_quote(favicon)));
    }
    y.push_str(&format!("  search: {}\n", project.search));
    y.push_str(&format!("  page-navigation: {}\n", project.page_navigation));
    y.push_str(&format!("  back-to-top-navigation: {}\n", project.back_to_top));
    y.push_str(&format!("  reader-mode: {}\n", project.reader_mode));
    y.push_str(&format!("  bread-crumbs: {}\n", project.breadcrumbs));
    if let Some(ga) = &project.google_analytics {
        y.push_str(&format!("  google-analytics: {}\n", yaml_quote(ga)));
    }
    if let Some(footer) = &project.page_footer {
        y.push_str(&format!("  page-footer: {}\n", yaml_quote(footer)));
    }

    navbar(&mut y, project);
    sidebar(&mut y, project);

    y.push_str("\nformat:\n  html:\n");
    y.push_str(&format!("    theme: {}\n", project.theme));
    y.push_str("    css:\n");
    y.push_str(&format!("      - {}\n", CSS_FILE));
    for css in &project.custom_css {
        y.push_str(&format!("      - {}\n", yaml_quote(css)));
    }
    y.push_str(&format!("    toc: {}\n", project.toc));
    y.push_str("    include-in-header:\n      - text: |\n");
    for src in HIGHCHARTS_SCRIPTS.iter().copied().chain([JS_FILE]) {
        y.push_str(&format!("          <script src=\"{}\"></script>\n", src));
    }
    y
}

fn page_entry(y: &mut String, project: &DashboardProject, page: &Page, indent: &str) {
    let href = part_file_name(&project.page_stem(page), 1);
    y.push_str(&format!("{}- href: {}\n", indent, href));
    y.push_str(&format!("{}  text: {}\n", indent, yaml_quote(&page.name)));
    if let Some(icon) = &page.icon {
        y.push_str(&format!("{}  icon: {}\n", indent, yaml_quote(icon)));
    }
}

fn navbar(y: &mut String, project: &DashboardProject) {
    y.push_str("  navbar:\n");
    if let Some(bg) = &project.navbar_bg {
        y.push_str(&format!("    background: {}\n", yaml_quote(bg)));
    }
    if let Some(logo) = &project.logo {
        y.push_str(&format!("    logo: {}\n", yaml_quote(logo)));
    }

    let in_section = |page: &Page| {
        project
            .navbar_sections
            .iter()
            .any(|s| s.pages.iter().any(|p| *p == page.name))
    };

    y.push_str("    left:\n");
    for page in project
        .pages
        .iter()
        .filter(|p| p.navbar_align == NavAlign::Left && !in_section(*p))
    {
        page_entry(y, project, page, "      ");
    }
    for section in &project.navbar_sections {
        y.push_str(&format!("      - text: {}\n", yaml_quote(&section.text)));
        if let Some(icon) = &section.icon {
            y.push_str(&format!("        icon: {}\n", yaml_quote(icon)));
        }
        y.push_str("        menu:\n");
        for page in section.pages.iter().filter_map(|name| project.page(name)) {
            page_entry(y, project, page, "          ");
        }
    }

    let right: Vec<&Page> = project
        .pages
        .iter()
        .filter(|p| p.navbar_align == NavAlign::Right && !in_section(*p))
        .collect();
    let socials: Vec<(&str, &String)> = [
        ("github", &project.github),
        ("twitter", &project.twitter),
        ("linkedin", &project.linkedin),
    ]
    .into_iter()
    .filter_map(|(icon, url)| url.as_ref().map(|u| (icon, u)))
    .collect();
    if right.is_empty() && socials.is_empty() {
        return;
    }
    y.push_str("    right:\n");
    for page in right {
        page_entry(y, project, page, "      ");
    }
    for (icon, url) in socials {
        y.push_str(&format!("      - icon: {}\n        href: {}\n", icon, yaml_quote(url)));
    }
}

fn sidebar(y: &mut String, project: &DashboardProject) {
    if project.sidebar_groups.is_empty() {
        return;
    }
    y.push_str("  sidebar:\n");
    for group in &project.sidebar_groups {
        y.push_str(&format!("    - title: {}\n      contents:\n", yaml_quote(&group.title)));
        for page in group.pages.iter().filter_map(|name| project.page(name)) {
            y.push_str(&format!(
                "        - {}\n",
                part_file_name(&project.page_stem(page), 1)
            ));
        }
    }
}

/// Page names listed as navbar `text:` entries, in file order.
pub fn navbar_texts(yml: &str) -> Vec<String> {
    let mut texts = Vec::new();
    let mut in_navbar = false;
    for line in yml.lines() {
        let trimmed = line.trim_start();
        if line.starts_with("  navbar:") {
            in_navbar = true;
            continue;
        }
        if in_navbar && !line.starts_with("   ") {
            break;
        }
        if in_navbar && trimmed.starts_with("text: ") && !line.contains("- text:") {
            let raw = trimmed.trim_start_matches("text: ");
            texts.push(raw.trim_matches('"').replace("\\\"", "\""));
        }
    }
    texts
}
