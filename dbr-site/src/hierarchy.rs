//! Nesting a page's flat content list into tab groups.
//!
//! Blocks tagged with a [`TabPath`] are placed under one group node per
//! path prefix; untagged blocks stay at the top level. Groups are created on
//! first use, so every level keeps the order in which its first member
//! appeared. Pagination markers cut the list into segments that are laid out
//! independently and rejoined with the marker in between.

use crate::model::{ContentBlock, TabPath};
use dbr_utils::text::slugify;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode<'a> {
    Item {
        /// Position of the block in the page content.
        index: usize,
        block: &'a ContentBlock,
        /// Tab heading when the item sits inside a tabset.
        tab_label: Option<String>,
    },
    Group {
        id: String,
        path: TabPath,
        label: String,
        children: Vec<LayoutNode<'a>>,
    },
    Pagination {
        index: usize,
        label: Option<String>,
    },
}

impl LayoutNode<'_> {
    /// Index of the first block under this node.
    pub fn first_index(&self) -> usize {
        match self {
            LayoutNode::Item { index, .. } | LayoutNode::Pagination { index, .. } => *index,
            LayoutNode::Group { children, .. } => {
                children.iter().map(|c| c.first_index()).min().unwrap_or(usize::MAX)
            }
        }
    }

    /// Block indices in display order.
    pub fn item_indices(&self) -> Vec<usize> {
        match self {
            LayoutNode::Item { index, .. } => vec![*index],
            LayoutNode::Pagination { .. } => Vec::new(),
            LayoutNode::Group { children, .. } => {
                children.iter().flat_map(|c| c.item_indices()).collect()
            }
        }
    }
}

/// Display labels for tab groups.
///
/// Page entries win over project entries. A path is looked up in full
/// (`"a/b"`), then by its last segment (`"b"`); without a match the segment
/// itself is the label. Keys are also tried case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TabLabels {
    labels: BTreeMap<String, String>,
}

impl TabLabels {
    pub fn new(project: &BTreeMap<String, String>, page: &BTreeMap<String, String>) -> Self {
        let mut labels = BTreeMap::new();
        for (k, v) in project.iter().chain(page) {
            labels.insert(TabPath::parse(k).to_string(), v.clone());
        }
        Self { labels }
    }

    fn lookup(&self, key: &str) -> Option<&String> {
        self.labels.get(key).or_else(|| {
            self.labels
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    pub fn resolve(&self, path: &TabPath) -> String {
        let segment = path.last().unwrap_or_default();
        self.lookup(&path.to_string())
            .or_else(|| self.lookup(segment))
            .cloned()
            .unwrap_or_else(|| segment.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyOptions {
    /// Collapse a group holding a single item into that item.
    pub flatten_single_child: bool,
    /// Split a group's items into sub-tabs when they carry different filters.
    pub group_by_filter: bool,
    pub labels: TabLabels,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            flatten_single_child: true,
            group_by_filter: true,
            labels: TabLabels::default(),
        }
    }
}

pub fn build_hierarchy<'a>(blocks: &'a [ContentBlock], opts: &HierarchyOptions) -> Vec<LayoutNode<'a>> {
    let mut out = Vec::new();
    let mut segment: Vec<(usize, &'a ContentBlock)> = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        if let ContentBlock::Pagination { label } = block {
            out.extend(build_segment(&segment, opts));
            segment.clear();
            out.push(LayoutNode::Pagination {
                index,
                label: label.clone(),
            });
        } else {
            segment.push((index, block));
        }
    }
    out.extend(build_segment(&segment, opts));
    out
}

fn build_segment<'a>(items: &[(usize, &'a ContentBlock)], opts: &HierarchyOptions) -> Vec<LayoutNode<'a>> {
    let mut roots: Vec<LayoutNode<'a>> = Vec::new();
    for &(index, block) in items {
        let item = LayoutNode::Item {
            index,
            block,
            tab_label: explicit_tab_label(block),
        };
        match block.tabgroup() {
            Some(path) => insert(&mut roots, path, 1, item, opts),
            None => roots.push(item),
        }
    }
    if opts.group_by_filter {
        for node in &mut roots {
            split_by_filter(node, opts);
        }
    }
    if opts.flatten_single_child {
        roots = roots.into_iter().map(flatten).collect();
    }
    roots
}

fn explicit_tab_label(block: &ContentBlock) -> Option<String> {
    match block {
        ContentBlock::Viz(v) => v.tab_label.clone(),
        _ => None,
    }
}

fn group_id(path: &TabPath) -> String {
    format!("tabgroup-{}", slugify(&path.segments().join(" ")))
}

/// Walk down `path`, creating missing groups, and append `item` at the end.
fn insert<'a>(
    siblings: &mut Vec<LayoutNode<'a>>,
    path: &TabPath,
    depth: usize,
    item: LayoutNode<'a>,
    opts: &HierarchyOptions,
) {
    let prefix = path.prefix(depth);
    let existing = siblings
        .iter()
        .position(|n| matches!(n, LayoutNode::Group { path: p, .. } if *p == prefix));
    let at = match existing {
        Some(i) => i,
        None => {
            siblings.push(LayoutNode::Group {
                id: group_id(&prefix),
                label: opts.labels.resolve(&prefix),
                path: prefix,
                children: Vec::new(),
            });
            siblings.len() - 1
        }
    };
    if let LayoutNode::Group { children, .. } = &mut siblings[at] {
        if depth == path.depth() {
            children.push(item);
        } else {
            insert(children, path, depth + 1, item, opts);
        }
    }
}

/// Move filtered items of a group into one synthetic sub-group per filter
/// when its direct items use two or more different filters. Unfiltered
/// items stay where they are.
fn split_by_filter(node: &mut LayoutNode<'_>, opts: &HierarchyOptions) {
    let LayoutNode::Group { path, children, .. } = node else {
        return;
    };
    for child in children.iter_mut() {
        split_by_filter(child, opts);
    }

    let mut signatures: Vec<String> = Vec::new();
    for child in children.iter() {
        if let LayoutNode::Item { block, .. } = child {
            if let Some(f) = block.filter() {
                let sig = f.signature();
                if !signatures.contains(&sig) {
                    signatures.push(sig);
                }
            }
        }
    }
    if signatures.len() < 2 {
        return;
    }

    // synthetic groups are keyed by signature; labels may repeat
    let mut regrouped: Vec<LayoutNode<'_>> = Vec::new();
    let mut slots: Vec<(String, usize)> = Vec::new();
    for child in std::mem::take(children) {
        let filter = match &child {
            LayoutNode::Item { block, .. } => block.filter(),
            _ => None,
        };
        let Some(filter) = filter else {
            regrouped.push(child);
            continue;
        };
        let sig = filter.signature();
        if let Some((_, slot)) = slots.iter().find(|(s, _)| *s == sig) {
            if let LayoutNode::Group { children, .. } = &mut regrouped[*slot] {
                children.push(child);
            }
            continue;
        }
        let n = signatures.iter().position(|s| *s == sig).unwrap_or(slots.len()) + 1;
        let sub_path = path.child(&filter.label());
        slots.push((sig, regrouped.len()));
        regrouped.push(LayoutNode::Group {
            id: format!("{}-f{}", group_id(path), n),
            label: opts.labels.resolve(&sub_path),
            path: sub_path,
            children: vec![child],
        });
    }
    *children = regrouped;
}

fn flatten(node: LayoutNode<'_>) -> LayoutNode<'_> {
    match node {
        LayoutNode::Group {
            id,
            path,
            label,
            children,
        } => {
            let mut children: Vec<LayoutNode<'_>> = children.into_iter().map(flatten).collect();
            if children.len() == 1 && matches!(children[0], LayoutNode::Item { .. }) {
                if let Some(LayoutNode::Item {
                    index,
                    block,
                    tab_label,
                }) = children.pop()
                {
                    return LayoutNode::Item {
                        index,
                        block,
                        tab_label: tab_label.or(Some(label)),
                    };
                }
            }
            LayoutNode::Group {
                id,
                path,
                label,
                children,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VizSpec;
    use dbr_data::Filter;
    use dbr_viz::{ChartSpec, PieParams};

    fn viz(tabgroup: &str) -> ContentBlock {
        ContentBlock::Viz(VizSpec::new(ChartSpec::Pie(PieParams::new("x"))).tabgroup(tabgroup))
    }

    fn filtered(tabgroup: &str, wave: &str) -> ContentBlock {
        ContentBlock::Viz(
            VizSpec::new(ChartSpec::Pie(PieParams::new("x")))
                .tabgroup(tabgroup)
                .filter(Filter::eq("wave", wave)),
        )
    }

    fn group_parts<'n, 'a>(node: &'n LayoutNode<'a>) -> (&'n str, &'n [LayoutNode<'a>]) {
        match node {
            LayoutNode::Group { label, children, .. } => (label.as_str(), children.as_slice()),
            other => panic!("expected group, got {:?}", other),
        }
    }

    fn item_index(node: &LayoutNode<'_>) -> usize {
        match node {
            LayoutNode::Item { index, .. } => *index,
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn nested_groups_keep_insertion_order() {
        let blocks = vec![viz("a"), viz("a/b"), viz("a/b"), viz("c")];
        let tree = build_hierarchy(&blocks, &HierarchyOptions::default());

        assert_eq!(tree.len(), 2);
        let (label, children) = group_parts(&tree[0]);
        assert_eq!(label, "a");
        assert_eq!(children.len(), 2);
        assert_eq!(item_index(&children[0]), 0);
        let (label, nested) = group_parts(&children[1]);
        assert_eq!(label, "b");
        assert_eq!(nested.iter().map(item_index).collect::<Vec<_>>(), vec![1, 2]);

        // "c" holds a single item and collapses into it
        assert_eq!(item_index(&tree[1]), 3);
        match &tree[1] {
            LayoutNode::Item { tab_label, .. } => assert_eq!(tab_label.as_deref(), Some("c")),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn untagged_blocks_stay_top_level_between_groups() {
        let blocks = vec![
            ContentBlock::Text { markdown: "intro".to_string(), tabgroup: None },
            viz("g"),
            ContentBlock::Divider,
            viz("g"),
        ];
        let tree = build_hierarchy(&blocks, &HierarchyOptions::default());
        assert_eq!(tree.len(), 3);
        assert_eq!(item_index(&tree[0]), 0);
        assert_eq!(tree[1].item_indices(), vec![1, 3]);
        assert_eq!(item_index(&tree[2]), 2);
    }

    #[test]
    fn flattening_can_be_disabled() {
        let blocks = vec![viz("c")];
        let opts = HierarchyOptions {
            flatten_single_child: false,
            ..Default::default()
        };
        let tree = build_hierarchy(&blocks, &opts);
        assert!(matches!(tree[0], LayoutNode::Group { .. }));
    }

    #[test]
    fn pagination_splits_segments() {
        let blocks = vec![
            viz("a"),
            ContentBlock::Pagination { label: Some("Part 2".to_string()) },
            viz("a"),
            viz("a"),
        ];
        let tree = build_hierarchy(&blocks, &HierarchyOptions::default());
        assert_eq!(tree.len(), 3);
        assert_eq!(item_index(&tree[0]), 0);
        assert_eq!(
            tree[1],
            LayoutNode::Pagination { index: 1, label: Some("Part 2".to_string()) }
        );
        assert_eq!(tree[2].item_indices(), vec![2, 3]);
    }

    #[test]
    fn labels_resolve_page_then_project() {
        let mut project = BTreeMap::new();
        project.insert("a".to_string(), "Project A".to_string());
        project.insert("b".to_string(), "Any B".to_string());
        let mut page = BTreeMap::new();
        page.insert("a/b".to_string(), "Page A/B".to_string());
        let labels = TabLabels::new(&project, &page);
        assert_eq!(labels.resolve(&TabPath::parse("a")), "Project A");
        assert_eq!(labels.resolve(&TabPath::parse("a/b")), "Page A/B");
        assert_eq!(labels.resolve(&TabPath::parse("c/b")), "Any B");
        assert_eq!(labels.resolve(&TabPath::parse("c")), "c");
        assert_eq!(labels.resolve(&TabPath::parse("A")), "Project A");
    }

    #[test]
    fn different_filters_become_sub_tabs() {
        let blocks = vec![
            filtered("trust", "1"),
            viz("trust"),
            filtered("trust", "2"),
            filtered("trust", "1"),
        ];
        let opts = HierarchyOptions {
            flatten_single_child: false,
            ..Default::default()
        };
        let tree = build_hierarchy(&blocks, &opts);
        let (_, children) = group_parts(&tree[0]);
        assert_eq!(children.len(), 3);
        let (label, wave1) = group_parts(&children[0]);
        assert_eq!(label, "wave == 1");
        assert_eq!(wave1.iter().map(item_index).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(item_index(&children[1]), 1);
        let (label, _) = group_parts(&children[2]);
        assert_eq!(label, "wave == 2");
    }

    #[test]
    fn one_shared_filter_is_left_alone() {
        let blocks = vec![filtered("t", "1"), filtered("t", "1")];
        let tree = build_hierarchy(&blocks, &HierarchyOptions::default());
        assert_eq!(group_parts(&tree[0]).1.len(), 2);
    }

    #[test]
    fn same_label_different_filters_stay_apart() {
        let labelled = |wave: &str| {
            ContentBlock::Viz(
                VizSpec::new(ChartSpec::Pie(PieParams::new("x")))
                    .tabgroup("t")
                    .filter(Filter::eq("wave", wave).with_label("Wave")),
            )
        };
        let blocks = vec![labelled("1"), labelled("2"), labelled("1")];
        let opts = HierarchyOptions {
            flatten_single_child: false,
            ..Default::default()
        };
        let tree = build_hierarchy(&blocks, &opts);
        let (_, children) = group_parts(&tree[0]);
        assert_eq!(children.len(), 2);
        assert_eq!(group_parts(&children[0]).1.iter().map(item_index).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(group_parts(&children[1]).1.iter().map(item_index).collect::<Vec<_>>(), vec![1]);
        let ids: Vec<&str> = children
            .iter()
            .map(|c| match c {
                LayoutNode::Group { id, .. } => id.as_str(),
                other => panic!("expected group, got {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec!["tabgroup-t-f1", "tabgroup-t-f2"]);
    }
}
