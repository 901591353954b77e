//! Chart builders, one module per chart type.
//!
//! [`ChartSpec`] is the serialisable description of a chart (tagged by
//! `type`), and [`ChartSpec::build`] dispatches to the matching builder.

pub mod density;
pub mod heatmap;
pub mod pie;
pub mod sankey;
pub mod stackedbar;
pub mod timeline;
pub mod treemap;
pub mod waffle;

use crate::chart::{Chart, CommonOptions};
use crate::error::Result;
use dbr_data::{DataFrame, NaPolicy};
use serde::{Deserialize, Serialize};

pub use density::{viz_density, DensityParams};
pub use heatmap::{create_heatmap, HeatmapAgg, HeatmapParams};
pub use pie::{viz_pie, PieParams};
pub use sankey::{viz_sankey, SankeyParams};
pub use stackedbar::{create_stackedbar, StackedBarParams, StackedType};
pub use timeline::{create_timeline, TimelineChartType, TimelineParams, YMode};
pub use treemap::{viz_treemap, TreemapParams};
pub use waffle::{viz_waffle, waffle_counts, WaffleParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    Stackedbar(StackedBarParams),
    Heatmap(HeatmapParams),
    Timeline(TimelineParams),
    Pie(PieParams),
    Sankey(SankeyParams),
    Waffle(WaffleParams),
    Treemap(TreemapParams),
    Density(DensityParams),
}

impl ChartSpec {
    pub fn build(&self, df: &DataFrame) -> Result<Chart> {
        match self {
            ChartSpec::Stackedbar(p) => create_stackedbar(df, p),
            ChartSpec::Heatmap(p) => create_heatmap(df, p),
            ChartSpec::Timeline(p) => create_timeline(df, p),
            ChartSpec::Pie(p) => viz_pie(df, p),
            ChartSpec::Sankey(p) => viz_sankey(df, p),
            ChartSpec::Waffle(p) => viz_waffle(df, p),
            ChartSpec::Treemap(p) => viz_treemap(df, p),
            ChartSpec::Density(p) => viz_density(df, p),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ChartSpec::Stackedbar(_) => "stackedbar",
            ChartSpec::Heatmap(_) => "heatmap",
            ChartSpec::Timeline(_) => "timeline",
            ChartSpec::Pie(_) => "pie",
            ChartSpec::Sankey(_) => "sankey",
            ChartSpec::Waffle(_) => "waffle",
            ChartSpec::Treemap(_) => "treemap",
            ChartSpec::Density(_) => "density",
        }
    }

    pub fn common(&self) -> &CommonOptions {
        match self {
            ChartSpec::Stackedbar(p) => &p.common,
            ChartSpec::Heatmap(p) => &p.common,
            ChartSpec::Timeline(p) => &p.common,
            ChartSpec::Pie(p) => &p.common,
            ChartSpec::Sankey(p) => &p.common,
            ChartSpec::Waffle(p) => &p.common,
            ChartSpec::Treemap(p) => &p.common,
            ChartSpec::Density(p) => &p.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut CommonOptions {
        match self {
            ChartSpec::Stackedbar(p) => &mut p.common,
            ChartSpec::Heatmap(p) => &mut p.common,
            ChartSpec::Timeline(p) => &mut p.common,
            ChartSpec::Pie(p) => &mut p.common,
            ChartSpec::Sankey(p) => &mut p.common,
            ChartSpec::Waffle(p) => &mut p.common,
            ChartSpec::Treemap(p) => &mut p.common,
            ChartSpec::Density(p) => &mut p.common,
        }
    }
}

/// A category column after applying the NA policy (`None` = drop the row).
pub(crate) fn category_column(
    df: &DataFrame,
    column: &str,
    na: &NaPolicy,
) -> Result<Vec<Option<String>>> {
    Ok(df.column(column)?.into_iter().map(|c| na.apply(c)).collect())
}

/// Row weights: the numeric weight column, or 1 per row.
pub(crate) fn row_weights(df: &DataFrame, weight_var: Option<&str>) -> Result<Vec<Option<f64>>> {
    match weight_var {
        Some(column) => Ok(df.numeric(column)?),
        None => Ok(vec![Some(1.0); df.len()]),
    }
}

/// Distinct values in first-appearance order.
pub(crate) fn unique<'a>(values: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

pub(crate) fn axis_title(label: &Option<String>, fallback: &str) -> String {
    label.clone().unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_spec_deserializes_from_tagged_json() {
        let spec: ChartSpec = serde_json::from_value(serde_json::json!({
            "type": "pie",
            "x_var": "party",
            "title": "Vote intention",
            "inner_size": "50%"
        }))
        .unwrap();
        assert_eq!(spec.type_name(), "pie");
        assert_eq!(spec.common().title.as_deref(), Some("Vote intention"));
        match spec {
            ChartSpec::Pie(p) => {
                assert_eq!(p.x_var, "party");
                assert_eq!(p.inner_size.as_deref(), Some("50%"));
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn chart_spec_dispatches_to_builder() {
        let df = DataFrame::from_records(&["party"], &[&["A"], &["B"], &["A"]]).unwrap();
        let spec = ChartSpec::Pie(PieParams::new("party"));
        let chart = spec.build(&df).unwrap();
        assert_eq!(chart.options["chart"]["type"], "pie");
    }

    #[test]
    fn unknown_column_is_reported() {
        let df = DataFrame::from_records(&["party"], &[&["A"]]).unwrap();
        let spec = ChartSpec::Pie(PieParams::new("vote"));
        let err = spec.build(&df).unwrap_err();
        assert!(err.to_string().contains("'vote'"), "{}", err);
    }
}
