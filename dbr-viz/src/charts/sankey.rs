//! Sankey flows between the categories of two columns.
//!
//! Node ids are qualified by column so the same answer on both sides (e.g.
//! wave 1 → wave 2 of one question) stays two nodes instead of a cycle.
//! Both nodes share one colour.

use super::{category_column, row_weights, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::Result;
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyParams {
    pub from_var: String,
    pub to_var: String,
    /// Numeric column summed per link; links are row counts without it.
    #[serde(default)]
    pub value_var: Option<String>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl SankeyParams {
    pub fn new(from_var: &str, to_var: &str) -> Self {
        Self {
            from_var: from_var.to_string(),
            to_var: to_var.to_string(),
            value_var: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

fn node_id(column: &str, value: &str) -> String {
    format!("{}|{}", column, value)
}

pub fn viz_sankey(df: &DataFrame, p: &SankeyParams) -> Result<Chart> {
    let mut required = vec![p.from_var.as_str(), p.to_var.as_str()];
    if let Some(v) = &p.value_var {
        required.push(v);
    }
    df.require_columns(&required)?;

    let na = NaPolicy::new(p.include_na, p.na_label.as_deref());
    let froms = category_column(df, &p.from_var, &na)?;
    let tos = category_column(df, &p.to_var, &na)?;
    let weights = row_weights(df, p.value_var.as_deref())?;

    let mut links = Tally::new();
    for ((f, t), w) in froms.iter().zip(&tos).zip(&weights) {
        if let (Some(f), Some(t), Some(w)) = (f, t, w) {
            links.add((f.clone(), t.clone()), *w);
        }
    }

    let from_levels = order_levels(&unique(links.keys().iter().map(|(f, _)| f)), None, na.trailing_label());
    let to_levels = order_levels(&unique(links.keys().iter().map(|(_, t)| t)), None, na.trailing_label());

    // one colour per distinct label across both columns
    let palette = p.common.palette();
    let mut labels: Vec<&String> = Vec::new();
    for l in from_levels.iter().chain(&to_levels) {
        if !labels.contains(&l) {
            labels.push(l);
        }
    }
    let color_of = |label: &String| {
        let i = labels.iter().position(|l| *l == label).unwrap_or(0);
        palette.color(i).to_string()
    };

    let mut nodes: Vec<Value> = Vec::new();
    for (column, levels, side) in [(&p.from_var, &from_levels, 0), (&p.to_var, &to_levels, 1)] {
        for level in levels {
            nodes.push(json!({
                "id": node_id(column, level),
                "name": level,
                "color": color_of(level),
                "column": side,
            }));
        }
    }

    let data: Vec<Value> = links
        .keys()
        .iter()
        .map(|(f, t)| {
            let weight = round_to(links.sum(&(f.clone(), t.clone())), 4);
            json!([node_id(&p.from_var, f), node_id(&p.to_var, t), weight])
        })
        .collect();

    let mut options = base_options("sankey", &p.common);
    options["series"] = json!([{
        "type": "sankey",
        "name": p.common.title.clone().unwrap_or_else(|| "Flow".to_string()),
        "keys": ["from", "to", "weight"],
        "data": data,
        "nodes": nodes,
        "dataLabels": { "enabled": true },
    }]);

    let mut chart = Chart::new(options);
    // Highcharts' own link tooltip (from → to: weight) unless the user asks otherwise
    if p.common.tooltip.is_some() {
        attach_tooltip(&mut chart, &p.common, "{name}: {value}", TooltipContext::Point);
    }
    Ok(chart)
}
