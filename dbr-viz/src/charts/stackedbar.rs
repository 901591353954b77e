//! Stacked bar chart: counts of `stack_var` within each `x_var` category.

use super::{axis_title, category_column, row_weights, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::Result;
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackedType {
    #[default]
    Normal,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBarParams {
    pub x_var: String,
    pub stack_var: String,
    /// Optional survey weight column; rows count 1 each without it.
    #[serde(default)]
    pub weight_var: Option<String>,
    #[serde(default)]
    pub stacked_type: StackedType,
    #[serde(default)]
    pub horizontal: bool,
    #[serde(default)]
    pub x_order: Option<Vec<String>>,
    #[serde(default)]
    pub stack_order: Option<Vec<String>>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl StackedBarParams {
    pub fn new(x_var: &str, stack_var: &str) -> Self {
        Self {
            x_var: x_var.to_string(),
            stack_var: stack_var.to_string(),
            weight_var: None,
            stacked_type: StackedType::default(),
            horizontal: false,
            x_order: None,
            stack_order: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

pub fn create_stackedbar(df: &DataFrame, p: &StackedBarParams) -> Result<Chart> {
    let mut required = vec![p.x_var.as_str(), p.stack_var.as_str()];
    if let Some(w) = &p.weight_var {
        required.push(w);
    }
    df.require_columns(&required)?;

    let na = NaPolicy::new(p.include_na, p.na_label.as_deref());
    let xs = category_column(df, &p.x_var, &na)?;
    let stacks = category_column(df, &p.stack_var, &na)?;
    let weights = row_weights(df, p.weight_var.as_deref())?;

    let mut tally = Tally::new();
    for ((x, s), w) in xs.iter().zip(&stacks).zip(&weights) {
        if let (Some(x), Some(s), Some(w)) = (x, s, w) {
            tally.add((x.clone(), s.clone()), *w);
        }
    }

    let x_levels = order_levels(
        &unique(tally.keys().iter().map(|(x, _)| x)),
        p.x_order.as_deref(),
        na.trailing_label(),
    );
    let stack_levels = order_levels(
        &unique(tally.keys().iter().map(|(_, s)| s)),
        p.stack_order.as_deref(),
        na.trailing_label(),
    );

    let series: Vec<Value> = stack_levels
        .iter()
        .map(|s| {
            let data: Vec<f64> = x_levels
                .iter()
                .map(|x| round_to(tally.sum(&(x.clone(), s.clone())), 4))
                .collect();
            json!({ "name": s, "data": data })
        })
        .collect();

    let percent = p.stacked_type == StackedType::Percent;
    let mut options = base_options(if p.horizontal { "bar" } else { "column" }, &p.common);
    options["xAxis"] = json!({
        "categories": x_levels,
        "title": { "text": axis_title(&p.common.x_label, &p.x_var) },
    });
    options["yAxis"] = json!({
        "min": 0,
        "title": { "text": axis_title(&p.common.y_label, if percent { "Percentage" } else { "Count" }) },
        "labels": if percent { json!({ "format": "{value}%" }) } else { json!({}) },
    });
    options["plotOptions"] = json!({
        "series": {
            "stacking": if percent { "percent" } else { "normal" },
            "dataLabels": { "enabled": p.common.data_labels },
        }
    });
    options["series"] = Value::Array(series);

    let mut chart = Chart::new(options);
    let default_tooltip = if percent {
        "{category}<br>{series}: {percent}%"
    } else {
        "{category}<br>{series}: {y}"
    };
    attach_tooltip(&mut chart, &p.common, default_tooltip, TooltipContext::Category);
    Ok(chart)
}
