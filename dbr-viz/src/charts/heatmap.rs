//! Heatmap of an aggregated numeric value over two categorical axes.
//!
//! Missing categories are dropped by default. With `include_na` they are
//! kept under `na_label_x` / `na_label_y` (default `"(Missing)"`) and sorted
//! last unless `x_order` / `y_order` place them.

use super::{axis_title, category_column, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::Result;
use crate::palette::{Palette, DEFAULT_SEQUENTIAL};
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapAgg {
    #[default]
    Mean,
    Sum,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapParams {
    pub x_var: String,
    pub y_var: String,
    pub value_var: String,
    #[serde(default)]
    pub agg: HeatmapAgg,
    #[serde(default)]
    pub x_order: Option<Vec<String>>,
    #[serde(default)]
    pub y_order: Option<Vec<String>>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label_x: Option<String>,
    #[serde(default)]
    pub na_label_y: Option<String>,
    #[serde(default)]
    pub color_min: Option<f64>,
    #[serde(default)]
    pub color_max: Option<f64>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl HeatmapParams {
    pub fn new(x_var: &str, y_var: &str, value_var: &str) -> Self {
        Self {
            x_var: x_var.to_string(),
            y_var: y_var.to_string(),
            value_var: value_var.to_string(),
            agg: HeatmapAgg::default(),
            x_order: None,
            y_order: None,
            include_na: false,
            na_label_x: None,
            na_label_y: None,
            color_min: None,
            color_max: None,
            common: CommonOptions::default(),
        }
    }
}

pub fn create_heatmap(df: &DataFrame, p: &HeatmapParams) -> Result<Chart> {
    df.require_columns(&[p.x_var.as_str(), p.y_var.as_str(), p.value_var.as_str()])?;
    let values = df.numeric(&p.value_var)?;

    let na_x = NaPolicy::new(p.include_na, p.na_label_x.as_deref());
    let na_y = NaPolicy::new(p.include_na, p.na_label_y.as_deref());
    let xs = category_column(df, &p.x_var, &na_x)?;
    let ys = category_column(df, &p.y_var, &na_y)?;

    let mut tally = Tally::new();
    for ((x, y), v) in xs.iter().zip(&ys).zip(&values) {
        if let (Some(x), Some(y), Some(v)) = (x, y, v) {
            tally.add((x.clone(), y.clone()), *v);
        }
    }

    let x_levels = order_levels(
        &unique(tally.keys().iter().map(|(x, _)| x)),
        p.x_order.as_deref(),
        na_x.trailing_label(),
    );
    let y_levels = order_levels(
        &unique(tally.keys().iter().map(|(_, y)| y)),
        p.y_order.as_deref(),
        na_y.trailing_label(),
    );

    let mut data: Vec<Value> = Vec::new();
    let mut cell_values: Vec<f64> = Vec::new();
    for (xi, x) in x_levels.iter().enumerate() {
        for (yi, y) in y_levels.iter().enumerate() {
            let key = (x.clone(), y.clone());
            if tally.count(&key) == 0 {
                continue;
            }
            let v = match p.agg {
                HeatmapAgg::Mean => tally.mean(&key).unwrap_or(0.0),
                HeatmapAgg::Sum => tally.sum(&key),
                HeatmapAgg::Count => tally.count(&key) as f64,
            };
            let v = round_to(v, 4);
            cell_values.push(v);
            data.push(json!([xi, yi, v]));
        }
    }

    let data_min = cell_values.iter().copied().fold(f64::INFINITY, f64::min);
    let data_max = cell_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut color_axis = json!({
        "stops": Palette::new(&p.common.color_palette, &DEFAULT_SEQUENTIAL).stops(),
    });
    if let Some(min) = p.color_min.or(data_min.is_finite().then_some(data_min)) {
        color_axis["min"] = json!(min);
    }
    if let Some(max) = p.color_max.or(data_max.is_finite().then_some(data_max)) {
        color_axis["max"] = json!(max);
    }

    let decimals = p.common.decimals.unwrap_or(1);
    let mut options = base_options("heatmap", &p.common);
    options["xAxis"] = json!({
        "categories": x_levels,
        "title": { "text": axis_title(&p.common.x_label, &p.x_var) },
    });
    options["yAxis"] = json!({
        "categories": y_levels,
        "title": { "text": axis_title(&p.common.y_label, &p.y_var) },
        "reversed": true,
    });
    options["colorAxis"] = color_axis;
    options["legend"] = json!({
        "align": "right",
        "layout": "vertical",
        "verticalAlign": "middle",
    });
    options["series"] = json!([{
        "name": p.common.title.clone().unwrap_or_else(|| p.value_var.clone()),
        "borderWidth": 1,
        "data": data,
        "dataLabels": {
            "enabled": p.common.data_labels,
            "format": format!("{{point.value:.{}f}}", decimals),
        },
    }]);

    let mut chart = Chart::new(options);
    attach_tooltip(&mut chart, &p.common, "{x} / {y}: {value}", TooltipContext::Heatmap);
    Ok(chart)
}
