//! Waffle chart: a grid of `total` squares split across categories.
//!
//! Each category gets its rounded share of the grid. Whatever rounding
//! leaves over (or overshoots) is settled on the largest category so the
//! grid always has exactly `total` squares.

use super::{category_column, row_weights, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::{Result, VizError};
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn default_total() -> usize {
    100
}

fn default_rows() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaffleParams {
    pub x_var: String,
    #[serde(default)]
    pub y_var: Option<String>,
    #[serde(default = "default_total")]
    pub total: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default)]
    pub x_order: Option<Vec<String>>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl WaffleParams {
    pub fn new(x_var: &str) -> Self {
        Self {
            x_var: x_var.to_string(),
            y_var: None,
            total: default_total(),
            rows: default_rows(),
            x_order: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

/// Split `total` squares across weighted categories.
///
/// Shares are rounded; the difference to `total` is added to (or taken
/// from) the largest category first. Ties go to the earlier category.
/// Categories with a weight of zero or less get no squares.
pub fn waffle_counts(weights: &[(String, f64)], total: usize) -> Vec<(String, usize)> {
    let positive = |w: f64| if w > 0.0 { w } else { 0.0 };
    let sum: f64 = weights.iter().map(|(_, w)| positive(*w)).sum();
    if weights.is_empty() || sum <= 0.0 {
        return weights.iter().map(|(k, _)| (k.clone(), 0)).collect();
    }

    let mut squares: Vec<i64> = weights
        .iter()
        .map(|(_, w)| (positive(*w) / sum * total as f64).round() as i64)
        .collect();

    let mut by_weight: Vec<usize> = (0..weights.len()).collect();
    by_weight.sort_by(|&a, &b| weights[b].1.total_cmp(&weights[a].1));

    let mut diff = total as i64 - squares.iter().sum::<i64>();
    if diff > 0 {
        squares[by_weight[0]] += diff;
    } else {
        for &i in &by_weight {
            if diff == 0 {
                break;
            }
            let take = squares[i].min(-diff);
            squares[i] -= take;
            diff += take;
        }
    }

    weights
        .iter()
        .zip(squares)
        .map(|((k, _), n)| (k.clone(), n.max(0) as usize))
        .collect()
}

pub fn viz_waffle(df: &DataFrame, p: &WaffleParams) -> Result<Chart> {
    if p.total == 0 {
        return Err(VizError::InvalidParameter {
            chart: "waffle",
            name: "total",
            reason: "must be at least 1".to_string(),
        });
    }
    if p.rows == 0 {
        return Err(VizError::InvalidParameter {
            chart: "waffle",
            name: "rows",
            reason: "must be at least 1".to_string(),
        });
    }
    let mut required = vec![p.x_var.as_str()];
    if let Some(y) = &p.y_var {
        required.push(y);
    }
    df.require_columns(&required)?;

    let na = NaPolicy::new(p.include_na, p.na_label.as_deref());
    let xs = category_column(df, &p.x_var, &na)?;
    let weights = row_weights(df, p.y_var.as_deref())?;

    let mut tally = Tally::new();
    for (x, w) in xs.iter().zip(&weights) {
        if let (Some(x), Some(w)) = (x, w) {
            if *w < 0.0 {
                return Err(VizError::InvalidParameter {
                    chart: "waffle",
                    name: "y_var",
                    reason: format!("negative weight {} for '{}'", w, x),
                });
            }
            tally.add(x.clone(), *w);
        }
    }
    if tally.total_sum() <= 0.0 {
        return Err(VizError::InsufficientData {
            chart: "waffle",
            reason: format!("no positive values in '{}'", p.x_var),
        });
    }

    let levels = order_levels(&unique(tally.keys()), p.x_order.as_deref(), na.trailing_label());
    let weighted: Vec<(String, f64)> = levels.iter().map(|l| (l.clone(), tally.sum(l))).collect();
    let counts = waffle_counts(&weighted, p.total);

    let columns = p.total.div_ceil(p.rows);
    let palette = p.common.palette();
    let mut cell = 0usize;
    let mut series: Vec<Value> = Vec::new();
    for (i, ((name, squares), (_, weight))) in counts.iter().zip(&weighted).enumerate() {
        let color = palette.color(i);
        let data: Vec<Value> = (0..*squares)
            .map(|_| {
                let point = json!({
                    "x": cell % columns,
                    "y": cell / columns,
                    "value": 1,
                    "name": name,
                    "raw": round_to(*weight, 4),
                    "color": color,
                });
                cell += 1;
                point
            })
            .collect();
        series.push(json!({
            "name": name,
            "color": color,
            "borderWidth": 2,
            "borderColor": "#ffffff",
            "data": data,
        }));
    }

    let mut options = base_options("heatmap", &p.common);
    options["xAxis"] = json!({ "visible": false, "min": 0, "max": columns.saturating_sub(1) });
    options["yAxis"] = json!({ "visible": false, "reversed": true, "title": null });
    options["legend"] = json!({ "enabled": true });
    options["series"] = Value::Array(series);

    let mut chart = Chart::new(options);
    attach_tooltip(&mut chart, &p.common, "{name}: {raw}", TooltipContext::Point);
    Ok(chart)
}
