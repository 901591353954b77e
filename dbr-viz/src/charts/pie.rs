//! Pie and donut charts of category counts or summed weights.

use super::{category_column, row_weights, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::Result;
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieParams {
    pub x_var: String,
    /// Numeric column summed per slice; slices are row counts without it.
    #[serde(default)]
    pub y_var: Option<String>,
    /// Donut hole, e.g. `"50%"`.
    #[serde(default)]
    pub inner_size: Option<String>,
    /// Largest slice first instead of category order.
    #[serde(default)]
    pub sort_desc: bool,
    #[serde(default)]
    pub x_order: Option<Vec<String>>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl PieParams {
    pub fn new(x_var: &str) -> Self {
        Self {
            x_var: x_var.to_string(),
            y_var: None,
            inner_size: None,
            sort_desc: false,
            x_order: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

pub fn viz_pie(df: &DataFrame, p: &PieParams) -> Result<Chart> {
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
            tally.add(x.clone(), *w);
        }
    }

    let mut levels = order_levels(&unique(tally.keys()), p.x_order.as_deref(), na.trailing_label());
    if p.sort_desc {
        levels.sort_by(|a, b| tally.sum(b).total_cmp(&tally.sum(a)));
    }

    let palette = p.common.palette();
    let data: Vec<Value> = levels
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "name": name,
                "y": round_to(tally.sum(name), 4),
                "raw": tally.count(name),
                "color": palette.color(i),
            })
        })
        .collect();

    let mut options = base_options("pie", &p.common);
    let mut pie = json!({
        "allowPointSelect": true,
        "showInLegend": true,
        "dataLabels": {
            "enabled": p.common.data_labels,
            "format": "{point.name}: {point.percentage:.1f}%",
        },
    });
    if let Some(inner) = &p.inner_size {
        pie["innerSize"] = json!(inner);
    }
    options["plotOptions"] = json!({ "pie": pie });
    options["series"] = json!([{
        "name": p.common.title.clone().unwrap_or_else(|| p.x_var.clone()),
        "colorByPoint": true,
        "data": data,
    }]);

    let mut chart = Chart::new(options);
    attach_tooltip(&mut chart, &p.common, "{name}: {y} ({percent}%)", TooltipContext::Point);
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes() -> DataFrame {
        DataFrame::from_records(
            &["party", "weight"],
            &[&["B", "1"], &["A", "2"], &["B", "1"], &["B", "0.5"], &["NA", "1"]],
        )
        .unwrap()
    }

    #[test]
    fn counts_per_slice_in_category_order() {
        let chart = viz_pie(&votes(), &PieParams::new("party")).unwrap();
        let data = chart.series()[0]["data"].as_array().unwrap().clone();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "A");
        assert_eq!(data[0]["y"], json!(1.0));
        assert_eq!(data[1]["name"], "B");
        assert_eq!(data[1]["y"], json!(3.0));
        assert_eq!(data[1]["raw"], json!(3));
    }

    #[test]
    fn weighted_sorted_donut() {
        let p = PieParams {
            y_var: Some("weight".to_string()),
            inner_size: Some("60%".to_string()),
            sort_desc: true,
            include_na: true,
            ..PieParams::new("party")
        };
        let chart = viz_pie(&votes(), &p).unwrap();
        assert_eq!(chart.options["plotOptions"]["pie"]["innerSize"], "60%");
        let names: Vec<&str> = chart.series()[0]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        // B = 2.5, A = 2, (Missing) = 1
        assert_eq!(names, vec!["B", "A", "(Missing)"]);
    }
}
