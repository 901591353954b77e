//! Treemap of summed values by group, optionally split into subgroups.

use super::{category_column, row_weights, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::{Result, VizError};
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapParams {
    pub group_var: String,
    #[serde(default)]
    pub subgroup_var: Option<String>,
    /// Numeric column summed per tile; tiles are row counts without it.
    #[serde(default)]
    pub value_var: Option<String>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl TreemapParams {
    pub fn new(group_var: &str) -> Self {
        Self {
            group_var: group_var.to_string(),
            subgroup_var: None,
            value_var: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

pub fn viz_treemap(df: &DataFrame, p: &TreemapParams) -> Result<Chart> {
    let mut required = vec![p.group_var.as_str()];
    if let Some(s) = &p.subgroup_var {
        required.push(s);
    }
    if let Some(v) = &p.value_var {
        required.push(v);
    }
    df.require_columns(&required)?;

    let na = NaPolicy::new(p.include_na, p.na_label.as_deref());
    let groups = category_column(df, &p.group_var, &na)?;
    let subgroups = match &p.subgroup_var {
        Some(s) => Some(category_column(df, s, &na)?),
        None => None,
    };
    let weights = row_weights(df, p.value_var.as_deref())?;

    let mut by_group: Tally<String> = Tally::new();
    let mut by_pair: Tally<(String, String)> = Tally::new();
    for (i, (g, w)) in groups.iter().zip(&weights).enumerate() {
        let (Some(g), Some(w)) = (g, w) else {
            continue;
        };
        match &subgroups {
            Some(subs) => {
                if let Some(s) = &subs[i] {
                    by_group.add(g.clone(), *w);
                    by_pair.add((g.clone(), s.clone()), *w);
                }
            }
            None => by_group.add(g.clone(), *w),
        }
    }
    if by_group.is_empty() {
        return Err(VizError::InsufficientData {
            chart: "treemap",
            reason: format!("no rows with a value for '{}'", p.group_var),
        });
    }

    let group_levels = order_levels(&unique(by_group.keys()), None, na.trailing_label());
    let sub_levels = order_levels(&unique(by_pair.keys().iter().map(|(_, s)| s)), None, na.trailing_label());

    let palette = p.common.palette();
    let mut data: Vec<Value> = Vec::new();
    for (gi, g) in group_levels.iter().enumerate() {
        let color = palette.color(gi);
        if subgroups.is_none() {
            data.push(json!({
                "name": g,
                "value": round_to(by_group.sum(g), 4),
                "color": color,
            }));
            continue;
        }
        let parent = format!("group-{}", gi);
        data.push(json!({ "id": parent, "name": g, "color": color }));
        for s in &sub_levels {
            let key = (g.clone(), s.clone());
            if by_pair.count(&key) == 0 {
                continue;
            }
            data.push(json!({
                "name": s,
                "parent": parent,
                "value": round_to(by_pair.sum(&key), 4),
            }));
        }
    }

    let nested = subgroups.is_some();
    let mut options = base_options("treemap", &p.common);
    options["series"] = json!([{
        "type": "treemap",
        "name": p.common.title.clone().unwrap_or_else(|| p.group_var.clone()),
        "layoutAlgorithm": "squarified",
        "allowTraversingTree": nested,
        "levels": [{
            "level": 1,
            "dataLabels": { "enabled": true },
            "borderWidth": 3,
        }],
        "data": data,
    }]);

    let mut chart = Chart::new(options);
    attach_tooltip(&mut chart, &p.common, "{name}: {value}", TooltipContext::Point);
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend() -> DataFrame {
        DataFrame::from_records(
            &["dept", "item", "cost"],
            &[
                &["ops", "fuel", "10"],
                &["hr", "training", "4"],
                &["ops", "fuel", "5"],
                &["ops", "parts", "3"],
                &["NA", "misc", "1"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn flat_tiles_sum_values() {
        let p = TreemapParams {
            value_var: Some("cost".to_string()),
            ..TreemapParams::new("dept")
        };
        let chart = viz_treemap(&spend(), &p).unwrap();
        let data = chart.series()[0]["data"].as_array().unwrap().clone();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "hr");
        assert_eq!(data[1]["value"], json!(18.0));
        assert_eq!(chart.series()[0]["allowTraversingTree"], json!(false));
    }

    #[test]
    fn subgroups_hang_off_parents() {
        let p = TreemapParams {
            subgroup_var: Some("item".to_string()),
            value_var: Some("cost".to_string()),
            ..TreemapParams::new("dept")
        };
        let chart = viz_treemap(&spend(), &p).unwrap();
        let data = chart.series()[0]["data"].as_array().unwrap().clone();
        // hr, hr/training, ops, ops/fuel, ops/parts
        assert_eq!(data.len(), 5);
        assert_eq!(data[0]["id"], "group-0");
        assert_eq!(data[1]["parent"], "group-0");
        assert_eq!(data[3]["name"], "fuel");
        assert_eq!(data[3]["value"], json!(15.0));
        assert_eq!(chart.series()[0]["allowTraversingTree"], json!(true));
    }

    #[test]
    fn empty_data_is_rejected() {
        let df = DataFrame::from_records(&["dept"], &[&["NA"]]).unwrap();
        assert!(matches!(
            viz_treemap(&df, &TreemapParams::new("dept")),
            Err(VizError::InsufficientData { .. })
        ));
    }
}
