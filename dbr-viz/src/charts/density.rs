//! Kernel density curves of a numeric column, one per group.
//!
//! Gaussian kernel evaluated on `n` evenly spaced points spanning three
//! bandwidths past the data range. The default bandwidth follows Silverman's
//! rule of thumb (`bw.nrd0`), scaled by `adjust`.

use super::{axis_title, category_column, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::{Result, VizError};
use crate::tooltip::TooltipContext;
use dbr_data::levels::order_levels;
use dbr_data::stats::{iqr, sd, sorted_present};
use dbr_data::{DataFrame, NaPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::f64::consts::PI;

fn default_n() -> usize {
    512
}

fn default_adjust() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityParams {
    pub x_var: String,
    #[serde(default)]
    pub group_var: Option<String>,
    /// Number of evaluation points per curve.
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default = "default_adjust")]
    pub adjust: f64,
    /// Fixed bandwidth; overrides the rule of thumb.
    #[serde(default)]
    pub bandwidth: Option<f64>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl DensityParams {
    pub fn new(x_var: &str) -> Self {
        Self {
            x_var: x_var.to_string(),
            group_var: None,
            n: default_n(),
            adjust: default_adjust(),
            bandwidth: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

/// Silverman's rule of thumb on ascending values.
pub fn nrd0(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    let hi = sd(sorted).unwrap_or(0.0);
    let lo = match iqr(sorted).map(|q| q / 1.34) {
        Some(q) if q > 0.0 => hi.min(q),
        _ => hi,
    };
    let lo = if lo > 0.0 {
        lo
    } else if hi > 0.0 {
        hi
    } else if let Some(first) = sorted.first().filter(|v| **v != 0.0) {
        first.abs()
    } else {
        1.0
    };
    0.9 * lo * n.powf(-0.2)
}

/// `(x, density)` pairs of a Gaussian KDE.
pub fn kde(sorted: &[f64], bandwidth: f64, n: usize) -> Vec<(f64, f64)> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let from = min - 3.0 * bandwidth;
    let to = max + 3.0 * bandwidth;
    let step = (to - from) / (n.max(2) - 1) as f64;
    let norm = 1.0 / (sorted.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    (0..n)
        .map(|i| {
            let x = from + step * i as f64;
            let y = sorted
                .iter()
                .map(|v| {
                    let u = (x - v) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm;
            (x, y)
        })
        .collect()
}

pub fn viz_density(df: &DataFrame, p: &DensityParams) -> Result<Chart> {
    if p.n < 2 {
        return Err(VizError::InvalidParameter {
            chart: "density",
            name: "n",
            reason: format!("need at least 2 evaluation points, got {}", p.n),
        });
    }
    if let Some(bw) = p.bandwidth.filter(|bw| *bw <= 0.0 || !bw.is_finite()) {
        return Err(VizError::InvalidParameter {
            chart: "density",
            name: "bandwidth",
            reason: format!("must be positive, got {}", bw),
        });
    }
    if p.adjust <= 0.0 || !p.adjust.is_finite() {
        return Err(VizError::InvalidParameter {
            chart: "density",
            name: "adjust",
            reason: format!("must be positive, got {}", p.adjust),
        });
    }
    let mut required = vec![p.x_var.as_str()];
    if let Some(g) = &p.group_var {
        required.push(g);
    }
    df.require_columns(&required)?;

    let values = df.numeric(&p.x_var)?;
    let na = NaPolicy::new(p.include_na, p.na_label.as_deref());

    let mut groups: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    match &p.group_var {
        None => groups.push((p.x_var.clone(), values)),
        Some(g) => {
            let labels = category_column(df, g, &na)?;
            let order = order_levels(&unique(labels.iter().flatten()), None, na.trailing_label());
            for level in order {
                let members: Vec<Option<f64>> = labels
                    .iter()
                    .zip(&values)
                    .filter(|(l, _)| l.as_deref() == Some(level.as_str()))
                    .map(|(_, v)| *v)
                    .collect();
                groups.push((level, members));
            }
        }
    }

    let palette = p.common.palette();
    let mut series: Vec<Value> = Vec::new();
    for (i, (name, members)) in groups.iter().enumerate() {
        let sorted = sorted_present(members);
        if sorted.len() < 2 {
            log::warn!(
                "density: skipping '{}' with {} value(s) in '{}'",
                name,
                sorted.len(),
                p.x_var
            );
            continue;
        }
        let bw = p.bandwidth.unwrap_or_else(|| nrd0(&sorted) * p.adjust);
        let data: Vec<Value> = kde(&sorted, bw, p.n)
            .into_iter()
            .map(|(x, y)| json!([round_to(x, 4), round_to(y, 6)]))
            .collect();
        series.push(json!({
            "name": name,
            "color": palette.color(i),
            "fillOpacity": 0.3,
            "data": data,
        }));
    }
    if series.is_empty() {
        return Err(VizError::InsufficientData {
            chart: "density",
            reason: format!("need at least 2 numeric values in '{}'", p.x_var),
        });
    }

    let mut options = base_options("areaspline", &p.common);
    options["xAxis"] = json!({ "title": { "text": axis_title(&p.common.x_label, &p.x_var) } });
    options["yAxis"] = json!({ "title": { "text": axis_title(&p.common.y_label, "Density") } });
    options["plotOptions"] = json!({ "areaspline": { "marker": { "enabled": false } } });
    options["legend"] = json!({ "enabled": p.group_var.is_some() });
    options["series"] = Value::Array(series);

    let mut chart = Chart::new(options);
    attach_tooltip(&mut chart, &p.common, "{series}<br>{x}: {y}", TooltipContext::Point);
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ages() -> DataFrame {
        DataFrame::from_records(
            &["age", "sex"],
            &[
                &["21", "f"],
                &["35", "f"],
                &["44", "m"],
                &["52", "m"],
                &["67", "f"],
                &["NA", "m"],
                &["30", "x"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let sorted = [1.0, 2.0, 2.5, 4.0, 7.0];
        let bw = nrd0(&sorted);
        let curve = kde(&sorted, bw, 512);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, y)| y * step).sum();
        assert!((area - 1.0).abs() < 0.01, "{}", area);
    }

    #[test]
    fn nrd0_matches_rule_of_thumb() {
        // sd = 1.5811, iqr / 1.34 = 1.4925, n = 5
        let bw = nrd0(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((bw - 0.9 * (2.0 / 1.34) * 5f64.powf(-0.2)).abs() < 1e-9, "{}", bw);
    }

    #[test]
    fn one_curve_per_group_with_small_groups_skipped() {
        let p = DensityParams {
            group_var: Some("sex".to_string()),
            n: 64,
            ..DensityParams::new("age")
        };
        let chart = viz_density(&ages(), &p).unwrap();
        let names: Vec<&str> = chart
            .series()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        // "x" has a single value
        assert_eq!(names, vec!["f", "m"]);
        assert_eq!(chart.series()[0]["data"].as_array().unwrap().len(), 64);
        assert_eq!(chart.options["chart"]["type"], "areaspline");
    }

    #[test]
    fn too_few_values_is_an_error() {
        let df = DataFrame::from_records(&["age"], &[&["40"], &["NA"]]).unwrap();
        assert!(matches!(
            viz_density(&df, &DensityParams::new("age")),
            Err(VizError::InsufficientData { .. })
        ));
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let p = DensityParams {
            n: 1,
            ..DensityParams::new("age")
        };
        assert!(matches!(
            viz_density(&ages(), &p),
            Err(VizError::InvalidParameter { name: "n", .. })
        ));
        let p = DensityParams {
            bandwidth: Some(0.0),
            ..DensityParams::new("age")
        };
        assert!(matches!(
            viz_density(&ages(), &p),
            Err(VizError::InvalidParameter { name: "bandwidth", .. })
        ));
        for adjust in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let p = DensityParams {
                adjust,
                n: 4,
                ..DensityParams::new("age")
            };
            assert!(matches!(
                viz_density(&ages(), &p),
                Err(VizError::InvalidParameter { name: "adjust", .. })
            ));
        }
    }
}
