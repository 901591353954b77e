//! Response shares (or counts) over time.
//!
//! Without `group_var` there is one series per response category. With
//! `group_var` and a `response_filter` there is one series per group, each
//! point being the share of that group's responses that fall in the filter.
//! With `group_var` and no filter, every `response - group` pair gets a series.

use super::{axis_title, category_column, unique};
use crate::chart::{attach_tooltip, base_options, round_to, Chart, CommonOptions};
use crate::error::Result;
use crate::tooltip::TooltipContext;
use chrono::NaiveDate;
use dbr_data::levels::order_levels;
use dbr_data::{DataFrame, NaPolicy, Tally};
use dbr_utils::dates::parse_date;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineChartType {
    #[default]
    Line,
    Area,
    Column,
}

impl TimelineChartType {
    fn highcharts_type(&self) -> &'static str {
        match self {
            TimelineChartType::Line => "line",
            TimelineChartType::Area => "area",
            TimelineChartType::Column => "column",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YMode {
    #[default]
    Percent,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineParams {
    pub time_var: String,
    pub response_var: String,
    #[serde(default)]
    pub group_var: Option<String>,
    #[serde(default)]
    pub response_filter: Option<Vec<String>>,
    #[serde(default)]
    pub chart_type: TimelineChartType,
    #[serde(default)]
    pub y_mode: YMode,
    #[serde(default)]
    pub time_order: Option<Vec<String>>,
    #[serde(default)]
    pub response_order: Option<Vec<String>>,
    #[serde(default)]
    pub include_na: bool,
    #[serde(default)]
    pub na_label: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl TimelineParams {
    pub fn new(time_var: &str, response_var: &str) -> Self {
        Self {
            time_var: time_var.to_string(),
            response_var: response_var.to_string(),
            group_var: None,
            response_filter: None,
            chart_type: TimelineChartType::default(),
            y_mode: YMode::default(),
            time_order: None,
            response_order: None,
            include_na: false,
            na_label: None,
            common: CommonOptions::default(),
        }
    }
}

const NO_GROUP: &str = "";

/// Chronological when every time value is a date, natural order otherwise.
/// An explicit `time_order` always wins.
fn time_levels(observed: &[String], p: &TimelineParams) -> Vec<String> {
    if p.time_order.is_none() {
        let dated: Option<Vec<(NaiveDate, &String)>> = observed
            .iter()
            .map(|t| parse_date(t).map(|d| (d, t)))
            .collect();
        if let Some(mut dated) = dated {
            dated.sort_by_key(|(d, _)| *d);
            return dated.into_iter().map(|(_, t)| t.clone()).collect();
        }
    }
    order_levels(observed, p.time_order.as_deref(), None)
}

pub fn create_timeline(df: &DataFrame, p: &TimelineParams) -> Result<Chart> {
    let mut required = vec![p.time_var.as_str(), p.response_var.as_str()];
    if let Some(g) = &p.group_var {
        required.push(g);
    }
    df.require_columns(&required)?;

    let na = NaPolicy::new(p.include_na, p.na_label.as_deref());
    let times = df.column(&p.time_var)?;
    let responses = category_column(df, &p.response_var, &na)?;
    let groups = match &p.group_var {
        Some(g) => category_column(df, g, &na)?,
        None => vec![Some(NO_GROUP.to_string()); df.len()],
    };
    let in_filter = |r: &str| {
        p.response_filter
            .as_ref()
            .map_or(true, |f| f.iter().any(|v| v == r))
    };

    // denominators per (time, group), numerators per (time, series)
    let mut totals: Tally<(String, String)> = Tally::new();
    let mut hits: Tally<(String, String)> = Tally::new();
    let mut series_group: HashMap<String, String> = HashMap::new();
    let mut response_seen: Vec<String> = Vec::new();
    let mut group_seen: Vec<String> = Vec::new();

    for ((t, r), g) in times.iter().zip(&responses).zip(&groups) {
        let (Some(t), Some(r), Some(g)) = (t, r, g) else {
            continue;
        };
        totals.add((t.to_string(), g.clone()), 1.0);
        if !response_seen.contains(r) {
            response_seen.push(r.clone());
        }
        if !group_seen.contains(g) {
            group_seen.push(g.clone());
        }
        if !in_filter(r) {
            continue;
        }
        let series = series_name(p, r, g);
        series_group.entry(series.clone()).or_insert_with(|| g.clone());
        hits.add((t.to_string(), series), 1.0);
    }

    let time_levels = time_levels(&unique(totals.keys().iter().map(|(t, _)| t)), p);
    let response_levels = order_levels(&response_seen, p.response_order.as_deref(), na.trailing_label());
    let group_levels = order_levels(&group_seen, None, na.trailing_label());

    let mut series_order: Vec<String> = Vec::new();
    match (&p.group_var, &p.response_filter) {
        (None, _) => series_order.extend(response_levels.iter().filter(|r| in_filter(r)).cloned()),
        (Some(_), Some(_)) => series_order.extend(group_levels.iter().cloned()),
        (Some(_), None) => {
            for g in &group_levels {
                for r in &response_levels {
                    series_order.push(series_name(p, r, g));
                }
            }
        }
    }
    series_order.retain(|s| series_group.contains_key(s));

    let percent = p.y_mode == YMode::Percent;
    let series: Vec<Value> = series_order
        .iter()
        .map(|name| {
            let group = &series_group[name];
            let data: Vec<Value> = time_levels
                .iter()
                .map(|t| {
                    let denom = totals.count(&(t.clone(), group.clone()));
                    if denom == 0 {
                        return Value::Null;
                    }
                    let count = hits.count(&(t.clone(), name.clone())) as f64;
                    if percent {
                        json!(round_to(100.0 * count / denom as f64, 2))
                    } else {
                        json!(count)
                    }
                })
                .collect();
            json!({ "name": name, "data": data })
        })
        .collect();

    let mut options = base_options(p.chart_type.highcharts_type(), &p.common);
    options["xAxis"] = json!({
        "categories": time_levels,
        "title": { "text": axis_title(&p.common.x_label, &p.time_var) },
    });
    let mut y_axis = json!({
        "min": 0,
        "title": { "text": axis_title(&p.common.y_label, if percent { "Percentage" } else { "Count" }) },
    });
    if percent {
        y_axis["max"] = json!(100);
        y_axis["labels"] = json!({ "format": "{value}%" });
    }
    options["yAxis"] = y_axis;
    options["plotOptions"] = json!({
        "series": {
            "marker": { "enabled": true },
            "dataLabels": { "enabled": p.common.data_labels },
        }
    });
    options["series"] = Value::Array(series);

    let mut chart = Chart::new(options);
    let default_tooltip = if percent {
        "{category}<br>{series}: {y}%"
    } else {
        "{category}<br>{series}: {y}"
    };
    attach_tooltip(&mut chart, &p.common, default_tooltip, TooltipContext::Category);
    Ok(chart)
}

fn series_name(p: &TimelineParams, response: &str, group: &str) -> String {
    match (&p.group_var, &p.response_filter) {
        (None, _) => response.to_string(),
        (Some(_), Some(_)) => group.to_string(),
        (Some(_), None) => format!("{} - {}", response, group),
    }
}
