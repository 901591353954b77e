//! Highcharts configuration objects.
//!
//! A [`Chart`] is a JSON options tree plus the JS functions it references.
//! Functions cannot live in JSON, so the tree holds a placeholder string
//! where each function goes and [`Chart::to_js_object`] splices the raw
//! source back in when the chart is embedded in a page.

use crate::palette::Palette;
use crate::tooltip::{TooltipContext, TooltipFormat};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Raw JS source referenced from the options tree by placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsFunction {
    pub placeholder: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub options: Value,
    #[serde(default)]
    pub functions: Vec<JsFunction>,
}

impl Chart {
    pub fn new(options: Value) -> Self {
        Self {
            options,
            functions: Vec::new(),
        }
    }

    /// Register a JS function and return the placeholder value to put in the tree.
    pub fn js_function(&mut self, source: String) -> Value {
        let placeholder = format!("__dbr_js_{}__", self.functions.len());
        self.functions.push(JsFunction {
            placeholder: placeholder.clone(),
            source,
        });
        Value::String(placeholder)
    }

    /// JS object literal with every placeholder replaced by its function source.
    pub fn to_js_object(&self) -> String {
        let mut text = serde_json::to_string(&self.options).unwrap_or_default();
        for f in &self.functions {
            text = text.replace(&format!("\"{}\"", f.placeholder), &f.source);
        }
        text
    }

    /// Series array, empty if the chart has none.
    pub fn series(&self) -> &[Value] {
        self.options["series"]
            .as_array()
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }
}

/// Options shared by every chart type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonOptions {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub color_palette: Vec<String>,
    /// Tooltip format with `{value}`-style placeholders.
    pub tooltip: Option<String>,
    pub tooltip_prefix: Option<String>,
    pub tooltip_suffix: Option<String>,
    pub decimals: Option<u8>,
    pub data_labels: bool,
    /// Container height in pixels.
    pub height: Option<u32>,
}

impl CommonOptions {
    pub fn palette(&self) -> Palette {
        Palette::categorical(&self.color_palette)
    }
}

/// Options every chart starts from: type, title, subtitle, palette.
pub(crate) fn base_options(chart_type: &str, common: &CommonOptions) -> Value {
    let mut options = json!({
        "chart": { "type": chart_type },
        "title": { "text": common.title.clone().unwrap_or_default() },
        "credits": { "enabled": false },
        "colors": common.palette().colors(),
    });
    if let Some(subtitle) = &common.subtitle {
        options["subtitle"] = json!({ "text": subtitle });
    }
    options
}

/// Install a tooltip formatter from the user's format or the chart default.
pub(crate) fn attach_tooltip(
    chart: &mut Chart,
    common: &CommonOptions,
    default_format: &str,
    ctx: TooltipContext,
) {
    let format = common.tooltip.as_deref().unwrap_or(default_format);
    let source = TooltipFormat::parse(format)
        .prefix(common.tooltip_prefix.as_deref())
        .suffix(common.tooltip_suffix.as_deref())
        .decimals(common.decimals)
        .to_js(ctx);
    let formatter = chart.js_function(source);
    chart.options["tooltip"] = json!({ "formatter": formatter, "useHTML": true });
}

pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
