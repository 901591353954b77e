//! Tooltip format strings compiled to Highcharts formatter functions.
//!
//! A format such as `"{category}: {value} respondents"` becomes
//!
//! ```text
//! function() { return '' + (this.point.category !== undefined ? ... ) + ': ' + ... ; }
//! ```
//!
//! Recognised placeholders are `{value}`, `{category}`, `{x}`, `{y}`,
//! `{name}`, `{series}`, `{percent}` and `{raw}`. Anything else in braces is
//! kept as literal text.

use dbr_utils::text::js_string;

/// How the chart lays out its points, which decides what `{x}` and `{y}` mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipContext {
    /// Category x axis, numeric y (bars, lines).
    Category,
    /// Both axes are categories and the point carries `value`.
    Heatmap,
    /// Named points without axes (pie, sankey, treemap, waffle) or numeric x.
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Value,
    Category,
    X,
    Y,
    Name,
    Series,
    Percent,
    Raw,
}

impl Field {
    fn parse(name: &str) -> Option<Field> {
        Some(match name {
            "value" => Field::Value,
            "category" => Field::Category,
            "x" => Field::X,
            "y" => Field::Y,
            "name" => Field::Name,
            "series" => Field::Series,
            "percent" => Field::Percent,
            "raw" => Field::Raw,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipFormat {
    segments: Vec<Segment>,
    prefix: Option<String>,
    suffix: Option<String>,
    decimals: Option<u8>,
}

impl TooltipFormat {
    pub fn parse(format: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;
        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match Field::parse(name.trim()) {
                        Some(field) => {
                            if !literal.is_empty() {
                                segments.push(Segment::Literal(std::mem::take(&mut literal)));
                            }
                            segments.push(Segment::Field(field));
                        }
                        None => {
                            literal.push('{');
                            literal.push_str(name);
                            literal.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    literal.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Self {
            segments,
            prefix: None,
            suffix: None,
            decimals: None,
        }
    }

    pub fn prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_string);
        self
    }

    pub fn suffix(mut self, suffix: Option<&str>) -> Self {
        self.suffix = suffix.map(str::to_string);
        self
    }

    pub fn decimals(mut self, decimals: Option<u8>) -> Self {
        self.decimals = decimals;
        self
    }

    fn number(&self, expr: &str) -> String {
        match self.decimals {
            Some(d) => format!("Highcharts.numberFormat({}, {})", expr, d),
            None => expr.to_string(),
        }
    }

    fn field_expr(&self, field: Field, ctx: TooltipContext) -> String {
        match (field, ctx) {
            (Field::Value, _) => {
                self.number("(this.point.value !== undefined ? this.point.value : this.y)")
            }
            (Field::Category, _) => {
                "(this.point.category !== undefined ? this.point.category : this.key)".to_string()
            }
            (Field::X, TooltipContext::Heatmap) => {
                "this.series.xAxis.categories[this.point.x]".to_string()
            }
            (Field::X, TooltipContext::Category) => {
                "(this.point.category !== undefined ? this.point.category : this.x)".to_string()
            }
            (Field::X, TooltipContext::Point) => "this.x".to_string(),
            (Field::Y, TooltipContext::Heatmap) => {
                "this.series.yAxis.categories[this.point.y]".to_string()
            }
            (Field::Y, _) => self.number("this.y"),
            (Field::Name, _) => "this.point.name".to_string(),
            (Field::Series, _) => "this.series.name".to_string(),
            (Field::Percent, _) => format!(
                "(this.percentage !== undefined ? Highcharts.numberFormat(this.percentage, {}) : '')",
                self.decimals.unwrap_or(1)
            ),
            (Field::Raw, _) => {
                "(this.point.options.raw !== undefined ? this.point.options.raw : '')".to_string()
            }
        }
    }

    /// JS source of a `function() { ... }` suitable for `tooltip.formatter`.
    pub fn to_js(&self, ctx: TooltipContext) -> String {
        let mut parts = vec!["''".to_string()];
        if let Some(prefix) = &self.prefix {
            parts.push(js_string(prefix));
        }
        for segment in &self.segments {
            parts.push(match segment {
                Segment::Literal(text) => js_string(text),
                Segment::Field(field) => self.field_expr(*field, ctx),
            });
        }
        if let Some(suffix) = &self.suffix {
            parts.push(js_string(suffix));
        }
        format!("function() {{ return {}; }}", parts.join(" + "))
    }
}
