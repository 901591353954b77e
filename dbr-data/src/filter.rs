//! Row filters attached to visualizations.
//!
//! A filter restricts the rows a single chart sees (e.g. `wave == 1`). Its
//! [`Filter::signature`] is a canonical string used to tell sibling charts
//! with different filters apart when grouping tabs.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    #[default]
    Eq,
    Ne,
    In,
    NotIn,
    Gt,
    Ge,
    Lt,
    Le,
}

impl FilterOp {
    fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::In => "in",
            FilterOp::NotIn => "not in",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
        }
    }

    fn is_set_op(&self) -> bool {
        matches!(self, FilterOp::In | FilterOp::NotIn)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    #[serde(default)]
    pub op: FilterOp,
    pub values: Vec<String>,
    /// Display label used when the filter names a tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, values: Vec<String>) -> Self {
        Self {
            column: column.into(),
            op,
            values,
            label: None,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Eq, vec![value.into()])
    }

    pub fn is_in(column: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            column,
            FilterOp::In,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Does a single cell pass the filter? Missing cells never pass.
    pub fn matches(&self, cell: Option<&str>) -> Result<bool> {
        let Some(value) = cell else {
            return Ok(false);
        };
        match self.op {
            FilterOp::Eq | FilterOp::In => Ok(self.values.iter().any(|v| v == value)),
            FilterOp::Ne | FilterOp::NotIn => Ok(!self.values.iter().any(|v| v == value)),
            FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le => {
                let bound = self.numeric_bound()?;
                let Ok(x) = value.parse::<f64>() else {
                    return Ok(false);
                };
                Ok(match self.op {
                    FilterOp::Gt => x > bound,
                    FilterOp::Ge => x >= bound,
                    FilterOp::Lt => x < bound,
                    _ => x <= bound,
                })
            }
        }
    }

    fn numeric_bound(&self) -> Result<f64> {
        let raw = self.values.first().ok_or_else(|| DataError::InvalidFilter {
            column: self.column.clone(),
            reason: "comparison needs a value".to_string(),
        })?;
        raw.parse::<f64>().map_err(|_| DataError::InvalidFilter {
            column: self.column.clone(),
            reason: format!("'{}' is not a number", raw),
        })
    }

    /// Canonical form: set operators sort their values so that
    /// `in [b, a]` and `in [a, b]` compare equal.
    pub fn signature(&self) -> String {
        let mut values = self.values.clone();
        if self.op.is_set_op() {
            values.sort();
            values.dedup();
        }
        format!("{} {} [{}]", self.column, self.op.symbol(), values.join(", "))
    }

    /// Human readable label, e.g. `wave == 1`.
    pub fn label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match (self.op, self.values.as_slice()) {
            (op, [single]) if !op.is_set_op() => {
                format!("{} {} {}", self.column, op.symbol(), single)
            }
            (op, values) => format!("{} {} {}", self.column, op.symbol(), values.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_and_in_match_listed_values() {
        let f = Filter::is_in("wave", &["1", "2"]);
        assert!(f.matches(Some("2")).unwrap());
        assert!(!f.matches(Some("3")).unwrap());
        assert!(!f.matches(None).unwrap());
    }

    #[test]
    fn numeric_comparisons() {
        let f = Filter::new("age", FilterOp::Ge, vec!["30".into()]);
        assert!(f.matches(Some("30")).unwrap());
        assert!(!f.matches(Some("29.5")).unwrap());
        assert!(!f.matches(Some("unknown")).unwrap());
    }

    #[test]
    fn comparison_with_text_bound_is_an_error() {
        let f = Filter::new("age", FilterOp::Lt, vec!["old".into()]);
        assert!(matches!(
            f.matches(Some("3")),
            Err(DataError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn signature_ignores_set_order() {
        let a = Filter::is_in("region", &["north", "south"]);
        let b = Filter::is_in("region", &["south", "north"]);
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), Filter::eq("region", "north").signature());
    }

    #[test]
    fn label_prefers_explicit_label() {
        assert_eq!(Filter::eq("wave", "1").label(), "wave == 1");
        assert_eq!(Filter::eq("wave", "1").with_label("Wave 1").label(), "Wave 1");
    }
}
