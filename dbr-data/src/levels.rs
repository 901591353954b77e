//! Category ordering and missing-value policy.
//!
//! Mirrors how a factor orders its levels: explicit order first, then the
//! remaining values in natural ascending order, with the missing-value label
//! last.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default label for missing categories when they are kept.
pub const DEFAULT_NA_LABEL: &str = "(Missing)";

/// How a chart treats missing category values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaPolicy {
    pub include: bool,
    pub label: String,
}

impl Default for NaPolicy {
    fn default() -> Self {
        Self {
            include: false,
            label: DEFAULT_NA_LABEL.to_string(),
        }
    }
}

impl NaPolicy {
    pub fn new(include: bool, label: Option<&str>) -> Self {
        Self {
            include,
            label: label.unwrap_or(DEFAULT_NA_LABEL).to_string(),
        }
    }

    /// `None` means the row is dropped.
    pub fn apply(&self, cell: Option<&str>) -> Option<String> {
        match cell {
            Some(v) => Some(v.to_string()),
            None if self.include => Some(self.label.clone()),
            None => None,
        }
    }

    /// Label to keep last when ordering, if missing values are shown.
    pub fn trailing_label(&self) -> Option<&str> {
        self.include.then_some(self.label.as_str())
    }
}

/// Numbers sort numerically and before text; text sorts lexically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Order observed categories.
///
/// `explicit` entries come first in the given order (entries that were not
/// observed are dropped). The remaining observed values follow in
/// [`natural_cmp`] order. `na_label`, when observed and not explicitly
/// placed, goes last.
pub fn order_levels(observed: &[String], explicit: Option<&[String]>, na_label: Option<&str>) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(observed.len());
    if let Some(explicit) = explicit {
        for level in explicit {
            if observed.contains(level) && !ordered.contains(level) {
                ordered.push(level.clone());
            }
        }
    }

    let mut rest: Vec<String> = observed
        .iter()
        .filter(|v| !ordered.contains(v) && Some(v.as_str()) != na_label)
        .cloned()
        .collect();
    rest.sort_by(|a, b| natural_cmp(a, b));
    rest.dedup();
    ordered.extend(rest);

    if let Some(na) = na_label {
        if observed.iter().any(|v| v == na) && !ordered.iter().any(|v| v == na) {
            ordered.push(na.to_string());
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn natural_order_is_numeric_aware() {
        let levels = order_levels(&s(&["10", "9", "b", "a", "100"]), None, None);
        assert_eq!(levels, s(&["9", "10", "100", "a", "b"]));
    }

    #[test]
    fn na_label_goes_last() {
        let levels = order_levels(&s(&["(Missing)", "b", "a"]), None, Some("(Missing)"));
        assert_eq!(levels, s(&["a", "b", "(Missing)"]));
    }

    #[test]
    fn explicit_order_places_na_label() {
        let explicit = s(&["(Missing)", "b"]);
        let levels = order_levels(&s(&["a", "b", "(Missing)"]), Some(&explicit), Some("(Missing)"));
        assert_eq!(levels, s(&["(Missing)", "b", "a"]));
    }

    #[test]
    fn explicit_entries_not_observed_are_dropped() {
        let explicit = s(&["z", "b"]);
        let levels = order_levels(&s(&["a", "b"]), Some(&explicit), None);
        assert_eq!(levels, s(&["b", "a"]));
    }

    #[test]
    fn na_policy_drops_or_relabels() {
        assert_eq!(NaPolicy::default().apply(None), None);
        assert_eq!(
            NaPolicy::new(true, None).apply(None),
            Some("(Missing)".to_string())
        );
        assert_eq!(
            NaPolicy::new(true, Some("No answer")).apply(Some("yes")),
            Some("yes".to_string())
        );
    }
}
