//! Summary statistics over numeric columns.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Quantile by linear interpolation between order statistics (R type 7).
/// `sorted` must be ascending.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

pub fn iqr(sorted: &[f64]) -> Option<f64> {
    Some(quantile(sorted, 0.75)? - quantile(sorted, 0.25)?)
}

/// Present values of an optional column, sorted ascending.
pub fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sd() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        let s = sd(&v).unwrap();
        assert!((s - 2.138).abs() < 1e-3, "{}", s);
        assert_eq!(sd(&[1.0]), None);
    }

    #[test]
    fn test_quantile_type_seven() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(iqr(&v), Some(1.5));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_sorted_present_drops_missing() {
        assert_eq!(sorted_present(&[Some(3.0), None, Some(1.0)]), vec![1.0, 3.0]);
    }
}
