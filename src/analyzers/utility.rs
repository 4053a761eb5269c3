/// Share of `part` in `total` as a percentage. Returns 0.0 when `total` is zero.
pub fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Rescales `values` linearly onto [0, 1].
///
/// When every value is equal there is no spread to rescale, so each maps to 1.0.
pub fn min_max_normalize(values: &[u64]) -> Vec<f64> {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    if min == max {
        return vec![1.0; values.len()];
    }
    let span = (max - min) as f64;
    values.iter().map(|v| (v - min) as f64 / span).collect()
}
