// Robust dispersion helpers for the merge/consensus stage.

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Flag values whose absolute deviation from the median exceeds `m` times
/// the median absolute deviation. A zero MAD (at least half the values
/// identical) flags nothing.
pub fn median_outlier_mask(values: &[f64], m: f64) -> Vec<bool> {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);
    if mad == 0.0 {
        return vec![false; values.len()];
    }
    deviations.iter().map(|d| d / mad > m).collect()
}
