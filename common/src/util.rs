/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Largest value, ignoring non-finite entries
pub fn max_finite(data: impl IntoIterator<Item = f64>) -> Option<f64> {
    data.into_iter()
        .filter(|x| x.is_finite())
        .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.max(x))))
}
