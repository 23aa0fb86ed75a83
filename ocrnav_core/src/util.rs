//! Small numeric helpers shared by the sampler and the calibrator.

/// Arithmetic mean; `None` for an empty input.
#[inline]
pub fn mean(values: impl IntoIterator<Item = f32>) -> Option<f32> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0f64, 0u32), |(s, n), v| (s + f64::from(v), n + 1));
    (n > 0).then(|| (sum / f64::from(n)) as f32)
}

/// Median by sorting; even-length inputs take the upper middle element.
/// Reorders `values`. NaNs sort last.
#[inline]
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(values[values.len() / 2])
}

/// Round to two decimals, the precision the HUD displays.
#[inline]
pub fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
