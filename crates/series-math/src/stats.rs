use analysis_core::SeriesError;

/// Mean of the non-missing values; `NaN` when every value is missing.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Period-over-period percent change.
/// Position 0 is `NaN`, as is any period whose predecessor is zero.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len());
    out.push(f64::NAN);
    out.extend(values.windows(2).map(|w| {
        if w[0] == 0.0 {
            f64::NAN
        } else {
            w[1] / w[0] - 1.0
        }
    }));
    out
}

/// True when every position satisfies `|a - b| <= atol + rtol * |b|`.
/// Missing values never compare equal.
pub fn allclose(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> Result<bool, SeriesError> {
    if a.len() != b.len() {
        return Err(SeriesError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a
        .iter()
        .zip(b)
        .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs()))
}

/// Most recent period.
pub fn last(values: &[f64]) -> Result<f64, SeriesError> {
    values.last().copied().ok_or(SeriesError::EmptySeries)
}
