use analysis_core::SeriesError;

/// Compound `initial` through successive period growth rates.
///
/// Returns `[v0, v0*(1+r1), v0*(1+r1)*(1+r2), ...]`, one more element than `rates`.
pub fn compound(initial: f64, rates: &[f64]) -> Result<Vec<f64>, SeriesError> {
    if rates.is_empty() {
        return Err(SeriesError::EmptySeries);
    }
    let mut out = Vec::with_capacity(rates.len() + 1);
    out.push(initial);
    let mut multiplier = 1.0;
    for rate in rates {
        multiplier *= 1.0 + rate;
        out.push(initial * multiplier);
    }
    Ok(out)
}

/// Cumulative discount divisors `[1, (1+r), (1+r)^2, ...]` over `periods` periods.
pub fn discount_factors(rate: f64, periods: usize) -> Result<Vec<f64>, SeriesError> {
    compound(1.0, &vec![rate; periods])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compound_prefixes_initial_value() {
        let path = compound(146.41, &[0.10, 0.05]).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], 146.41);
        assert_relative_eq!(path[1], 146.41 * 1.10, epsilon = 1e-9);
        assert_relative_eq!(path[2], 146.41 * 1.10 * 1.05, epsilon = 1e-9);
    }

    #[test]
    fn test_compound_empty_rates_fails() {
        assert_eq!(compound(1.0, &[]), Err(SeriesError::EmptySeries));
    }

    #[test]
    fn test_discount_factors() {
        let factors = discount_factors(0.10, 3).unwrap();
        assert_eq!(factors.len(), 4);
        assert_eq!(factors[0], 1.0);
        assert_relative_eq!(factors[3], 1.1_f64.powi(3), epsilon = 1e-12);
    }
}
