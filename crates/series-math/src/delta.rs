use analysis_core::SeriesError;
use serde::{Deserialize, Serialize};

/// Convention for the first element of a first-difference series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstValue {
    /// Position 0 is `NaN`
    Missing,
    /// Position 0 is `0.0`
    Zero,
}

/// Successive differences `s[i] - s[i-1]`, same length as the input.
pub fn delta(series: &[f64], first: FirstValue) -> Result<Vec<f64>, SeriesError> {
    if series.is_empty() {
        return Err(SeriesError::EmptySeries);
    }
    let mut out = Vec::with_capacity(series.len());
    out.push(match first {
        FirstValue::Missing => f64::NAN,
        FirstValue::Zero => 0.0,
    });
    out.extend(series.windows(2).map(|w| w[1] - w[0]));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_with_zero_first_value() {
        let result = delta(&[10.0, 12.5, 11.0], FirstValue::Zero).unwrap();
        assert_eq!(result, vec![0.0, 2.5, -1.5]);
    }

    #[test]
    fn test_delta_with_missing_first_value() {
        let result = delta(&[10.0, 12.5], FirstValue::Missing).unwrap();
        assert!(result[0].is_nan());
        assert_eq!(result[1], 2.5);
    }

    #[test]
    fn test_delta_single_element() {
        assert_eq!(delta(&[4.0], FirstValue::Zero).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_delta_empty_fails() {
        assert_eq!(delta(&[], FirstValue::Zero), Err(SeriesError::EmptySeries));
    }
}
