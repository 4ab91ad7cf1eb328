use std::str::FromStr;

use analysis_core::SeriesError;
use serde::{Deserialize, Serialize};

use crate::stats::nan_mean;

/// Base value for [`ExtrapolationPolicy::BaseStep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseMethod {
    /// Historical mean, ignoring missing periods
    Average,
    /// Most recent historical value
    Last,
}

impl FromStr for BaseMethod {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "average" => Ok(BaseMethod::Average),
            "last" => Ok(BaseMethod::Last),
            _ => Err(SeriesError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// How a driver is carried past the last historical period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Linear glide from `start` to `end`; the last forecast period equals `end`.
    Glide { start: f64, end: f64 },
    /// `base + k * step`, with step 0 when unset.
    BaseStep { method: BaseMethod, step: Option<f64> },
}

impl ExtrapolationPolicy {
    /// Resolve the optional-argument form: a start/end pair selects a glide,
    /// anything else falls back to base+step (last value when no method is given).
    pub fn from_parts(
        start: Option<f64>,
        end: Option<f64>,
        method: Option<&str>,
        step: Option<f64>,
    ) -> Result<Self, SeriesError> {
        let method = method.map(str::parse::<BaseMethod>).transpose()?;
        match (start, end) {
            (Some(start), Some(end)) => Ok(ExtrapolationPolicy::Glide { start, end }),
            _ => Ok(ExtrapolationPolicy::BaseStep {
                method: method.unwrap_or(BaseMethod::Last),
                step,
            }),
        }
    }

    /// Flat policy: every forecast period equals `value`.
    pub fn flat(value: f64) -> Self {
        ExtrapolationPolicy::Glide {
            start: value,
            end: value,
        }
    }
}

/// Append `horizon` forecast periods to `history` under `policy`.
///
/// The output has `history.len() + horizon` periods and the history is copied unchanged.
/// In glide mode the start value itself is not emitted; only the `horizon` stepped values are.
pub fn extend(
    history: &[f64],
    horizon: i64,
    policy: ExtrapolationPolicy,
) -> Result<Vec<f64>, SeriesError> {
    if horizon < 0 {
        return Err(SeriesError::NegativeHorizon(horizon));
    }
    let periods = horizon as usize;

    let mut out = Vec::with_capacity(history.len() + periods);
    out.extend_from_slice(history);
    if periods == 0 {
        return Ok(out);
    }

    let (base, step) = match policy {
        ExtrapolationPolicy::Glide { start, end } => (start, (end - start) / horizon as f64),
        ExtrapolationPolicy::BaseStep { method, step } => {
            let base = match method {
                BaseMethod::Average => nan_mean(history),
                BaseMethod::Last => *history.last().ok_or(SeriesError::EmptySeries)?,
            };
            (base, step.unwrap_or(0.0))
        }
    };

    out.extend((1..=periods).map(|k| base + k as f64 * step));

    // Pin the terminal period so the glide lands on `end` exactly.
    if let ExtrapolationPolicy::Glide { end, .. } = policy {
        if let Some(last) = out.last_mut() {
            *last = end;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_glide_length_and_endpoint() {
        let history = [0.5, 0.6, 0.7];
        let result = extend(&history, 4, ExtrapolationPolicy::Glide { start: 0.7, end: 0.3 }).unwrap();

        assert_eq!(result.len(), 7);
        assert_eq!(&result[..3], &history);
        assert_eq!(result[6], 0.3);
        assert_relative_eq!(result[3], 0.6, epsilon = 1e-12);
        assert_relative_eq!(result[4], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_glide_linear_spacing() {
        let (s, e, h) = (0.10, 0.03, 5_i64);
        let history = [f64::NAN, 0.1, 0.1];
        let result = extend(&history, h, ExtrapolationPolicy::Glide { start: s, end: e }).unwrap();

        let first = result[history.len()];
        let last = result[history.len() + h as usize - 1];
        assert_relative_eq!(last - first, (e - s) * (h - 1) as f64 / h as f64, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_policy() {
        let result = extend(&[0.2, 0.4], 3, ExtrapolationPolicy::flat(0.3)).unwrap();
        assert_eq!(&result[2..], &[0.3, 0.3, 0.3]);
    }

    #[test]
    fn test_base_step_average_and_last() {
        let history = [1.0, f64::NAN, 3.0];

        let avg = extend(
            &history,
            2,
            ExtrapolationPolicy::BaseStep { method: BaseMethod::Average, step: Some(0.5) },
        )
        .unwrap();
        assert_eq!(&avg[3..], &[2.5, 3.0]);

        let last = extend(
            &history,
            2,
            ExtrapolationPolicy::BaseStep { method: BaseMethod::Last, step: None },
        )
        .unwrap();
        assert_eq!(&last[3..], &[3.0, 3.0]);
    }

    #[test]
    fn test_zero_horizon_returns_history() {
        let result = extend(&[1.0, 2.0], 0, ExtrapolationPolicy::Glide { start: 0.0, end: 1.0 }).unwrap();
        assert_eq!(result, vec![1.0, 2.0]);
    }

    #[test]
    fn test_negative_horizon_fails() {
        assert_eq!(
            extend(&[1.0], -1, ExtrapolationPolicy::flat(1.0)),
            Err(SeriesError::NegativeHorizon(-1))
        );
    }

    #[test]
    fn test_last_on_empty_history_fails() {
        let policy = ExtrapolationPolicy::BaseStep { method: BaseMethod::Last, step: None };
        assert_eq!(extend(&[], 2, policy), Err(SeriesError::EmptySeries));
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            ExtrapolationPolicy::from_parts(Some(0.1), Some(0.03), None, None).unwrap(),
            ExtrapolationPolicy::Glide { start: 0.1, end: 0.03 }
        );
        assert_eq!(
            ExtrapolationPolicy::from_parts(Some(0.1), None, Some("average"), Some(0.01)).unwrap(),
            ExtrapolationPolicy::BaseStep { method: BaseMethod::Average, step: Some(0.01) }
        );
        assert_eq!(
            ExtrapolationPolicy::from_parts(None, None, Some("median"), None),
            Err(SeriesError::UnsupportedMethod("median".to_string()))
        );
    }
}
