//! Lag and window helpers over a chronologically ordered slice of values
//!
//! All helpers treat the slice as the history strictly before some reference
//! point, with the most recent value last.

/// Value `lag` positions back from the end of `prior`
///
/// `lag(prior, 1)` is the most recent value. Returns `None` when `lag` is zero
/// or fewer than `lag` values are available.
pub fn lag(prior: &[f64], lag: usize) -> Option<f64> {
    if lag == 0 || prior.len() < lag {
        return None;
    }
    Some(prior[prior.len() - lag])
}

/// Mean of the last `window` values of `prior`
///
/// Fixed window with no minimum-period override: `None` until exactly
/// `window` values are available.
pub fn trailing_mean(prior: &[f64], window: usize) -> Option<f64> {
    if window == 0 || prior.len() < window {
        return None;
    }
    Some(mean(&prior[prior.len() - window..]))
}

/// Mean of the last `min(n, len)` values
///
/// Unlike [`trailing_mean`] this accepts a partial window, and only fails on
/// an empty slice.
pub fn tail_mean(values: &[f64], n: usize) -> Option<f64> {
    if values.is_empty() || n == 0 {
        return None;
    }
    let start = values.len().saturating_sub(n);
    Some(mean(&values[start..]))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
