//! Rolling-window primitives shared by the indicator and risk layers.
//!
//! Every rolling function returns one entry per input sample, with `None`
//! for warm-up positions where the window is not yet filled. Callers can
//! therefore index results with the same index as the source series.

use crate::error::AnalysisError;

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Standard deviation with the population (1/n) normalizer.
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

fn check_window(data: &[f64], window: usize, what: &str) -> Result<(), AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "{} window must be at least 1",
            what
        )));
    }
    if data.len() < window {
        return Err(AnalysisError::InsufficientData(format!(
            "{} over {} periods needs at least {} samples, got {}",
            what,
            window,
            window,
            data.len()
        )));
    }
    Ok(())
}

/// Simple moving average, defined from index `window - 1`.
pub fn rolling_mean(data: &[f64], window: usize) -> Result<Vec<Option<f64>>, AnalysisError> {
    check_window(data, window, "Rolling mean")?;
    let mut out = vec![None; data.len()];
    for i in window - 1..data.len() {
        out[i] = Some(mean(&data[i + 1 - window..=i]));
    }
    Ok(out)
}

/// Rolling population standard deviation, defined from index `window - 1`.
pub fn rolling_std_dev(data: &[f64], window: usize) -> Result<Vec<Option<f64>>, AnalysisError> {
    check_window(data, window, "Rolling standard deviation")?;
    let mut out = vec![None; data.len()];
    for i in window - 1..data.len() {
        out[i] = Some(population_std_dev(&data[i + 1 - window..=i]));
    }
    Ok(out)
}

/// Exponential moving average seeded with the mean of the first `window`
/// samples, so it is defined from index `window - 1` like `rolling_mean`.
pub fn ema(data: &[f64], window: usize) -> Result<Vec<Option<f64>>, AnalysisError> {
    check_window(data, window, "EMA")?;
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut out = vec![None; data.len()];
    let mut value = mean(&data[..window]);
    out[window - 1] = Some(value);
    for i in window..data.len() {
        value = alpha * data[i] + (1.0 - alpha) * value;
        out[i] = Some(value);
    }
    Ok(out)
}

/// Arithmetic close-over-close returns; one entry shorter than the input.
pub fn simple_returns(closes: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    if closes.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "Returns need at least 2 closes, got {}",
            closes.len()
        )));
    }
    let mut out = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        if pair[0] <= 0.0 {
            return Err(AnalysisError::DegenerateInput(format!(
                "Non-positive close {} in return computation",
                pair[0]
            )));
        }
        out.push(pair[1] / pair[0] - 1.0);
    }
    Ok(out)
}

/// Natural-log returns; one entry shorter than the input.
pub fn log_returns(closes: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    if closes.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "Returns need at least 2 closes, got {}",
            closes.len()
        )));
    }
    let mut out = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        if pair[0] <= 0.0 || pair[1] <= 0.0 {
            return Err(AnalysisError::DegenerateInput(format!(
                "Non-positive close {} in log return computation",
                if pair[0] <= 0.0 { pair[0] } else { pair[1] }
            )));
        }
        out.push((pair[1] / pair[0]).ln());
    }
    Ok(out)
}

/// Fraction of `samples` strictly below `value`, counting ties at half weight.
pub fn percentile_rank(value: f64, samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.5;
    }
    let below = samples.iter().filter(|&&x| x < value).count() as f64;
    let equal = samples.iter().filter(|&&x| x == value).count() as f64;
    (below + 0.5 * equal) / samples.len() as f64
}
