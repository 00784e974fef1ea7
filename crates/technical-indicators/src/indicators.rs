//! Indicator primitives over close prices or full OHLCV points.
//!
//! Each function returns sequences aligned with the input: index `i` of the
//! output describes price point `i`, with `None` during the warm-up stretch.

use serde::{Deserialize, Serialize};
use signal_core::{series, AnalysisError, PricePoint};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdResult {
    pub macd_line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticResult {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Relative Strength Index with Wilder smoothing, defined from index
/// `window`. Pinned to 100 when the average loss is zero and to 0 when the
/// average gain is zero while losses exist.
pub fn rsi(closes: &[f64], window: usize) -> Result<Vec<Option<f64>>, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "RSI window must be at least 1".to_string(),
        ));
    }
    if closes.len() < window + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "RSI({}) needs at least {} closes, got {}",
            window,
            window + 1,
            closes.len()
        )));
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut avg_gain = series::mean(&gains[..window]);
    let mut avg_loss = series::mean(&losses[..window]);
    let mut out = vec![None; closes.len()];
    out[window] = Some(rsi_value(avg_gain, avg_loss));

    // Change i feeds the value at price index i + 1
    for i in window..gains.len() {
        avg_gain = (avg_gain * (window as f64 - 1.0) + gains[i]) / window as f64;
        avg_loss = (avg_loss * (window as f64 - 1.0) + losses[i]) / window as f64;
        out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
    }
    Ok(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD line, signal line and histogram. The line is defined from index
/// `slow - 1`, the signal and histogram from `slow + signal - 2`.
pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<MacdResult, AnalysisError> {
    if fast == 0 || slow == 0 || signal == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "MACD windows must be at least 1".to_string(),
        ));
    }
    if fast >= slow {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "MACD fast window {} must be shorter than slow window {}",
            fast, slow
        )));
    }
    let needed = slow + signal - 1;
    if closes.len() < needed {
        return Err(AnalysisError::InsufficientData(format!(
            "MACD({},{},{}) needs at least {} closes, got {}",
            fast,
            slow,
            signal,
            needed,
            closes.len()
        )));
    }

    let ema_fast = series::ema(closes, fast)?;
    let ema_slow = series::ema(closes, slow)?;
    let mut macd_line = vec![None; closes.len()];
    for i in 0..closes.len() {
        if let (Some(f), Some(s)) = (ema_fast[i], ema_slow[i]) {
            macd_line[i] = Some(f - s);
        }
    }

    // Signal line is an EMA over the defined MACD values, re-aligned to the
    // close index
    let defined: Vec<f64> = macd_line.iter().flatten().copied().collect();
    let offset = closes.len() - defined.len();
    let smoothed = series::ema(&defined, signal)?;
    let mut signal_line = vec![None; closes.len()];
    for (j, value) in smoothed.into_iter().enumerate() {
        if value.is_some() {
            signal_line[offset + j] = value;
        }
    }

    let mut histogram = vec![None; closes.len()];
    for i in 0..closes.len() {
        if let (Some(m), Some(s)) = (macd_line[i], signal_line[i]) {
            histogram[i] = Some(m - s);
        }
    }

    Ok(MacdResult {
        macd_line,
        signal_line,
        histogram,
    })
}

/// Bollinger bands at `k` population standard deviations around the rolling
/// mean, defined from index `window - 1`.
pub fn bollinger_bands(
    closes: &[f64],
    window: usize,
    k: f64,
) -> Result<BollingerBands, AnalysisError> {
    let middle = series::rolling_mean(closes, window)?;
    let deviation = series::rolling_std_dev(closes, window)?;
    let upper = middle
        .iter()
        .zip(deviation.iter())
        .map(|(m, d)| match (m, d) {
            (Some(m), Some(d)) => Some(m + k * d),
            _ => None,
        })
        .collect();
    let lower = middle
        .iter()
        .zip(deviation.iter())
        .map(|(m, d)| match (m, d) {
            (Some(m), Some(d)) => Some(m - k * d),
            _ => None,
        })
        .collect();
    Ok(BollingerBands {
        upper,
        middle,
        lower,
    })
}

/// Stochastic oscillator. %K is defined from index `window - 1` and reads 50
/// when the window's high equals its low; %D smooths %K over `d` periods and
/// is defined from `window + d - 2`.
pub fn stochastic(
    points: &[PricePoint],
    window: usize,
    d: usize,
) -> Result<StochasticResult, AnalysisError> {
    if window == 0 || d == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "Stochastic windows must be at least 1".to_string(),
        ));
    }
    let needed = window + d - 1;
    if points.len() < needed {
        return Err(AnalysisError::InsufficientData(format!(
            "Stochastic({},{}) needs at least {} points, got {}",
            window,
            d,
            needed,
            points.len()
        )));
    }

    let mut k_line = vec![None; points.len()];
    for i in window - 1..points.len() {
        let slice = &points[i + 1 - window..=i];
        let highest = slice.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = slice.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
        let value = if highest == lowest {
            50.0
        } else {
            100.0 * (points[i].close - lowest) / (highest - lowest)
        };
        k_line[i] = Some(value);
    }

    let defined: Vec<f64> = k_line.iter().flatten().copied().collect();
    let offset = points.len() - defined.len();
    let smoothed = series::rolling_mean(&defined, d)?;
    let mut d_line = vec![None; points.len()];
    for (j, value) in smoothed.into_iter().enumerate() {
        if value.is_some() {
            d_line[offset + j] = value;
        }
    }

    Ok(StochasticResult { k: k_line, d: d_line })
}

/// Average True Range with Wilder smoothing, defined from index `window`.
pub fn atr(points: &[PricePoint], window: usize) -> Result<Vec<Option<f64>>, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "ATR window must be at least 1".to_string(),
        ));
    }
    if points.len() < window + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "ATR({}) needs at least {} points, got {}",
            window,
            window + 1,
            points.len()
        )));
    }

    let mut true_ranges = Vec::with_capacity(points.len() - 1);
    for pair in points.windows(2) {
        let high_low = pair[1].high - pair[1].low;
        let high_close = (pair[1].high - pair[0].close).abs();
        let low_close = (pair[1].low - pair[0].close).abs();
        true_ranges.push(high_low.max(high_close).max(low_close));
    }

    let mut out = vec![None; points.len()];
    let mut value = series::mean(&true_ranges[..window]);
    out[window] = Some(value);
    for i in window..true_ranges.len() {
        value = (value * (window as f64 - 1.0) + true_ranges[i]) / window as f64;
        out[i + 1] = Some(value);
    }
    Ok(out)
}

/// On-Balance Volume. Starts at zero so the level is a pure accumulation of
/// signed volume; defined for every point.
pub fn obv(points: &[PricePoint]) -> Result<Vec<f64>, AnalysisError> {
    if points.is_empty() {
        return Err(AnalysisError::DegenerateInput(
            "OBV needs a non-empty series".to_string(),
        ));
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(0.0);
    for i in 1..points.len() {
        let prev = out[i - 1];
        let next = if points[i].close > points[i - 1].close {
            prev + points[i].volume
        } else if points[i].close < points[i - 1].close {
            prev - points[i].volume
        } else {
            prev
        };
        out.push(next);
    }
    Ok(out)
}
