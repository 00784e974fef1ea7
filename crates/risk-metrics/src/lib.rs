//! Return-based risk statistics: annualized volatility, Sharpe and Sortino
//! ratios, drawdown structure and a normalized risk penalty.
//!
//! Everything here consumes a [`ReturnSeries`] that the caller has already
//! windowed to the configured lookback; annualization always derives from the
//! series interval rather than an assumed daily frequency.

use serde::{Deserialize, Serialize};
use signal_core::{AnalysisError, ReturnSeries, ReturnStats, RiskProfile};
use statrs::statistics::Statistics;


/// Window length for the rolling volatility history behind the risk penalty.
const ROLLING_WINDOW: usize = 30;

/// Risk penalty in [0, 1] with its two components, each a min-max rank of the
/// current reading against the window's own history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPenalty {
    pub value: f64,
    pub volatility_rank: f64,
    pub drawdown_rank: f64,
}

/// Computes volatility, risk-adjusted ratios and drawdown structure for one
/// return window.
pub fn risk_profile(
    returns: &ReturnSeries,
    risk_free_rate: f64,
) -> Result<RiskProfile, AnalysisError> {
    let values = returns.values.as_slice();
    if values.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "Risk metrics need at least 2 returns, got {}",
            values.len()
        )));
    }

    let factor = returns.annualization_factor();
    let annualized_volatility = values.population_std_dev() * factor.sqrt();
    let annualized_return = values.mean() * factor;

    let sharpe_ratio = if annualized_volatility == 0.0 {
        None
    } else {
        Some((annualized_return - risk_free_rate) / annualized_volatility)
    };

    let downside: Vec<f64> = values.iter().copied().filter(|r| *r < 0.0).collect();
    let sortino_ratio = if downside.is_empty() {
        None
    } else {
        let downside_deviation = downside.as_slice().population_std_dev() * factor.sqrt();
        if downside_deviation == 0.0 {
            None
        } else {
            Some((annualized_return - risk_free_rate) / downside_deviation)
        }
    };

    let curve = equity_curve(values)?;
    let stats = drawdown_stats(&curve);

    Ok(RiskProfile {
        annualized_volatility,
        sharpe_ratio,
        sortino_ratio,
        max_drawdown: stats.max_drawdown,
        max_drawdown_duration: stats.duration,
        max_drawdown_recovered: stats.recovered,
        current_drawdown: stats.current_drawdown,
    })
}

/// Plain summary of the return window.
pub fn return_stats(returns: &ReturnSeries) -> Result<ReturnStats, AnalysisError> {
    let values = returns.values.as_slice();
    if values.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "Return stats need at least one return".to_string(),
        ));
    }
    let cumulative_return = values.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
    Ok(ReturnStats {
        cumulative_return,
        mean_return: values.mean(),
        positive_share: values.iter().filter(|r| **r > 0.0).count() as f64 / values.len() as f64,
    })
}

/// Ranks the window's current volatility and drawdown against their own
/// rolling history and averages the two ranks. A constant history pins the
/// corresponding rank at 0.5.
pub fn risk_penalty(returns: &ReturnSeries) -> Result<RiskPenalty, AnalysisError> {
    let values = returns.values.as_slice();
    if values.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "Risk penalty needs at least 2 returns, got {}",
            values.len()
        )));
    }

    let factor_sqrt = returns.annualization_factor().sqrt();
    let window = ROLLING_WINDOW.min(values.len());
    let mut rolling_vols = Vec::with_capacity(values.len() - window + 1);
    for i in window..=values.len() {
        rolling_vols.push(values[i - window..i].population_std_dev() * factor_sqrt);
    }
    let current_vol = rolling_vols[rolling_vols.len() - 1];
    let volatility_rank = min_max_rank(current_vol, &rolling_vols);

    let curve = equity_curve(values)?;
    let drawdowns = drawdown_sequence(&curve);
    let current_dd = drawdowns[drawdowns.len() - 1];
    // Drawdowns are negative, so the deepest reading ranks highest
    let drawdown_rank = 1.0 - min_max_rank(current_dd, &drawdowns);

    let value = ((volatility_rank + drawdown_rank) / 2.0).clamp(0.0, 1.0);
    Ok(RiskPenalty {
        value,
        volatility_rank,
        drawdown_rank,
    })
}

/// Compounded equity curve starting from the first return, without a leading
/// unit level.
fn equity_curve(values: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    let mut curve = Vec::with_capacity(values.len());
    let mut level = 1.0;
    for &r in values {
        if r <= -1.0 {
            return Err(AnalysisError::DegenerateInput(format!(
                "Return of {} wipes out the equity curve",
                r
            )));
        }
        level *= 1.0 + r;
        curve.push(level);
    }
    Ok(curve)
}

/// Level relative to the running peak at each step, zero or negative.
fn drawdown_sequence(curve: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(curve.len());
    let mut peak = f64::NEG_INFINITY;
    for &level in curve {
        if level > peak {
            peak = level;
        }
        out.push(level / peak - 1.0);
    }
    out
}

struct DrawdownStats {
    max_drawdown: f64,
    duration: usize,
    recovered: bool,
    current_drawdown: f64,
}

fn drawdown_stats(curve: &[f64]) -> DrawdownStats {
    let mut peak = curve[0];
    let mut peak_index = 0;
    let mut max_drawdown = 0.0f64;
    let mut worst_peak_index = 0;
    let mut worst_trough_index = 0;
    for (i, &level) in curve.iter().enumerate() {
        if level > peak {
            peak = level;
            peak_index = i;
        }
        let drawdown = level / peak - 1.0;
        if drawdown < max_drawdown {
            max_drawdown = drawdown;
            worst_peak_index = peak_index;
            worst_trough_index = i;
        }
    }
    let recovered = curve[worst_trough_index..]
        .iter()
        .any(|&level| level > curve[worst_peak_index]);
    DrawdownStats {
        max_drawdown,
        duration: worst_trough_index - worst_peak_index,
        recovered,
        current_drawdown: curve[curve.len() - 1] / peak - 1.0,
    }
}

fn min_max_rank(value: f64, history: &[f64]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &x in history {
        if x < min {
            min = x;
        }
        if x > max {
            max = x;
        }
    }
    if max <= min {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}
