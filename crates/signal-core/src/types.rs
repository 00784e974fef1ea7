use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OHLCV observation for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// Number of periods in a year, used to annualize per-period statistics.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Interval::Daily => 252.0,
            Interval::Weekly => 52.0,
            Interval::Monthly => 12.0,
        }
    }
}

/// Investment horizon steering the factor weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

/// Ordered price history for one instrument.
///
/// Points are validated at construction and never mutated afterwards, so every
/// computation over the same series sees the same data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    interval: Interval,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting empty input and out-of-order or duplicate
    /// timestamps.
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        points: Vec<PricePoint>,
    ) -> Result<Self, AnalysisError> {
        if points.is_empty() {
            return Err(AnalysisError::DegenerateInput(
                "Price series has no points".to_string(),
            ));
        }
        for pair in points.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AnalysisError::DegenerateInput(format!(
                    "Timestamps must be strictly increasing, found {} after {}",
                    pair[1].timestamp, pair[0].timestamp
                )));
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            interval,
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

/// Whether returns were derived as arithmetic or log differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    Simple,
    Log,
}

/// Per-period returns derived from a price series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub kind: ReturnKind,
    pub interval: Interval,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    /// Arithmetic returns close-over-close.
    pub fn simple(series: &PriceSeries) -> Result<Self, AnalysisError> {
        let values = crate::series::simple_returns(&series.closes())?;
        Ok(Self {
            kind: ReturnKind::Simple,
            interval: series.interval(),
            values,
        })
    }

    /// Natural-log returns close-over-close.
    pub fn log(series: &PriceSeries) -> Result<Self, AnalysisError> {
        let values = crate::series::log_returns(&series.closes())?;
        Ok(Self {
            kind: ReturnKind::Log,
            interval: series.interval(),
            values,
        })
    }

    pub fn annualization_factor(&self) -> f64 {
        self.interval.periods_per_year()
    }
}

/// Point-in-time fundamental ratios for one instrument, grouped by family.
/// All maps are optional inputs; an empty snapshot simply scores nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    #[serde(default)]
    pub valuation: BTreeMap<String, f64>,
    #[serde(default)]
    pub profitability: BTreeMap<String, f64>,
    #[serde(default)]
    pub growth: BTreeMap<String, f64>,
}

impl FundamentalSnapshot {
    /// Looks a ratio up across all three groups.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.valuation
            .get(name)
            .or_else(|| self.profitability.get(name))
            .or_else(|| self.growth.get(name))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.valuation.is_empty() && self.profitability.is_empty() && self.growth.is_empty()
    }
}

/// Peer-group ratio samples used to rank a snapshot cross-sectionally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerReference {
    pub ratios: BTreeMap<String, Vec<f64>>,
}

impl PeerReference {
    pub fn samples(&self, name: &str) -> Option<&[f64]> {
        self.ratios.get(name).map(|v| v.as_slice())
    }
}

/// Normalized factor score in [-1, 1] plus the names of the rules that fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScore {
    pub score: f64,
    pub tags: Vec<String>,
}

/// Return-based risk statistics over one lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Population standard deviation of per-period returns, annualized.
    pub annualized_volatility: f64,
    /// None when volatility is exactly zero.
    pub sharpe_ratio: Option<f64>,
    /// None when the window has no negative returns.
    pub sortino_ratio: Option<f64>,
    /// Deepest peak-to-trough loss as a negative fraction.
    pub max_drawdown: f64,
    /// Periods from the peak to the trough of the deepest drawdown.
    pub max_drawdown_duration: usize,
    /// Whether the equity curve later exceeded the peak of that drawdown.
    pub max_drawdown_recovered: bool,
    /// Latest level relative to the running peak, a negative fraction or zero.
    pub current_drawdown: f64,
}

/// Summary of the return window itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStats {
    pub cumulative_return: f64,
    pub mean_return: f64,
    /// Share of periods with a strictly positive return.
    pub positive_share: f64,
}

/// Confidence tier attached to a composite signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conviction {
    Low,
    Medium,
    High,
}

/// Blended output of the factor scores for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub technical_score: f64,
    /// None when no usable fundamental data was supplied.
    #[serde(default)]
    pub fundamental_score: Option<f64>,
    /// Risk penalty in [0, 1] already applied to the composite.
    pub risk_penalty: f64,
    pub composite_score: f64,
    pub conviction: Conviction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

/// Position size bucket derived from action and conviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSizing {
    Full,
    Half,
    Quarter,
    Hold,
    Exit,
}

/// Actionable output for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    pub conviction: Conviction,
    pub price_target: f64,
    pub stop_loss: f64,
    pub sizing: PositionSizing,
    /// Sorted, deduplicated names of every rule that contributed.
    pub rationale_tags: Vec<String>,
}
