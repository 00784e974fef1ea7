use crate::{aggregator, recommendation};
use chrono::{DateTime, Utc};
use fundamental_scoring::{score_fundamentals, FundamentalReport};
use risk_metrics::{return_stats, risk_penalty, risk_profile, RiskPenalty};
use serde::{Deserialize, Serialize};
use signal_core::{
    AnalysisError, CompositeSignal, EngineConfig, FundamentalSnapshot, Horizon, Interval,
    PeerReference, PriceSeries, Recommendation, ReturnSeries, ReturnStats, RiskProfile,
};
use technical_indicators::{latest, technical_score, IndicatorSet};
use tracing::{debug, info, warn};

/// Full evaluation of one instrument, timestamped by its own data rather
/// than the wall clock so repeat runs over the same series are identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub interval: Interval,
    pub horizon: Horizon,
    pub as_of: DateTime<Utc>,
    pub close: f64,
    pub indicators: IndicatorSet,
    pub returns: ReturnStats,
    pub risk: RiskProfile,
    pub risk_penalty: RiskPenalty,
    #[serde(default)]
    pub fundamentals: Option<FundamentalReport>,
    pub signal: CompositeSignal,
    pub recommendation: Recommendation,
}

/// Pure, synchronous analysis pipeline. Construction validates the
/// configuration once; afterwards the same immutable config is applied to
/// every series.
pub struct SignalEngine {
    config: EngineConfig,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the whole pipeline over one series.
    ///
    /// Series-level problems (too short for the windows or the lookback) fail
    /// the call; unusable fundamentals only drop the fundamental factor.
    pub fn analyze(
        &self,
        prices: &PriceSeries,
        fundamentals: Option<&FundamentalSnapshot>,
        peers: Option<&PeerReference>,
    ) -> Result<AnalysisReport, AnalysisError> {
        debug!("Analyzing {} over {} points", prices.symbol(), prices.len());

        let indicators = IndicatorSet::compute(prices, &self.config.windows)?;
        let last = prices.last().ok_or_else(|| {
            AnalysisError::DegenerateInput("Price series has no points".to_string())
        })?;
        let close = last.close;

        let full_returns = ReturnSeries::simple(prices)?;
        if full_returns.values.len() < self.config.lookback {
            return Err(AnalysisError::InsufficientData(format!(
                "Lookback of {} return periods needs at least {} price points, got {}",
                self.config.lookback,
                self.config.lookback + 1,
                prices.len()
            )));
        }
        let start = full_returns.values.len() - self.config.lookback;
        let window_returns = ReturnSeries {
            kind: full_returns.kind,
            interval: full_returns.interval,
            values: full_returns.values[start..].to_vec(),
        };

        let risk = risk_profile(&window_returns, self.config.risk_free_rate)?;
        let returns = return_stats(&window_returns)?;
        let penalty = risk_penalty(&window_returns)?;

        let technical = technical_score(close, &indicators);

        let fundamental_report = match (fundamentals, peers) {
            (Some(snapshot), Some(reference)) => {
                match score_fundamentals(snapshot, reference) {
                    Ok(report) => Some(report),
                    Err(AnalysisError::MissingFundamentalData(reason)) => {
                        warn!(
                            "Dropping fundamental factor for {}: {}",
                            prices.symbol(),
                            reason
                        );
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            _ => None,
        };
        let fundamental_factor = fundamental_report.as_ref().map(|r| r.factor_score());

        let signal = aggregator::combine(
            &technical,
            fundamental_factor.as_ref(),
            penalty.value,
            self.config.horizon,
        );
        let fundamental_tags = fundamental_report
            .as_ref()
            .map(|r| r.tags.as_slice())
            .unwrap_or(&[]);
        let recommendation = recommendation::recommend(
            &signal,
            close,
            latest(&indicators.atr),
            &risk,
            &penalty,
            &technical.tags,
            fundamental_tags,
            &self.config,
        )?;

        info!(
            "{}: composite {:.3}, {:?} at {:?} conviction",
            prices.symbol(),
            signal.composite_score,
            recommendation.action,
            recommendation.conviction
        );

        Ok(AnalysisReport {
            symbol: prices.symbol().to_string(),
            interval: prices.interval(),
            horizon: self.config.horizon,
            as_of: last.timestamp,
            close,
            indicators,
            returns,
            risk,
            risk_penalty: penalty,
            fundamentals: fundamental_report,
            signal,
            recommendation,
        })
    }
}
