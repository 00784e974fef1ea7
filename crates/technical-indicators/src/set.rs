use crate::indicators::{self, BollingerBands, MacdResult, StochasticResult};
use serde::{Deserialize, Serialize};
use signal_core::{series, AnalysisError, IndicatorWindows, PriceSeries};
use std::collections::BTreeMap;

/// Every configured indicator for one series, each sequence holding one entry
/// per price point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub sma: BTreeMap<usize, Vec<Option<f64>>>,
    pub ema: BTreeMap<usize, Vec<Option<f64>>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: MacdResult,
    pub bollinger: BollingerBands,
    pub stochastic: StochasticResult,
    pub atr: Vec<Option<f64>>,
    pub obv: Vec<f64>,
}

impl IndicatorSet {
    /// Computes the full set, or fails as a whole. The length check up front
    /// means no partial set is ever produced.
    pub fn compute(
        prices: &PriceSeries,
        windows: &IndicatorWindows,
    ) -> Result<Self, AnalysisError> {
        windows.validate()?;
        let required = windows.required_len();
        if prices.len() < required {
            return Err(AnalysisError::InsufficientData(format!(
                "Series has {} points but the configured windows need at least {}",
                prices.len(),
                required
            )));
        }

        let closes = prices.closes();
        let points = prices.points();

        let mut sma = BTreeMap::new();
        for &w in &windows.sma {
            sma.insert(w, series::rolling_mean(&closes, w)?);
        }
        let mut ema = BTreeMap::new();
        for &w in &windows.ema {
            ema.insert(w, series::ema(&closes, w)?);
        }

        Ok(Self {
            sma,
            ema,
            rsi: indicators::rsi(&closes, windows.rsi)?,
            macd: indicators::macd(
                &closes,
                windows.macd.fast,
                windows.macd.slow,
                windows.macd.signal,
            )?,
            bollinger: indicators::bollinger_bands(
                &closes,
                windows.bollinger.window,
                windows.bollinger.k,
            )?,
            stochastic: indicators::stochastic(
                points,
                windows.stochastic.window,
                windows.stochastic.d,
            )?,
            atr: indicators::atr(points, windows.atr)?,
            obv: indicators::obv(points)?,
        })
    }

    pub fn latest_sma(&self, window: usize) -> Option<f64> {
        self.sma.get(&window).and_then(|s| latest(s))
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        latest(&self.rsi)
    }

    pub fn latest_atr(&self) -> Option<f64> {
        latest(&self.atr)
    }
}

/// Last defined value of an aligned sequence.
pub fn latest(sequence: &[Option<f64>]) -> Option<f64> {
    sequence.iter().rev().flatten().copied().next()
}
