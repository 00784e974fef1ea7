use crate::error::AnalysisError;
use crate::types::Horizon;
use serde::{Deserialize, Serialize};

/// MACD window triple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdWindows {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Bollinger band window and standard-deviation multiple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerWindow {
    pub window: usize,
    pub k: f64,
}

/// Stochastic oscillator %K window and %D smoothing length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochasticWindow {
    pub window: usize,
    pub d: usize,
}

/// Window sizes for every indicator family. Defaults are the widely used
/// textbook values: SMA 20/50/200, EMA 12/26, RSI 14, MACD 12/26/9,
/// Bollinger 20 with k = 2, stochastic 14/3, ATR 14.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorWindows {
    pub sma: Vec<usize>,
    pub ema: Vec<usize>,
    pub rsi: usize,
    pub macd: MacdWindows,
    pub bollinger: BollingerWindow,
    pub stochastic: StochasticWindow,
    pub atr: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            sma: vec![20, 50, 200],
            ema: vec![12, 26],
            rsi: 14,
            macd: MacdWindows {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            bollinger: BollingerWindow { window: 20, k: 2.0 },
            stochastic: StochasticWindow { window: 14, d: 3 },
            atr: 14,
        }
    }
}

impl IndicatorWindows {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sma.is_empty() || self.ema.is_empty() {
            return Err(AnalysisError::InvalidConfiguration(
                "At least one SMA and one EMA window must be configured".to_string(),
            ));
        }
        if self.sma.iter().chain(self.ema.iter()).any(|&w| w == 0) {
            return Err(AnalysisError::InvalidConfiguration(
                "Moving average windows must be at least 1".to_string(),
            ));
        }
        if self.rsi == 0 || self.atr == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "RSI and ATR windows must be at least 1".to_string(),
            ));
        }
        if self.macd.fast == 0 || self.macd.slow == 0 || self.macd.signal == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "MACD windows must be at least 1".to_string(),
            ));
        }
        if self.macd.fast >= self.macd.slow {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "MACD fast window {} must be shorter than slow window {}",
                self.macd.fast, self.macd.slow
            )));
        }
        if self.bollinger.window == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "Bollinger window must be at least 1".to_string(),
            ));
        }
        if self.bollinger.k <= 0.0 || !self.bollinger.k.is_finite() {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Bollinger k must be a positive finite number, got {}",
                self.bollinger.k
            )));
        }
        if self.stochastic.window == 0 || self.stochastic.d == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "Stochastic windows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Shortest series length for which every configured indicator has a
    /// defined value.
    pub fn required_len(&self) -> usize {
        let mut required = 2;
        for &w in self.sma.iter().chain(self.ema.iter()) {
            required = required.max(w);
        }
        required = required.max(self.rsi + 1);
        required = required.max(self.macd.slow + self.macd.signal - 1);
        required = required.max(self.bollinger.window);
        required = required.max(self.stochastic.window + self.stochastic.d - 1);
        required.max(self.atr + 1)
    }
}

/// Buy/sell cutoffs applied to the composite score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionThresholds {
    pub buy: f64,
    pub sell: f64,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            buy: 0.2,
            sell: -0.2,
        }
    }
}

/// Complete engine configuration, validated once and then threaded through
/// every call unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub windows: IndicatorWindows,
    pub horizon: Horizon,
    /// Annualized risk-free rate used by Sharpe and Sortino. Default 4.5%.
    pub risk_free_rate: f64,
    /// Number of return periods in the risk window. Default 252.
    pub lookback: usize,
    pub thresholds: ActionThresholds,
    /// ATR multiple for stop-loss placement. Default 2.
    pub stop_loss_k: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            windows: IndicatorWindows::default(),
            horizon: Horizon::Medium,
            risk_free_rate: 0.045,
            lookback: 252,
            thresholds: ActionThresholds::default(),
            stop_loss_k: 2.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.windows.validate()?;
        if !self.risk_free_rate.is_finite() {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Risk-free rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if self.lookback < 2 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Lookback must cover at least 2 return periods, got {}",
                self.lookback
            )));
        }
        if self.thresholds.buy <= self.thresholds.sell {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Buy threshold {} must be above sell threshold {}",
                self.thresholds.buy, self.thresholds.sell
            )));
        }
        if self.stop_loss_k <= 0.0 || !self.stop_loss_k.is_finite() {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Stop-loss multiple must be a positive finite number, got {}",
                self.stop_loss_k
            )));
        }
        Ok(())
    }
}
