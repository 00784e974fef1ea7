use crate::set::{latest, IndicatorSet};
use signal_core::FactorScore;

/// Periods the OBV trend comparison looks back over.
const OBV_TREND_SPAN: usize = 5;

/// Scores the latest state of an indicator set in [-1, 1].
///
/// Each rule that fires contributes its weight with a bullish or bearish
/// sign; the sum is normalized by the total weight of the rules that fired,
/// so one loud rule cannot leave the range.
pub fn technical_score(close: f64, indicators: &IndicatorSet) -> FactorScore {
    let mut signals: Vec<(&'static str, i32, bool)> = Vec::new();

    // Moving-average stack, shortest window first thanks to the BTreeMap
    let smas: Vec<f64> = indicators.sma.values().filter_map(|s| latest(s)).collect();
    if !smas.is_empty() {
        let stacked_up = close > smas[0] && smas.windows(2).all(|w| w[0] > w[1]);
        let stacked_down = close < smas[0] && smas.windows(2).all(|w| w[0] < w[1]);
        if stacked_up {
            signals.push(("ma_alignment_bullish", 3, true));
        } else if stacked_down {
            signals.push(("ma_alignment_bearish", 3, false));
        }
        if let Some(&longest) = smas.last() {
            if close > longest {
                signals.push(("trend_above_long_sma", 2, true));
            } else if close < longest {
                signals.push(("trend_below_long_sma", 2, false));
            }
        }
    }

    if let Some(value) = indicators.latest_rsi() {
        if value < 30.0 {
            signals.push(("rsi_oversold", 2, true));
        } else if value > 70.0 {
            signals.push(("rsi_overbought", 2, false));
        }
    }

    if let (Some(line), Some(signal_line)) = (
        latest(&indicators.macd.macd_line),
        latest(&indicators.macd.signal_line),
    ) {
        if line > signal_line {
            signals.push(("macd_bullish", 2, true));
        } else if line < signal_line {
            signals.push(("macd_bearish", 2, false));
        }
    }

    if let (Some(upper), Some(lower)) = (
        latest(&indicators.bollinger.upper),
        latest(&indicators.bollinger.lower),
    ) {
        if close < lower {
            signals.push(("bollinger_oversold", 1, true));
        } else if close > upper {
            signals.push(("bollinger_overbought", 1, false));
        }
    }

    if let Some(k) = latest(&indicators.stochastic.k) {
        if k < 20.0 {
            signals.push(("stochastic_oversold", 1, true));
        } else if k > 80.0 {
            signals.push(("stochastic_overbought", 1, false));
        }
    }

    if indicators.obv.len() > OBV_TREND_SPAN {
        let last = indicators.obv[indicators.obv.len() - 1];
        let prior = indicators.obv[indicators.obv.len() - 1 - OBV_TREND_SPAN];
        if last > prior {
            signals.push(("obv_accumulation", 1, true));
        } else if last < prior {
            signals.push(("obv_distribution", 1, false));
        }
    }

    let mut total_score = 0i32;
    let mut total_weight = 0i32;
    for (_, weight, bullish) in &signals {
        total_weight += weight;
        total_score += if *bullish { *weight } else { -weight };
    }

    let score = if total_weight > 0 {
        total_score as f64 / total_weight as f64
    } else {
        0.0
    };
    let tags = signals.iter().map(|(name, _, _)| name.to_string()).collect();

    FactorScore { score, tags }
}
