use risk_metrics::RiskPenalty;
use signal_core::{
    Action, AnalysisError, CompositeSignal, Conviction, EngineConfig, PositionSizing,
    Recommendation, RiskProfile,
};

/// Penalty-component rank past which a risk tag is attached.
const RISK_TAG_THRESHOLD: f64 = 0.75;

/// Turns a composite signal into an actionable recommendation.
///
/// Never produced without a stop-loss: an undefined latest ATR is an error,
/// not a recommendation with a hole in it.
pub fn recommend(
    signal: &CompositeSignal,
    close: f64,
    latest_atr: Option<f64>,
    risk: &RiskProfile,
    penalty: &RiskPenalty,
    technical_tags: &[String],
    fundamental_tags: &[String],
    config: &EngineConfig,
) -> Result<Recommendation, AnalysisError> {
    if close <= 0.0 {
        return Err(AnalysisError::DegenerateInput(format!(
            "Latest close must be positive, got {}",
            close
        )));
    }
    let atr = latest_atr.ok_or_else(|| {
        AnalysisError::InsufficientData(
            "Stop-loss placement needs a defined ATR for the latest point".to_string(),
        )
    })?;

    let action = if signal.composite_score >= config.thresholds.buy {
        Action::Buy
    } else if signal.composite_score <= config.thresholds.sell {
        Action::Sell
    } else {
        Action::Hold
    };

    // Expected move scales the composite by the instrument's own volatility
    let price_target = close * (1.0 + signal.composite_score * risk.annualized_volatility);
    let stop_loss = match action {
        Action::Sell => close + config.stop_loss_k * atr,
        _ => close - config.stop_loss_k * atr,
    };

    let mut rationale_tags: Vec<String> = technical_tags
        .iter()
        .chain(fundamental_tags.iter())
        .cloned()
        .collect();
    if penalty.volatility_rank >= RISK_TAG_THRESHOLD {
        rationale_tags.push("risk_high_volatility".to_string());
    }
    if penalty.drawdown_rank >= RISK_TAG_THRESHOLD {
        rationale_tags.push("risk_deep_drawdown".to_string());
    }
    rationale_tags.sort();
    rationale_tags.dedup();

    Ok(Recommendation {
        action,
        conviction: signal.conviction,
        price_target,
        stop_loss,
        sizing: position_sizing(action, signal.conviction),
        rationale_tags,
    })
}

/// Buy size scales with conviction; holds keep the current position and
/// sells always exit in full.
pub fn position_sizing(action: Action, conviction: Conviction) -> PositionSizing {
    match (action, conviction) {
        (Action::Buy, Conviction::High) => PositionSizing::Full,
        (Action::Buy, Conviction::Medium) => PositionSizing::Half,
        (Action::Buy, Conviction::Low) => PositionSizing::Quarter,
        (Action::Hold, _) => PositionSizing::Hold,
        (Action::Sell, _) => PositionSizing::Exit,
    }
}
