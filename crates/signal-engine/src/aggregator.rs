use signal_core::{CompositeSignal, Conviction, FactorScore, Horizon};

/// Factor weights (technical, fundamental, risk) per horizon. Short horizons
/// lean on price action, long horizons on fundamentals; the risk weight is
/// constant.
pub fn horizon_weights(horizon: Horizon) -> (f64, f64, f64) {
    match horizon {
        Horizon::Short => (0.6, 0.2, 0.2),
        Horizon::Medium => (0.4, 0.4, 0.2),
        Horizon::Long => (0.2, 0.6, 0.2),
    }
}

/// Blends the factor scores into one composite in [-1, 1].
///
/// When no fundamental score exists its weight drops out entirely and the
/// technical score carries the directional component alone. The risk penalty
/// is always subtracted afterwards.
pub fn combine(
    technical: &FactorScore,
    fundamental: Option<&FactorScore>,
    risk_penalty: f64,
    horizon: Horizon,
) -> CompositeSignal {
    let (w_technical, w_fundamental, w_risk) = horizon_weights(horizon);
    let technical_score = technical.score;
    let fundamental_score = fundamental.map(|f| f.score);

    let (directional, directional_weight) = match fundamental_score {
        Some(f) => (
            w_technical * technical_score + w_fundamental * f,
            w_technical + w_fundamental,
        ),
        None => (w_technical * technical_score, w_technical),
    };
    let composite_score =
        (directional / directional_weight - w_risk * risk_penalty).clamp(-1.0, 1.0);

    CompositeSignal {
        technical_score,
        fundamental_score,
        risk_penalty,
        composite_score,
        conviction: conviction_for(composite_score, technical_score, fundamental_score),
    }
}

/// High conviction needs both magnitude and strict sign agreement between the
/// factors; disagreement caps the tier at Medium no matter how large the
/// composite is.
fn conviction_for(composite: f64, technical: f64, fundamental: Option<f64>) -> Conviction {
    let magnitude = composite.abs();
    let agree = fundamental.map_or(true, |f| technical * f > 0.0);
    let disagree = fundamental.map_or(false, |f| technical * f < 0.0);

    let tier = if magnitude >= 0.66 && agree {
        Conviction::High
    } else if magnitude >= 0.33 {
        Conviction::Medium
    } else {
        Conviction::Low
    };

    if disagree {
        tier.min(Conviction::Medium)
    } else {
        tier
    }
}
