//! Cross-sectional fundamental scoring.
//!
//! Each ratio in the registry is ranked against the peer group with a
//! midpoint-tie percentile, mapped linearly to [-1, 1] and flipped where a
//! lower reading is the better one. Ratios missing from either the snapshot
//! or the peer reference drop out and the remaining weights renormalize, so
//! the aggregate is always a weighted mean of the ratios that were actually
//! scored.

use serde::{Deserialize, Serialize};
use signal_core::{series, AnalysisError, FactorScore, FundamentalSnapshot, PeerReference};
use std::collections::BTreeMap;

/// Which statement family a ratio describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioGroup {
    Valuation,
    Profitability,
    Growth,
}

/// Whether a high reading is favorable or unfavorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioDirection {
    HigherIsBetter,
    LowerIsBetter,
}

/// One scored ratio in the registry.
#[derive(Debug, Clone, Copy)]
pub struct RatioDef {
    pub name: &'static str,
    pub group: RatioGroup,
    pub direction: RatioDirection,
    pub weight: f64,
}

/// The ratio universe. Valuation multiples and leverage carry the heaviest
/// weights.
pub const RATIO_REGISTRY: &[RatioDef] = &[
    RatioDef {
        name: "pe_ratio",
        group: RatioGroup::Valuation,
        direction: RatioDirection::LowerIsBetter,
        weight: 3.0,
    },
    RatioDef {
        name: "forward_pe",
        group: RatioGroup::Valuation,
        direction: RatioDirection::LowerIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "pb_ratio",
        group: RatioGroup::Valuation,
        direction: RatioDirection::LowerIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "ps_ratio",
        group: RatioGroup::Valuation,
        direction: RatioDirection::LowerIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "ev_ebitda",
        group: RatioGroup::Valuation,
        direction: RatioDirection::LowerIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "profit_margin",
        group: RatioGroup::Profitability,
        direction: RatioDirection::HigherIsBetter,
        weight: 2.0,
    },
    RatioDef {
        name: "operating_margin",
        group: RatioGroup::Profitability,
        direction: RatioDirection::HigherIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "roe",
        group: RatioGroup::Profitability,
        direction: RatioDirection::HigherIsBetter,
        weight: 2.0,
    },
    RatioDef {
        name: "roa",
        group: RatioGroup::Profitability,
        direction: RatioDirection::HigherIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "debt_equity",
        group: RatioGroup::Profitability,
        direction: RatioDirection::LowerIsBetter,
        weight: 3.0,
    },
    RatioDef {
        name: "current_ratio",
        group: RatioGroup::Profitability,
        direction: RatioDirection::HigherIsBetter,
        weight: 1.0,
    },
    RatioDef {
        name: "revenue_growth",
        group: RatioGroup::Growth,
        direction: RatioDirection::HigherIsBetter,
        weight: 2.0,
    },
    RatioDef {
        name: "earnings_growth",
        group: RatioGroup::Growth,
        direction: RatioDirection::HigherIsBetter,
        weight: 2.0,
    },
];

/// Threshold past which a single ratio contributes a rationale tag.
const TAG_THRESHOLD: f64 = 0.5;

/// One ratio's raw value, peer percentile and directed score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRatio {
    pub raw: f64,
    pub peer_percentile: f64,
    pub score: f64,
}

/// Scored fundamentals for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalReport {
    pub ratios: BTreeMap<String, ScoredRatio>,
    /// Registry names absent from the snapshot or the peer reference.
    pub missing: Vec<String>,
    pub score: f64,
    pub tags: Vec<String>,
}

impl FundamentalReport {
    pub fn factor_score(&self) -> FactorScore {
        FactorScore {
            score: self.score,
            tags: self.tags.clone(),
        }
    }
}

/// Scores a snapshot against its peer group.
///
/// Fails with [`AnalysisError::MissingFundamentalData`] only when not a
/// single registry ratio is present on both sides.
pub fn score_fundamentals(
    snapshot: &FundamentalSnapshot,
    peers: &PeerReference,
) -> Result<FundamentalReport, AnalysisError> {
    let mut ratios = BTreeMap::new();
    let mut missing = Vec::new();
    let mut tags = Vec::new();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for def in RATIO_REGISTRY {
        let raw = match snapshot.get(def.name) {
            Some(value) => value,
            None => {
                missing.push(def.name.to_string());
                continue;
            }
        };
        let samples = match peers.samples(def.name) {
            Some(samples) if !samples.is_empty() => samples,
            _ => {
                missing.push(def.name.to_string());
                continue;
            }
        };

        let peer_percentile = series::percentile_rank(raw, samples);
        let mut score = 2.0 * peer_percentile - 1.0;
        if def.direction == RatioDirection::LowerIsBetter {
            score = -score;
        }

        if score >= TAG_THRESHOLD {
            tags.push(format!("{}_favorable", def.name));
        } else if score <= -TAG_THRESHOLD {
            tags.push(format!("{}_unfavorable", def.name));
        }

        weighted_sum += score * def.weight;
        total_weight += def.weight;
        ratios.insert(
            def.name.to_string(),
            ScoredRatio {
                raw,
                peer_percentile,
                score,
            },
        );
    }

    if total_weight == 0.0 {
        return Err(AnalysisError::MissingFundamentalData(
            "No registry ratio present in both the snapshot and the peer reference".to_string(),
        ));
    }

    Ok(FundamentalReport {
        ratios,
        missing,
        score: weighted_sum / total_weight,
        tags,
    })
}
