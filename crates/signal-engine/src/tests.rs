use crate::aggregator::{combine, horizon_weights};
use crate::batch::{rank_reports, InstrumentData};
use crate::pipeline::{AnalysisReport, SignalEngine};
use crate::recommendation::{position_sizing, recommend};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use risk_metrics::RiskPenalty;
use signal_core::{
    Action, AnalysisError, CompositeSignal, Conviction, EngineConfig, FactorScore,
    FundamentalSnapshot, Horizon, Interval, MarketDataProvider, PeerReference, PositionSizing,
    PricePoint, PriceSeries, RiskProfile,
};

fn series_from(symbol: &str, closes: Vec<f64>) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let points = closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| PricePoint {
            timestamp: start + Duration::days(i as i64),
            open: close - 0.25,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000_000.0 + 500.0 * i as f64,
        })
        .collect();
    PriceSeries::new(symbol, Interval::Daily, points).unwrap()
}

// Accelerating uptrend: gains every period at an increasing pace, so every
// trend indicator resolves without ties
fn rising_series(symbol: &str, n: usize) -> PriceSeries {
    let closes = (0..n)
        .map(|i| 100.0 + 0.5 * i as f64 + 0.002 * (i as f64).powi(2))
        .collect();
    series_from(symbol, closes)
}

// Mirror image: losses every period at an increasing pace
fn falling_series(symbol: &str, n: usize) -> PriceSeries {
    let closes = (0..n)
        .map(|i| 400.0 - 0.5 * i as f64 - 0.002 * (i as f64).powi(2))
        .collect();
    series_from(symbol, closes)
}

// Trending but choppy: both gain and loss periods appear
fn wiggly_series(symbol: &str, n: usize) -> PriceSeries {
    let closes = (0..n)
        .map(|i| 150.0 + 0.3 * i as f64 + 5.0 * (0.25 * i as f64).sin())
        .collect();
    series_from(symbol, closes)
}

fn favorable_fundamentals() -> (FundamentalSnapshot, PeerReference) {
    let mut snapshot = FundamentalSnapshot::default();
    snapshot.valuation.insert("pe_ratio".to_string(), 8.0);
    snapshot.profitability.insert("roe".to_string(), 0.35);
    let mut peers = PeerReference::default();
    peers.ratios.insert("pe_ratio".to_string(), vec![12.0, 18.0, 25.0, 31.0]);
    peers.ratios.insert("roe".to_string(), vec![0.05, 0.10, 0.15, 0.20]);
    (snapshot, peers)
}

fn factor(score: f64) -> FactorScore {
    FactorScore {
        score,
        tags: vec![],
    }
}

fn sample_risk(volatility: f64) -> RiskProfile {
    RiskProfile {
        annualized_volatility: volatility,
        sharpe_ratio: Some(1.0),
        sortino_ratio: None,
        max_drawdown: -0.1,
        max_drawdown_duration: 3,
        max_drawdown_recovered: true,
        current_drawdown: 0.0,
    }
}

fn sample_penalty(volatility_rank: f64, drawdown_rank: f64) -> RiskPenalty {
    RiskPenalty {
        value: (volatility_rank + drawdown_rank) / 2.0,
        volatility_rank,
        drawdown_rank,
    }
}

fn signal_with(composite: f64, conviction: Conviction) -> CompositeSignal {
    CompositeSignal {
        technical_score: composite,
        fundamental_score: None,
        risk_penalty: 0.0,
        composite_score: composite,
        conviction,
    }
}

mod aggregation {
    use super::*;

    #[test]
    fn test_horizon_weight_profiles() {
        assert_eq!(horizon_weights(Horizon::Short), (0.6, 0.2, 0.2));
        assert_eq!(horizon_weights(Horizon::Medium), (0.4, 0.4, 0.2));
        assert_eq!(horizon_weights(Horizon::Long), (0.2, 0.6, 0.2));
    }

    #[test]
    fn test_missing_fundamental_weight_drops_out() {
        let signal = combine(&factor(0.8), None, 0.0, Horizon::Medium);
        assert!((signal.composite_score - 0.8).abs() < 1e-9);
        assert!(signal.fundamental_score.is_none());
        assert_eq!(signal.conviction, Conviction::High);
    }

    #[test]
    fn test_horizon_shifts_the_blend() {
        let short = combine(&factor(0.6), Some(&factor(0.2)), 0.0, Horizon::Short);
        assert!((short.composite_score - 0.5).abs() < 1e-9);
        let long = combine(&factor(0.6), Some(&factor(0.2)), 0.0, Horizon::Long);
        assert!((long.composite_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_risk_penalty_subtracts() {
        let signal = combine(&factor(0.5), None, 1.0, Horizon::Short);
        assert!((signal.composite_score - 0.3).abs() < 1e-9);
        assert!((signal.risk_penalty - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_composite_clamped_to_unit_range() {
        let signal = combine(&factor(-1.0), None, 1.0, Horizon::Short);
        assert!((signal.composite_score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_conviction_needs_agreement() {
        let agreeing = combine(&factor(0.9), Some(&factor(0.8)), 0.0, Horizon::Medium);
        assert_eq!(agreeing.conviction, Conviction::High);

        // Large composite, but the factors point in opposite directions
        let opposed = combine(&factor(1.0), Some(&factor(-0.01)), 0.0, Horizon::Short);
        assert!(opposed.composite_score.abs() >= 0.66);
        assert_eq!(opposed.conviction, Conviction::Medium);
    }

    #[test]
    fn test_zero_fundamental_blocks_high() {
        let signal = combine(&factor(0.9), Some(&factor(0.0)), 0.0, Horizon::Short);
        assert!(signal.composite_score.abs() >= 0.66);
        assert_eq!(signal.conviction, Conviction::Medium);
    }

    #[test]
    fn test_disagreement_never_reaches_high() {
        let signal = combine(&factor(0.9), Some(&factor(-0.9)), 0.0, Horizon::Medium);
        assert!(signal.composite_score.abs() < 1e-9);
        assert_eq!(signal.conviction, Conviction::Low);

        let tilted = combine(&factor(0.9), Some(&factor(-0.1)), 0.0, Horizon::Short);
        assert!(matches!(
            tilted.conviction,
            Conviction::Low | Conviction::Medium
        ));
    }

    #[test]
    fn test_conviction_tiers_by_magnitude() {
        let low = combine(&factor(0.2), None, 0.0, Horizon::Short);
        assert_eq!(low.conviction, Conviction::Low);
        let medium = combine(&factor(0.5), None, 0.0, Horizon::Short);
        assert_eq!(medium.conviction, Conviction::Medium);
        let high = combine(&factor(0.7), None, 0.0, Horizon::Short);
        assert_eq!(high.conviction, Conviction::High);
    }
}

mod recommendations {
    use super::*;

    #[test]
    fn test_buy_levels_and_sizing() {
        let rec = recommend(
            &signal_with(0.5, Conviction::Medium),
            100.0,
            Some(2.0),
            &sample_risk(0.3),
            &sample_penalty(0.2, 0.1),
            &[],
            &[],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(rec.action, Action::Buy);
        assert!((rec.price_target - 115.0).abs() < 1e-9);
        assert!((rec.stop_loss - 96.0).abs() < 1e-9);
        assert_eq!(rec.sizing, PositionSizing::Half);
    }

    #[test]
    fn test_sell_stop_sits_above() {
        let rec = recommend(
            &signal_with(-0.5, Conviction::Medium),
            100.0,
            Some(2.0),
            &sample_risk(0.3),
            &sample_penalty(0.2, 0.1),
            &[],
            &[],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(rec.action, Action::Sell);
        assert!((rec.price_target - 85.0).abs() < 1e-9);
        assert!((rec.stop_loss - 104.0).abs() < 1e-9);
        assert_eq!(rec.sizing, PositionSizing::Exit);
    }

    #[test]
    fn test_hold_keeps_a_protective_stop() {
        let rec = recommend(
            &signal_with(0.0, Conviction::Low),
            100.0,
            Some(2.0),
            &sample_risk(0.3),
            &sample_penalty(0.2, 0.1),
            &[],
            &[],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(rec.action, Action::Hold);
        assert!((rec.stop_loss - 96.0).abs() < 1e-9);
        assert_eq!(rec.sizing, PositionSizing::Hold);
    }

    #[test]
    fn test_undefined_atr_is_an_error() {
        let result = recommend(
            &signal_with(0.5, Conviction::Medium),
            100.0,
            None,
            &sample_risk(0.3),
            &sample_penalty(0.2, 0.1),
            &[],
            &[],
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));
    }

    #[test]
    fn test_rationale_tags_merged_sorted_deduped() {
        let technical = vec![
            "trend_above_long_sma".to_string(),
            "macd_bullish".to_string(),
        ];
        let fundamental = vec![
            "pe_ratio_favorable".to_string(),
            "macd_bullish".to_string(),
        ];
        let rec = recommend(
            &signal_with(0.5, Conviction::Medium),
            100.0,
            Some(2.0),
            &sample_risk(0.3),
            &sample_penalty(0.8, 0.9),
            &technical,
            &fundamental,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(
            rec.rationale_tags,
            vec![
                "macd_bullish".to_string(),
                "pe_ratio_favorable".to_string(),
                "risk_deep_drawdown".to_string(),
                "risk_high_volatility".to_string(),
                "trend_above_long_sma".to_string(),
            ]
        );
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let mut config = EngineConfig::default();
        config.thresholds.buy = 0.1;
        let rec = recommend(
            &signal_with(0.15, Conviction::Low),
            100.0,
            Some(2.0),
            &sample_risk(0.3),
            &sample_penalty(0.2, 0.1),
            &[],
            &[],
            &config,
        )
        .unwrap();
        assert_eq!(rec.action, Action::Buy);
        assert_eq!(rec.sizing, PositionSizing::Quarter);
    }

    #[test]
    fn test_sizing_map() {
        assert_eq!(
            position_sizing(Action::Buy, Conviction::High),
            PositionSizing::Full
        );
        assert_eq!(
            position_sizing(Action::Buy, Conviction::Medium),
            PositionSizing::Half
        );
        assert_eq!(
            position_sizing(Action::Buy, Conviction::Low),
            PositionSizing::Quarter
        );
        assert_eq!(
            position_sizing(Action::Hold, Conviction::High),
            PositionSizing::Hold
        );
        assert_eq!(
            position_sizing(Action::Sell, Conviction::High),
            PositionSizing::Exit
        );
    }

    #[test]
    fn test_non_positive_close_is_degenerate() {
        let result = recommend(
            &signal_with(0.5, Conviction::Medium),
            0.0,
            Some(2.0),
            &sample_risk(0.3),
            &sample_penalty(0.2, 0.1),
            &[],
            &[],
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn test_uptrend_yields_buy() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = rising_series("UP", 300);
        let report = engine.analyze(&series, None, None).unwrap();

        assert!((report.signal.technical_score - 5.0 / 11.0).abs() < 1e-9);
        assert!(report.signal.fundamental_score.is_none());
        assert_eq!(report.recommendation.action, Action::Buy);
        assert!(matches!(
            report.recommendation.sizing,
            PositionSizing::Half | PositionSizing::Quarter
        ));
        assert!(report.recommendation.price_target > report.close);
        assert!(report.recommendation.stop_loss < report.close);
        // No losing periods in this fixture
        assert!(report.risk.sortino_ratio.is_none());
        assert!(report.returns.positive_share > 0.999);
    }

    #[test]
    fn test_downtrend_yields_sell() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = falling_series("DOWN", 300);
        let report = engine.analyze(&series, None, None).unwrap();

        assert!((report.signal.technical_score + 5.0 / 11.0).abs() < 1e-9);
        assert_eq!(report.recommendation.action, Action::Sell);
        assert_eq!(report.recommendation.conviction, Conviction::Medium);
        assert_eq!(report.recommendation.sizing, PositionSizing::Exit);
        assert!(report.recommendation.stop_loss > report.close);
        // The close sits at the very bottom of its own history
        assert!((report.risk_penalty.drawdown_rank - 1.0).abs() < 1e-9);
        let tags = &report.recommendation.rationale_tags;
        assert!(tags.contains(&"risk_deep_drawdown".to_string()));
        assert!(tags.contains(&"rsi_oversold".to_string()));
    }

    #[test]
    fn test_fundamentals_blend_into_composite() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = rising_series("UP", 300);
        let (snapshot, peers) = favorable_fundamentals();

        let bare = engine.analyze(&series, None, None).unwrap();
        let report = engine.analyze(&series, Some(&snapshot), Some(&peers)).unwrap();

        let fundamental = report.signal.fundamental_score.unwrap();
        assert!((fundamental - 1.0).abs() < 1e-9);
        assert!(report.fundamentals.is_some());
        assert!(report.signal.composite_score > bare.signal.composite_score);
        assert_eq!(report.recommendation.action, Action::Buy);
        let tags = &report.recommendation.rationale_tags;
        assert!(tags.contains(&"pe_ratio_favorable".to_string()));
    }

    #[test]
    fn test_unusable_fundamentals_degrade_to_none() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = rising_series("UP", 300);
        let mut snapshot = FundamentalSnapshot::default();
        snapshot.valuation.insert("house_metric".to_string(), 42.0);
        let (_, peers) = favorable_fundamentals();

        let report = engine.analyze(&series, Some(&snapshot), Some(&peers)).unwrap();
        assert!(report.fundamentals.is_none());
        assert!(report.signal.fundamental_score.is_none());
        assert_eq!(report.recommendation.action, Action::Buy);
    }

    #[test]
    fn test_short_series_fails_the_call() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = rising_series("UP", 100);
        assert!(matches!(
            engine.analyze(&series, None, None),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = EngineConfig::default();
        config.stop_loss_k = -1.0;
        assert!(matches!(
            SignalEngine::new(config),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_as_of_is_the_last_point_timestamp() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = wiggly_series("CHOP", 300);
        let report = engine.analyze(&series, None, None).unwrap();
        let last = series.last().unwrap();
        assert_eq!(report.as_of, last.timestamp);
        assert!((report.close - last.close).abs() < 1e-12);
    }

    #[test]
    fn test_repeat_runs_are_bit_identical() {
        let series = wiggly_series("CHOP", 300);
        let (snapshot, peers) = favorable_fundamentals();

        let first = SignalEngine::new(EngineConfig::default())
            .unwrap()
            .analyze(&series, Some(&snapshot), Some(&peers))
            .unwrap();
        let second = SignalEngine::new(EngineConfig::default())
            .unwrap()
            .analyze(&series, Some(&snapshot), Some(&peers))
            .unwrap();

        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = wiggly_series("CHOP", 300);
        let report = engine.analyze(&series, None, None).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.symbol, report.symbol);
        assert_eq!(parsed.as_of, report.as_of);
        assert_eq!(parsed.recommendation.action, report.recommendation.action);
        assert_eq!(
            parsed.recommendation.rationale_tags,
            report.recommendation.rationale_tags
        );
        assert!((parsed.close - report.close).abs() < 1e-12);
        assert!((parsed.signal.composite_score - report.signal.composite_score).abs() < 1e-12);
        assert!(
            (parsed.risk.annualized_volatility - report.risk.annualized_volatility).abs()
                < 1e-12
        );
        assert_eq!(
            parsed.indicators.sma.keys().collect::<Vec<_>>(),
            report.indicators.sma.keys().collect::<Vec<_>>()
        );
    }
}

mod batch {
    use super::*;

    #[test]
    fn test_batch_ranks_reports_and_collects_failures() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let universe = vec![
            InstrumentData {
                series: falling_series("DOWN", 300),
                fundamentals: None,
                peers: None,
            },
            InstrumentData {
                series: rising_series("UP", 300),
                fundamentals: None,
                peers: None,
            },
            InstrumentData {
                series: rising_series("TINY", 50),
                fundamentals: None,
                peers: None,
            },
        ];

        let outcome = engine.analyze_many(&universe);
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[0].symbol, "UP");
        assert_eq!(outcome.reports[1].symbol, "DOWN");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, "TINY");
        assert!(matches!(
            outcome.failures[0].1,
            AnalysisError::InsufficientData(_)
        ));
    }

    #[test]
    fn test_equal_scores_tie_break_by_symbol() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let universe = vec![
            InstrumentData {
                series: rising_series("BBB", 300),
                fundamentals: None,
                peers: None,
            },
            InstrumentData {
                series: rising_series("AAA", 300),
                fundamentals: None,
                peers: None,
            },
        ];

        let outcome = engine.analyze_many(&universe);
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[0].symbol, "AAA");
        assert_eq!(outcome.reports[1].symbol, "BBB");
    }

    #[test]
    fn test_rank_reports_orders_descending() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let mut reports = vec![
            engine.analyze(&falling_series("DOWN", 300), None, None).unwrap(),
            engine.analyze(&rising_series("UP", 300), None, None).unwrap(),
        ];
        rank_reports(&mut reports);
        assert!(reports[0].signal.composite_score >= reports[1].signal.composite_score);
        assert_eq!(reports[0].symbol, "UP");
    }
}

mod provider {
    use super::*;

    struct StaticProvider {
        series: Option<PriceSeries>,
        fundamentals: Option<FundamentalSnapshot>,
    }

    #[async_trait]
    impl MarketDataProvider for StaticProvider {
        async fn fetch_price_series(
            &self,
            _symbol: &str,
            _interval: Interval,
        ) -> Result<PriceSeries, AnalysisError> {
            self.series.clone().ok_or_else(|| {
                AnalysisError::InsufficientData("No price history".to_string())
            })
        }

        async fn fetch_fundamentals(
            &self,
            symbol: &str,
        ) -> Result<FundamentalSnapshot, AnalysisError> {
            self.fundamentals.clone().ok_or_else(|| {
                AnalysisError::MissingFundamentalData(format!("No fundamentals for {}", symbol))
            })
        }
    }

    #[tokio::test]
    async fn test_provider_driven_analysis() {
        let (snapshot, peers) = favorable_fundamentals();
        let provider = StaticProvider {
            series: Some(rising_series("UP", 300)),
            fundamentals: Some(snapshot),
        };
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let report = engine
            .analyze_symbol(&provider, "UP", Interval::Daily, Some(&peers))
            .await
            .unwrap();
        assert_eq!(report.symbol, "UP");
        assert!(report.fundamentals.is_some());
    }

    #[tokio::test]
    async fn test_failed_fundamentals_degrade_gracefully() {
        let provider = StaticProvider {
            series: Some(rising_series("UP", 300)),
            fundamentals: None,
        };
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let report = engine
            .analyze_symbol(&provider, "UP", Interval::Daily, None)
            .await
            .unwrap();
        assert!(report.fundamentals.is_none());
        assert_eq!(report.recommendation.action, Action::Buy);
    }

    #[tokio::test]
    async fn test_failed_price_fetch_propagates() {
        let provider = StaticProvider {
            series: None,
            fundamentals: None,
        };
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let result = engine
            .analyze_symbol(&provider, "UP", Interval::Daily, None)
            .await;
        assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));
    }
}
