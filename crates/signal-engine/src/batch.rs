use crate::pipeline::{AnalysisReport, SignalEngine};
use rayon::prelude::*;
use signal_core::{AnalysisError, FundamentalSnapshot, PeerReference, PriceSeries};
use std::cmp::Ordering;

/// Inputs for one instrument in a batch run.
#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub series: PriceSeries,
    pub fundamentals: Option<FundamentalSnapshot>,
    pub peers: Option<PeerReference>,
}

/// Result of a batch run: successful reports ranked best-first plus the
/// per-symbol failures.
#[derive(Debug)]
pub struct BatchOutcome {
    pub reports: Vec<AnalysisReport>,
    pub failures: Vec<(String, AnalysisError)>,
}

impl SignalEngine {
    /// Analyzes a universe in parallel. One bad instrument never sinks the
    /// batch; it lands in `failures` under its symbol.
    pub fn analyze_many(&self, universe: &[InstrumentData]) -> BatchOutcome {
        let results: Vec<_> = universe
            .par_iter()
            .map(|instrument| {
                (
                    instrument.series.symbol().to_string(),
                    self.analyze(
                        &instrument.series,
                        instrument.fundamentals.as_ref(),
                        instrument.peers.as_ref(),
                    ),
                )
            })
            .collect();

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => failures.push((symbol, e)),
            }
        }
        rank_reports(&mut reports);
        BatchOutcome { reports, failures }
    }
}

/// Sorts by composite score descending with the symbol as a deterministic
/// tie-break.
pub fn rank_reports(reports: &mut [AnalysisReport]) {
    reports.sort_by(|a, b| {
        b.signal
            .composite_score
            .partial_cmp(&a.signal.composite_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}
