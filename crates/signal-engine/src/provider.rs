use crate::pipeline::{AnalysisReport, SignalEngine};
use signal_core::{AnalysisError, Interval, MarketDataProvider, PeerReference};
use tracing::warn;

impl SignalEngine {
    /// Fetches through the acquisition interface and runs the pure pipeline.
    ///
    /// A failed price fetch fails the call; failed fundamentals degrade to a
    /// technical-and-risk-only report.
    pub async fn analyze_symbol(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &str,
        interval: Interval,
        peers: Option<&PeerReference>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let series = provider.fetch_price_series(symbol, interval).await?;
        let fundamentals = match provider.fetch_fundamentals(symbol).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Fundamentals unavailable for {}: {}", symbol, e);
                None
            }
        };
        self.analyze(&series, fundamentals.as_ref(), peers)
    }
}
