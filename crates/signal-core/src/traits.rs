use crate::error::AnalysisError;
use crate::types::{FundamentalSnapshot, Interval, PriceSeries};
use async_trait::async_trait;

/// Data acquisition capability. The analysis pipeline itself is pure and
/// synchronous; implementations of this trait are the only place where I/O
/// happens.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_price_series(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<PriceSeries, AnalysisError>;

    async fn fetch_fundamentals(&self, symbol: &str)
        -> Result<FundamentalSnapshot, AnalysisError>;
}
