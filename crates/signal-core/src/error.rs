use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Missing fundamental data: {0}")]
    MissingFundamentalData(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}
