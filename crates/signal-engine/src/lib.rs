pub mod aggregator;
pub mod batch;
pub mod pipeline;
pub mod provider;
pub mod recommendation;

#[cfg(test)]
mod tests;

pub use aggregator::*;
pub use batch::*;
pub use pipeline::*;
pub use recommendation::*;
