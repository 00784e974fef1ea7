pub mod indicators;
pub mod score;
pub mod set;


pub use indicators::*;
pub use score::*;
pub use set::*;
