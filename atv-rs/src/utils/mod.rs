mod sampling;
mod stats;

pub use sampling::*;
pub use stats::*;
