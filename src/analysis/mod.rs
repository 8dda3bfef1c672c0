pub mod normalizer;
pub mod composite;
pub mod contributions;
pub mod statistics;
pub mod labels;
pub mod audit;
pub mod bootstrap;

pub use composite::{compute_block, compute_composite};
pub use contributions::compute_contributions;
pub use normalizer::normalize_indicator;
pub use statistics::compute_stats;
