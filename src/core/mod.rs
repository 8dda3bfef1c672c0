pub mod timeseries;
pub mod periods;
pub mod history;
pub mod cache;
pub mod orchestrator;

pub use orchestrator::{BootstrapConfig, Radar, Snapshot};
pub use periods::{select_period, PeriodWindow};
pub use timeseries::transform;
