pub mod policy;
pub mod reports;
pub mod simulation;

pub use policy::SpendingStrategy;
pub use simulation::{SimulationConfig, SimulationReport, run_simulation};
