pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod simulation;

pub use config::SimulationConfig;
pub use error::{RoutingError, SimulationError};
pub use simulation::{Simulation, SimulationReport};

pub type NodeId = String;

/// Link file used when none is given programmatically.
pub const DEFAULT_LINKS_FILE: &str = "data.txt";
