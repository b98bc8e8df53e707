// webprint_simulator: an in-memory print queue implementing the shared backend trait

pub mod simulator;

pub use simulator::{SimPrinterConfig, SimulatedBackend, SimulatorConfig};
