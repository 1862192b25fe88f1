//! Explicit finite-difference models of soil processes:
//!
//! * [`transport`]: 2-D contaminant advection, diffusion and decay in
//!   heterogeneous soil, stepped once per animation frame.
//! * [`consolidation`]: 1-D pore-pressure build-up from compression, creep and
//!   Darcy flow, run as a batch before plotting.
//!
//! The two models share only the grid and error types.

pub mod column;
pub mod concentration;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod grid;
pub mod materials;
pub mod stability;
pub mod transport;
pub mod visualisation;

pub use config::Config;
pub use error::SimulationError;
