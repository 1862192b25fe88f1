//! Stability numbers for the explicit schemes.
//!
//! These are diagnostics only. Neither stepper limits `dt`; a caller running
//! with a number above 1 gets whatever the scheme produces.
//!
//! For the upwind/central transport scheme, per axis:
//!
//! ```text
//! S_x = dt * (|v| / dx + 2 D / dx²)      stable when S_x <= 1
//! ```
//!
//! For the consolidation pressure diffusion the classic FTCS bound applies:
//!
//! ```text
//! S_z = (k / mu) * dt / dz²               stable when S_z <= 1/2
//! ```

use crate::grid::Grid2D;
use crate::materials::SoilProperties;
use ndarray::Zip;

/// Worst-case stability numbers over the whole transport grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportStability {
    pub x: f64,
    pub y: f64,
}

impl TransportStability {
    pub fn max(&self) -> f64 {
        self.x.max(self.y)
    }

    pub fn is_stable(&self) -> bool {
        self.max() <= 1.0
    }
}

pub fn transport_stability(grid: &Grid2D, soil: &SoilProperties, dt: f64) -> TransportStability {
    let mut x = 0.0_f64;
    let mut y = 0.0_f64;
    Zip::from(&soil.velocity)
        .and(&soil.diffusion)
        .for_each(|&v, &d| {
            x = x.max(axis_number(dt, v, d, grid.dx));
            y = y.max(axis_number(dt, v, d, grid.dy));
        });
    TransportStability { x, y }
}

fn axis_number(dt: f64, v: f64, d: f64, h: f64) -> f64 {
    dt * (v.abs() / h + 2.0 * d / (h * h))
}

/// FTCS diffusion number for the pore-pressure Laplacian.
pub fn pressure_diffusion_number(permeability: f64, mu: f64, dt: f64, dz: f64) -> f64 {
    permeability / mu * dt / (dz * dz)
}
