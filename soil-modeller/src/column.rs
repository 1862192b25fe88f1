//! 1-D soil column for the consolidation model.
//!
//! Constitutive relations, with `σ'` the effective stress:
//!
//! ```text
//! σ_v(z) = ρ_w g z + σ_v0                     vertical stress
//! e      = e_ref − Cc ln(σ' / σ_v0)           void ratio (normal compression line)
//! n      = e / (1 + e)                        porosity
//! k      = 10^(a n + b)                       permeability (m²), a = 10.6, b = −22.6
//! ```
//!
//! The permeability exponents are empirical and kept as given.

use crate::error::{Result, SimulationError};
use crate::grid::Grid1D;
use ndarray::Array1;

/// Floor applied to effective stress before it reaches the logarithm.
pub const EFFECTIVE_STRESS_FLOOR: f64 = 1e-10;

/// Effective stress after the floor, plus whether the floor engaged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveStress {
    pub value: f64,
    pub clamped: bool,
}

/// `max(raw, 1e-10)`. Negative effective stress is physically invalid; it is
/// floored rather than reported so the log stays defined.
pub fn clamp_effective_stress(raw: f64) -> EffectiveStress {
    if raw > EFFECTIVE_STRESS_FLOOR {
        EffectiveStress {
            value: raw,
            clamped: false,
        }
    } else {
        // NaN lands here too
        EffectiveStress {
            value: EFFECTIVE_STRESS_FLOOR,
            clamped: true,
        }
    }
}

/// Empirical permeability-porosity law `10^(a n + b)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermeabilityLaw {
    pub a: f64,
    pub b: f64,
}

impl Default for PermeabilityLaw {
    fn default() -> Self {
        Self { a: 10.6, b: -22.6 }
    }
}

impl PermeabilityLaw {
    pub fn permeability(&self, porosity: f64) -> f64 {
        10f64.powf(self.a * porosity + self.b)
    }
}

/// Parameters of the compression and creep closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionModel {
    pub e_ref: f64,    // Void ratio at the reference stress
    pub cc: f64,       // Slope of the normal compression line
    pub sigma_v0: f64, // Reference (surcharge) stress (Pa)
}

impl CompressionModel {
    pub fn void_ratio(&self, effective_stress: f64) -> f64 {
        self.e_ref - self.cc * (effective_stress / self.sigma_v0).ln()
    }
}

/// Porosity from void ratio. Undefined for `e <= -1`.
pub fn porosity_from_void_ratio(node: usize, e: f64) -> Result<f64> {
    if !(e > -1.0) {
        return Err(SimulationError::numeric_domain(
            node,
            format!("void ratio {e} gives undefined porosity"),
        ));
    }
    Ok(e / (1.0 + e))
}

/// Depth-dependent state of the column. Stress is fixed; void ratio and
/// porosity are rewritten by every consolidation step.
#[derive(Debug, Clone)]
pub struct SoilColumn {
    pub depth: Array1<f64>,
    pub sigma_v: Array1<f64>,
    pub void_ratio: Array1<f64>,
    pub porosity: Array1<f64>,
}

impl SoilColumn {
    /// Initial state with zero pore pressure: `σ' = σ_v`.
    pub fn new(grid: &Grid1D, model: &CompressionModel, rho_w: f64, g: f64) -> Result<Self> {
        let n = grid.n_cells;
        let depth = Array1::from_shape_fn(n, |i| grid.depth(i));
        let sigma_v = depth.mapv(|z| rho_w * g * z + model.sigma_v0);

        let mut void_ratio = Array1::<f64>::zeros(n);
        let mut porosity = Array1::<f64>::zeros(n);
        for i in 0..n {
            let stress = clamp_effective_stress(sigma_v[i]).value;
            void_ratio[i] = model.void_ratio(stress);
            porosity[i] = porosity_from_void_ratio(i, void_ratio[i])?;
        }

        Ok(Self {
            depth,
            sigma_v,
            void_ratio,
            porosity,
        })
    }

    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }
}
