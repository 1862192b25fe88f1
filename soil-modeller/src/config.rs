use crate::column::{CompressionModel, PermeabilityLaw};
use crate::concentration::ConcentrationField;
use crate::consolidation::{ConsolidationParams, ConsolidationSimulation, PorosityPolicy};
use crate::error::{Result as SimResult, SimulationError};
use crate::grid::{Grid1D, Grid2D};
use crate::materials::{GroundwaterSource, PorositySource, SoilProperties};
use crate::transport::{TransportBoundary, TransportParams, TransportSimulation};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contaminant transport model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub lx: f64, // Domain width (m)
    pub ly: f64, // Domain height (m)
    pub dx: f64,
    pub dy: f64,
    pub dt: f64,         // Time step (s)
    pub total_time: f64, // Simulated time (s)

    pub d0: f64,         // Base diffusion coefficient (m²/s)
    pub v0: f64,         // Base groundwater velocity (m/s)
    pub decay_rate: f64, // First-order degradation rate (1/s)

    pub porosity_min: f64,
    pub porosity_max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Uniform porosity instead of random draws
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porosity: Option<f64>,

    pub groundwater_boost: f64, // Added velocity downstream of the source (m/s)
    /// First boosted column; defaults to nx / 4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groundwater_start_x: Option<usize>,

    pub initial_concentration: f64, // Impulse at the domain centre
    pub boundary: TransportBoundary,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            lx: 10.0,
            ly: 10.0,
            dx: 0.5,
            dy: 0.5,
            dt: 0.1,
            total_time: 20.0,
            d0: 0.05,
            v0: 0.02,
            decay_rate: 0.001,
            porosity_min: 0.3,
            porosity_max: 0.6,
            seed: None,
            porosity: None,
            groundwater_boost: 0.5,
            groundwater_start_x: None,
            initial_concentration: 10.0,
            boundary: TransportBoundary::Frozen,
        }
    }
}

impl TransportConfig {
    fn validate(&self) -> SimResult<()> {
        self.grid()?;
        positive("transport dt", self.dt)?;
        positive("transport total_time", self.total_time)?;
        if self.frame_count() == 0 {
            return Err(SimulationError::configuration(format!(
                "total_time {} is shorter than one step of {}",
                self.total_time, self.dt
            )));
        }
        self.porosity_source().validate()?;
        for (name, value) in [
            ("d0", self.d0),
            ("v0", self.v0),
            ("decay_rate", self.decay_rate),
            ("groundwater_boost", self.groundwater_boost),
            ("initial_concentration", self.initial_concentration),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::configuration(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn grid(&self) -> SimResult<Grid2D> {
        Grid2D::from_extent(self.lx, self.ly, self.dx, self.dy)
    }

    /// `Nt = floor(T / dt)`
    pub fn frame_count(&self) -> usize {
        (self.total_time / self.dt).floor() as usize
    }

    pub fn porosity_source(&self) -> PorositySource {
        match self.porosity {
            Some(value) => PorositySource::Fixed(value),
            None => PorositySource::Uniform {
                min: self.porosity_min,
                max: self.porosity_max,
                seed: self.seed,
            },
        }
    }

    pub fn params(&self) -> TransportParams {
        TransportParams {
            dt: self.dt,
            decay_rate: self.decay_rate,
            frame_count: self.frame_count(),
            boundary: self.boundary,
        }
    }

    /// Grid, soil and initial impulse, ready to step.
    pub fn build(&self) -> SimResult<TransportSimulation> {
        self.validate()?;
        let grid = self.grid()?;
        let porosity = self.porosity_source().realize(&grid)?;
        let source = match self.groundwater_start_x {
            Some(start_x) => GroundwaterSource {
                start_x,
                boost: self.groundwater_boost,
            },
            None => GroundwaterSource::quarter_span(&grid, self.groundwater_boost),
        };
        let soil = SoilProperties::new(porosity, self.d0, self.v0).with_groundwater(source)?;
        let field =
            ConcentrationField::with_impulse(grid.nx, grid.ny, grid.center(), self.initial_concentration);
        TransportSimulation::new(grid, soil, field, self.params())
    }
}

/// Consolidation / pore-pressure model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    pub z_max: f64, // Column depth (m)
    pub dz: f64,
    pub dt: f64, // Time step (s)
    pub time_steps: usize,

    pub cc: f64, // Normal compression slope
    pub cr: f64, // Elastic slope
    pub ca: f64, // Creep slope
    pub t0: f64, // Creep time constant (s)
    pub e_ref: f64,

    /// Intrinsic permeability (m²). Informational; the stepper uses the porosity law.
    pub permeability: f64,
    pub permeability_a: f64,
    pub permeability_b: f64,

    pub mu: f64,       // Water viscosity (Pa.s)
    pub rho_w: f64,    // Water density (kg/m³)
    pub g: f64,        // Gravity (m/s²)
    pub sigma_v0: f64, // Surcharge stress (Pa)

    pub porosity_policy: PorosityPolicy,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            z_max: 2000.0,
            dz: 10.0,
            dt: 1e3,
            time_steps: 1000,
            cc: 0.393,
            cr: 0.0655,
            ca: 0.0053,
            t0: 85.0 * 60.0,
            e_ref: 0.85,
            permeability: 1e-15,
            permeability_a: 10.6,
            permeability_b: -22.6,
            mu: 1.31e-3,
            rho_w: 1000.0,
            g: 9.81,
            sigma_v0: 1e6,
            porosity_policy: PorosityPolicy::Clamp,
        }
    }
}

impl ConsolidationConfig {
    fn validate(&self) -> SimResult<()> {
        self.grid()?;
        positive("consolidation dt", self.dt)?;
        if self.time_steps == 0 {
            return Err(SimulationError::configuration(
                "time_steps must be positive, got 0",
            ));
        }
        for (name, value) in [("rho_w", self.rho_w), ("g", self.g)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::configuration(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn grid(&self) -> SimResult<Grid1D> {
        Grid1D::from_extent(self.z_max, self.dz)
    }

    pub fn params(&self) -> ConsolidationParams {
        ConsolidationParams {
            dt: self.dt,
            time_steps: self.time_steps,
            cr: self.cr,
            ca: self.ca,
            t0: self.t0,
            mu: self.mu,
            compression: CompressionModel {
                e_ref: self.e_ref,
                cc: self.cc,
                sigma_v0: self.sigma_v0,
            },
            permeability: PermeabilityLaw {
                a: self.permeability_a,
                b: self.permeability_b,
            },
            porosity_policy: self.porosity_policy,
        }
    }

    pub fn build(&self) -> SimResult<ConsolidationSimulation> {
        self.validate()?;
        ConsolidationSimulation::new(self.grid()?, self.params(), self.rho_w, self.g)
    }
}

/// Output rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub enabled: bool,
    pub output_dir: String,
    /// Wall-clock delay between animation frames (ms)
    pub interval_ms: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: "output".to_string(),
            interval_ms: 50,
            image_width: 600,
            image_height: 600,
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> SimResult<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(SimulationError::configuration(format!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width, self.image_height
            )));
        }
        if self.output_dir.is_empty() {
            return Err(SimulationError::configuration("output_dir must not be empty"));
        }
        Ok(())
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub consolidation: ConsolidationConfig,
    pub visualization: VisualizationConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> SimResult<()> {
        self.transport.validate()?;
        self.consolidation.validate()?;
        self.visualization.validate()?;
        Ok(())
    }

    pub fn log_summary(&self) {
        let t = &self.transport;
        let c = &self.consolidation;
        log::info!("=== Simulation Configuration ===");
        if let Ok(grid) = t.grid() {
            log::info!(
                "Transport: {}x{} cells ({} x {} m), dt={} s, {} frames",
                grid.nx,
                grid.ny,
                t.lx,
                t.ly,
                t.dt,
                t.frame_count()
            );
        }
        match t.porosity {
            Some(n) => log::info!("  porosity fixed at {}", n),
            None => log::info!(
                "  porosity uniform in [{}, {}], seed {:?}",
                t.porosity_min,
                t.porosity_max,
                t.seed
            ),
        }
        log::info!(
            "  D0={} m²/s, v0={} m/s, k={} 1/s, groundwater boost +{} m/s",
            t.d0,
            t.v0,
            t.decay_rate,
            t.groundwater_boost
        );
        if let Ok(grid) = c.grid() {
            log::info!(
                "Consolidation: {} nodes to {} m, dt={} s, {} steps",
                grid.n_cells,
                c.z_max,
                c.dt,
                c.time_steps
            );
        }
        log::info!(
            "  Cc={}, Cr={}, Ca={}, t0={} s, sigma_v0={} Pa",
            c.cc,
            c.cr,
            c.ca,
            c.t0,
            c.sigma_v0
        );
        log::info!("================================");
    }
}

fn positive(name: &str, value: f64) -> SimResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimulationError::configuration(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}
