use crate::column::{
    clamp_effective_stress, porosity_from_void_ratio, CompressionModel, PermeabilityLaw,
    SoilColumn,
};
use crate::error::{Result, SimulationError};
use crate::grid::Grid1D;
use crate::stability::pressure_diffusion_number;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// What to do when a negative porosity reaches the permeability law.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PorosityPolicy {
    /// Evaluate permeability at porosity 0 and log a warning.
    #[default]
    Clamp,
    /// Stop with `SimulationError::NumericDomain`.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsolidationParams {
    pub dt: f64,           // Time step (seconds)
    pub time_steps: usize, // Iterations of the batch run
    pub cr: f64,           // Elastic slope
    pub ca: f64,           // Creep slope
    pub t0: f64,           // Creep reference time (seconds)
    pub mu: f64,           // Pore fluid viscosity (Pa.s)
    pub compression: CompressionModel,
    pub permeability: PermeabilityLaw,
    pub porosity_policy: PorosityPolicy,
}

impl ConsolidationParams {
    pub fn total_time(&self) -> f64 {
        self.time_steps as f64 * self.dt
    }

    fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(SimulationError::configuration(format!(
                "Consolidation time step must be finite and non-negative, got {}",
                self.dt
            )));
        }
        for (name, value) in [
            ("t0", self.t0),
            ("ca", self.ca),
            ("mu", self.mu),
            ("sigma_v0", self.compression.sigma_v0),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimulationError::configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-step counters of the clamping policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Interior nodes whose effective stress hit the floor.
    pub clamped_nodes: usize,
    /// Interior nodes whose porosity was clamped for the permeability law.
    pub porosity_clamped_nodes: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub clamped_node_steps: usize,
    pub porosity_clamped_node_steps: usize,
}

impl RunSummary {
    fn record(&mut self, report: StepReport) {
        self.steps += 1;
        self.clamped_node_steps += report.clamped_nodes;
        self.porosity_clamped_node_steps += report.porosity_clamped_nodes;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    Cancelled(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> RunSummary {
        match *self {
            RunOutcome::Completed(summary) | RunOutcome::Cancelled(summary) => summary,
        }
    }
}

/// 1-D pore-pressure build-up from compression, creep and Darcy flow.
pub struct ConsolidationSimulation {
    pub grid: Grid1D,
    pub params: ConsolidationParams,
    column: SoilColumn,
    pressure: Array1<f64>,
    scratch: Array1<f64>,
    current_step: usize,
    porosity_warned: bool,
}

impl ConsolidationSimulation {
    /// Column at rest: zero pore pressure everywhere.
    pub fn new(grid: Grid1D, params: ConsolidationParams, rho_w: f64, g: f64) -> Result<Self> {
        params.validate()?;
        let column = SoilColumn::new(&grid, &params.compression, rho_w, g)?;
        let pressure = Array1::zeros(grid.n_cells);
        Self::with_state(grid, params, column, pressure)
    }

    /// Starts from an arbitrary pressure profile.
    pub fn with_state(
        grid: Grid1D,
        params: ConsolidationParams,
        column: SoilColumn,
        pressure: Array1<f64>,
    ) -> Result<Self> {
        params.validate()?;
        if column.len() != grid.n_cells || pressure.len() != grid.n_cells {
            return Err(SimulationError::configuration(format!(
                "Column ({}) and pressure ({}) lengths do not match grid ({})",
                column.len(),
                pressure.len(),
                grid.n_cells
            )));
        }
        let scratch = pressure.clone();
        Ok(Self {
            grid,
            params,
            column,
            pressure,
            scratch,
            current_step: 0,
            porosity_warned: false,
        })
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_time(&self) -> f64 {
        self.current_step as f64 * self.params.dt
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.params.time_steps
    }

    pub fn pressure(&self) -> ArrayView1<'_, f64> {
        self.pressure.view()
    }

    /// Pressure profile after the batch run.
    pub fn final_profile(&self) -> ArrayView1<'_, f64> {
        self.pressure.view()
    }

    pub fn column(&self) -> &SoilColumn {
        &self.column
    }

    pub fn depth(&self) -> ArrayView1<'_, f64> {
        self.column.depth.view()
    }

    pub fn vertical_stress(&self) -> ArrayView1<'_, f64> {
        self.column.sigma_v.view()
    }

    pub fn void_ratio(&self) -> ArrayView1<'_, f64> {
        self.column.void_ratio.view()
    }

    pub fn porosity(&self) -> ArrayView1<'_, f64> {
        self.column.porosity.view()
    }

    /// Largest FTCS diffusion number over the column at its current porosity.
    pub fn diffusion_number(&self) -> f64 {
        self.column
            .porosity
            .iter()
            .map(|&n| {
                let k = self.params.permeability.permeability(n.max(0.0));
                pressure_diffusion_number(k, self.params.mu, self.params.dt, self.grid.dz)
            })
            .fold(0.0, f64::max)
    }

    pub fn step(&mut self) -> Result<StepReport> {
        let n = self.grid.n_cells;
        let dz2 = self.grid.dz * self.grid.dz;
        let ConsolidationParams {
            dt,
            cr,
            ca,
            t0,
            mu,
            compression,
            permeability,
            porosity_policy,
            ..
        } = self.params;

        let p = &self.pressure;
        let next = &mut self.scratch;
        let column = &mut self.column;
        let mut report = StepReport::default();

        next.assign(p);

        for i in 1..n - 1 {
            let stress = clamp_effective_stress(column.sigma_v[i] - p[i]);
            if stress.clamped {
                report.clamped_nodes += 1;
            }

            // Void ratio and porosity from the previous pressure, used in this same step
            let e = compression.void_ratio(stress.value);
            let porosity = porosity_from_void_ratio(i, e)?;
            column.void_ratio[i] = e;
            column.porosity[i] = porosity;

            let compressibility = stress.value / (1.0 + porosity) * cr;
            let creep = ca / (t0 * (1.0 + porosity)) * (-e / ca).exp();

            let flow_porosity = if porosity < 0.0 {
                match porosity_policy {
                    PorosityPolicy::Fail => {
                        return Err(SimulationError::numeric_domain(
                            i,
                            format!("negative porosity {porosity} in permeability law"),
                        ));
                    }
                    PorosityPolicy::Clamp => {
                        report.porosity_clamped_nodes += 1;
                        0.0
                    }
                }
            } else {
                porosity
            };
            let k_eff = permeability.permeability(flow_porosity);
            let laplacian = (p[i + 1] - 2.0 * p[i] + p[i - 1]) / dz2;

            let dp_dt = compressibility + creep + k_eff / mu * laplacian;
            next[i] = p[i] + dp_dt * dt;
        }

        // Fixed top, zero-gradient bottom (both from the previous pressure)
        let last = self.grid.last();
        next[0] = p[0];
        next[last] = p[last - 1];

        std::mem::swap(&mut self.pressure, &mut self.scratch);
        self.current_step += 1;

        if report.porosity_clamped_nodes > 0 && !self.porosity_warned {
            log::warn!(
                "Step {}: negative porosity at {} node(s), permeability evaluated at porosity 0",
                self.current_step,
                report.porosity_clamped_nodes
            );
            self.porosity_warned = true;
        }

        self.check_finite()?;
        Ok(report)
    }

    /// Runs every remaining step in one blocking call.
    pub fn run(&mut self) -> Result<RunSummary> {
        let never = AtomicBool::new(false);
        self.run_with_cancel(&never).map(|outcome| outcome.summary())
    }

    /// Like `run`, but checks `cancel` before each iteration.
    pub fn run_with_cancel(&mut self, cancel: &AtomicBool) -> Result<RunOutcome> {
        log::info!(
            "Starting consolidation run: {} nodes, dz={} m, dt={} s, {} steps ({} s)",
            self.grid.n_cells,
            self.grid.dz,
            self.params.dt,
            self.params.time_steps,
            self.params.total_time()
        );

        let mut summary = RunSummary::default();
        let report_every = (self.params.time_steps / 10).max(1);
        while !self.is_finished() {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Consolidation cancelled after {} steps", summary.steps);
                return Ok(RunOutcome::Cancelled(summary));
            }
            let report = self.step()?;
            summary.record(report);

            if self.current_step % report_every == 0 {
                log::info!(
                    "Step {}/{} (t={:.0}s, max P={:.3e} Pa)",
                    self.current_step,
                    self.params.time_steps,
                    self.current_time(),
                    self.pressure.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                );
            }
        }

        if summary.clamped_node_steps > 0 {
            log::warn!(
                "Effective stress floor engaged {} times; pore pressure exceeded overburden",
                summary.clamped_node_steps
            );
        }
        log::info!("Consolidation run complete");
        Ok(RunOutcome::Completed(summary))
    }

    fn check_finite(&self) -> Result<()> {
        match self.pressure.iter().position(|p| !p.is_finite()) {
            Some(i) => Err(SimulationError::NumericInstability {
                step: self.current_step,
                cell: (i, 0),
                value: self.pressure[i],
            }),
            None => Ok(()),
        }
    }
}
