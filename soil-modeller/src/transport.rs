use crate::concentration::ConcentrationField;
use crate::error::{Result, SimulationError};
use crate::grid::Grid2D;
use crate::materials::SoilProperties;
use crate::stability::{transport_stability, TransportStability};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// How the outer ring of cells is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportBoundary {
    /// Boundary cells keep their initial value forever.
    #[default]
    Frozen,
    /// Every cell is updated, neighbours wrap around both axes.
    Periodic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportParams {
    pub dt: f64,          // Time step (seconds)
    pub decay_rate: f64,  // First-order decay k (1/s)
    pub frame_count: usize, // Frames (steps) the animation will request
    pub boundary: TransportBoundary,
}

impl TransportParams {
    pub fn total_time(&self) -> f64 {
        self.frame_count as f64 * self.dt
    }

    fn validate(&self) -> Result<()> {
        // dt = 0 is a legal (identity) step
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(SimulationError::configuration(format!(
                "Transport time step must be finite and non-negative, got {}",
                self.dt
            )));
        }
        if !self.decay_rate.is_finite() {
            return Err(SimulationError::configuration(format!(
                "Decay rate must be finite, got {}",
                self.decay_rate
            )));
        }
        Ok(())
    }
}

/// Read-only snapshot handed to the renderer after each step.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub index: usize,
    pub time: f64,
    pub concentration: ArrayView2<'a, f64>,
}

/// Values of the five-point stencil around one cell.
#[derive(Clone, Copy)]
struct Stencil {
    centre: f64,
    west: f64,
    east: f64,
    south: f64,
    north: f64,
}

/// 2-D advection-diffusion-decay of a contaminant, advanced one frame at a time.
pub struct TransportSimulation {
    pub grid: Grid2D,
    pub soil: SoilProperties,
    pub params: TransportParams,
    field: ConcentrationField,
    scratch: Array2<f64>,
    current_frame: usize,
}

impl TransportSimulation {
    pub fn new(
        grid: Grid2D,
        soil: SoilProperties,
        field: ConcentrationField,
        params: TransportParams,
    ) -> Result<Self> {
        params.validate()?;
        if soil.dim() != grid.shape() || field.dim() != grid.shape() {
            return Err(SimulationError::configuration(format!(
                "Field shapes {:?} (soil) and {:?} (concentration) do not match grid {:?}",
                soil.dim(),
                field.dim(),
                grid.shape()
            )));
        }

        let stability = transport_stability(&grid, &soil, params.dt);
        if !stability.is_stable() {
            log::warn!(
                "Transport stability number {:.3} exceeds 1 (x={:.3}, y={:.3}); expect unbounded growth",
                stability.max(),
                stability.x,
                stability.y
            );
        }

        let scratch = field.c.clone();
        Ok(Self {
            grid,
            soil,
            params,
            field,
            scratch,
            current_frame: 0,
        })
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn current_time(&self) -> f64 {
        self.current_frame as f64 * self.params.dt
    }

    pub fn is_finished(&self) -> bool {
        self.current_frame >= self.params.frame_count
    }

    /// Current concentration. Only readable between steps.
    pub fn concentration(&self) -> ArrayView2<'_, f64> {
        self.field.view()
    }

    pub fn field(&self) -> &ConcentrationField {
        &self.field
    }

    pub fn total_mass(&self) -> f64 {
        self.field.total_mass()
    }

    pub fn stability(&self) -> TransportStability {
        transport_stability(&self.grid, &self.soil, self.params.dt)
    }

    /// Steps once and returns the new frame, or `None` once the frame budget is spent.
    pub fn advance_frame(&mut self) -> Result<Option<Frame<'_>>> {
        if self.is_finished() {
            return Ok(None);
        }
        let index = self.current_frame;
        self.step()?;
        Ok(Some(Frame {
            index,
            time: index as f64 * self.params.dt,
            concentration: self.field.view(),
        }))
    }

    pub fn step(&mut self) -> Result<()> {
        match self.params.boundary {
            TransportBoundary::Frozen => self.update_interior(),
            TransportBoundary::Periodic => self.update_periodic(),
        }

        // New state becomes current; the old one is reused as next step's buffer
        std::mem::swap(&mut self.field.c, &mut self.scratch);
        self.current_frame += 1;
        self.check_finite()
    }

    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Starting transport run: grid {}x{}, dt={} s, {} frames ({} s)",
            self.grid.nx,
            self.grid.ny,
            self.params.dt,
            self.params.frame_count,
            self.params.total_time()
        );

        let report_every = (self.params.frame_count / 10).max(1);
        while !self.is_finished() {
            self.step()?;
            if self.current_frame % report_every == 0 {
                log::info!(
                    "Frame {}/{} (t={:.1}s, mass={:.4})",
                    self.current_frame,
                    self.params.frame_count,
                    self.current_time(),
                    self.total_mass()
                );
            }
        }

        log::info!("Transport run complete");
        Ok(())
    }

    fn update_interior(&mut self) {
        let (nx, ny) = self.grid.shape();
        let c = &self.field.c;
        let next = &mut self.scratch;

        // Boundary cells carry over unchanged
        next.assign(c);

        for i in 1..nx - 1 {
            for j in 1..ny - 1 {
                let stencil = Stencil {
                    centre: c[[i, j]],
                    west: c[[i - 1, j]],
                    east: c[[i + 1, j]],
                    south: c[[i, j - 1]],
                    north: c[[i, j + 1]],
                };
                next[[i, j]] = explicit_update(
                    stencil,
                    self.soil.velocity[[i, j]],
                    self.soil.diffusion[[i, j]],
                    &self.grid,
                    &self.params,
                );
            }
        }
    }

    fn update_periodic(&mut self) {
        let (nx, ny) = self.grid.shape();
        let c = &self.field.c;
        let next = &mut self.scratch;

        for i in 0..nx {
            let (im, ip) = ((i + nx - 1) % nx, (i + 1) % nx);
            for j in 0..ny {
                let (jm, jp) = ((j + ny - 1) % ny, (j + 1) % ny);
                let stencil = Stencil {
                    centre: c[[i, j]],
                    west: c[[im, j]],
                    east: c[[ip, j]],
                    south: c[[i, jm]],
                    north: c[[i, jp]],
                };
                next[[i, j]] = explicit_update(
                    stencil,
                    self.soil.velocity[[i, j]],
                    self.soil.diffusion[[i, j]],
                    &self.grid,
                    &self.params,
                );
            }
        }
    }

    fn check_finite(&self) -> Result<()> {
        match self.field.first_non_finite() {
            Some((cell, value)) => Err(SimulationError::NumericInstability {
                step: self.current_frame,
                cell,
                value,
            }),
            None => Ok(()),
        }
    }
}

/// Upwind advection (v >= 0), central diffusion and linear decay for one cell.
fn explicit_update(s: Stencil, v: f64, d: f64, grid: &Grid2D, params: &TransportParams) -> f64 {
    let (dx, dy) = (grid.dx, grid.dy);

    let advection_x = -v * (s.centre - s.west) / dx;
    let advection_y = -v * (s.centre - s.south) / dy;
    let diffusion_x = d * (s.east - 2.0 * s.centre + s.west) / (dx * dx);
    let diffusion_y = d * (s.north - 2.0 * s.centre + s.south) / (dy * dy);

    s.centre
        + params.dt
            * (advection_x + advection_y + diffusion_x + diffusion_y
                - params.decay_rate * s.centre)
}
