use crate::error::{Result, SimulationError};

/// Regular 2-D lattice with the origin at the domain corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid2D {
    pub nx: usize, // Number of cells in x direction
    pub ny: usize, // Number of cells in y direction
    pub dx: f64,   // Grid spacing in x (meters)
    pub dy: f64,   // Grid spacing in y (meters)
}

impl Grid2D {
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64) -> Result<Self> {
        check_spacing("dx", dx)?;
        check_spacing("dy", dy)?;
        check_cells("nx", nx)?;
        check_cells("ny", ny)?;
        Ok(Grid2D { nx, ny, dx, dy })
    }

    /// Builds the grid covering `lx` x `ly` with `floor(extent / spacing)` cells per axis.
    pub fn from_extent(lx: f64, ly: f64, dx: f64, dy: f64) -> Result<Self> {
        check_spacing("dx", dx)?;
        check_spacing("dy", dy)?;
        Self::new(cell_count("lx", lx, dx)?, cell_count("ly", ly, dy)?, dx, dy)
    }

    pub fn x_coord(&self, i: usize) -> f64 {
        self.dx * (i as f64)
    }

    pub fn y_coord(&self, j: usize) -> f64 {
        self.dy * (j as f64)
    }

    pub fn in_bounds(&self, i: usize, j: usize) -> bool {
        i < self.nx && j < self.ny
    }

    /// True for cells on the outer ring, which the frozen boundary never updates.
    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i == self.nx - 1 || j == self.ny - 1
    }

    pub fn center(&self) -> (usize, usize) {
        (self.nx / 2, self.ny / 2)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn width(&self) -> f64 {
        self.nx as f64 * self.dx
    }

    pub fn height(&self) -> f64 {
        self.ny as f64 * self.dy
    }
}

/// Regular 1-D depth lattice, node `i` sits at depth `i * dz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid1D {
    pub n_cells: usize,
    pub dz: f64,
}

impl Grid1D {
    pub fn new(n_cells: usize, dz: f64) -> Result<Self> {
        check_spacing("dz", dz)?;
        check_cells("n_cells", n_cells)?;
        Ok(Grid1D { n_cells, dz })
    }

    pub fn from_extent(z_max: f64, dz: f64) -> Result<Self> {
        check_spacing("dz", dz)?;
        Self::new(cell_count("z_max", z_max, dz)?, dz)
    }

    pub fn depth(&self, i: usize) -> f64 {
        self.dz * (i as f64)
    }

    pub fn last(&self) -> usize {
        self.n_cells - 1
    }
}

fn check_spacing(name: &str, spacing: f64) -> Result<()> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(SimulationError::configuration(format!(
            "Grid spacing {name} must be positive, got {spacing}"
        )));
    }
    Ok(())
}

// One interior cell is the minimum an explicit stencil can update.
fn check_cells(name: &str, cells: usize) -> Result<()> {
    if cells < 3 {
        return Err(SimulationError::configuration(format!(
            "Grid needs at least 3 cells along {name}, got {cells}"
        )));
    }
    Ok(())
}

fn cell_count(name: &str, extent: f64, spacing: f64) -> Result<usize> {
    if !extent.is_finite() || extent <= 0.0 {
        return Err(SimulationError::configuration(format!(
            "Domain extent {name} must be positive, got {extent}"
        )));
    }
    Ok((extent / spacing).floor() as usize)
}
