use crate::error::{Result, SimulationError};
use crate::grid::Grid2D;
use ndarray::{s, Array2, Zip};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Where per-cell porosity comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PorositySource {
    /// Independent uniform draws from `[min, max]`. Entropy-seeded when `seed` is `None`.
    Uniform {
        min: f64,
        max: f64,
        seed: Option<u64>,
    },
    /// Same porosity in every cell.
    Fixed(f64),
}

impl PorositySource {
    pub fn validate(&self) -> Result<()> {
        match *self {
            PorositySource::Uniform { min, max, .. } => {
                if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
                    return Err(SimulationError::configuration(format!(
                        "Porosity interval must satisfy 0 <= min <= max <= 1 (min={min}, max={max})"
                    )));
                }
            }
            PorositySource::Fixed(value) => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(SimulationError::configuration(format!(
                        "Fixed porosity must lie in [0, 1], got {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Draws a porosity field of the grid's shape.
    pub fn realize(&self, grid: &Grid2D) -> Result<Array2<f64>> {
        self.validate()?;
        let field = match *self {
            PorositySource::Fixed(value) => Array2::from_elem(grid.shape(), value),
            PorositySource::Uniform { min, max, seed } => {
                let mut rng = match seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                Array2::from_shape_simple_fn(grid.shape(), || rng.gen_range(min..=max))
            }
        };
        Ok(field)
    }
}

/// Additive velocity over every column `i >= start_x`, modelling a groundwater source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundwaterSource {
    pub start_x: usize,
    pub boost: f64,
}

impl GroundwaterSource {
    /// Source starting a quarter of the way across the domain.
    pub fn quarter_span(grid: &Grid2D, boost: f64) -> Self {
        Self {
            start_x: grid.nx / 4,
            boost,
        }
    }
}

/// Per-cell soil properties for the transport model. Immutable once built.
#[derive(Debug, Clone)]
pub struct SoilProperties {
    pub porosity: Array2<f64>,
    pub diffusion: Array2<f64>, // D = D0 * porosity (m²/s)
    pub velocity: Array2<f64>,  // v = v0 * porosity, plus groundwater boost (m/s)
}

impl SoilProperties {
    pub fn new(porosity: Array2<f64>, d0: f64, v0: f64) -> Self {
        let (nx, ny) = porosity.dim();
        let mut diffusion = Array2::<f64>::zeros((nx, ny));
        let mut velocity = Array2::<f64>::zeros((nx, ny));

        Zip::from(&mut diffusion)
            .and(&mut velocity)
            .and(&porosity)
            .for_each(|d, v, &n| {
                *d = d0 * n;
                *v = v0 * n;
            });

        Self {
            porosity,
            diffusion,
            velocity,
        }
    }

    /// Uniform soil, mostly for deterministic scenarios.
    pub fn uniform(grid: &Grid2D, porosity: f64, d0: f64, v0: f64) -> Self {
        Self::new(Array2::from_elem(grid.shape(), porosity), d0, v0)
    }

    pub fn with_groundwater(mut self, source: GroundwaterSource) -> Result<Self> {
        let (nx, _) = self.velocity.dim();
        if source.start_x >= nx {
            return Err(SimulationError::configuration(format!(
                "Groundwater source column {} is outside grid width {}",
                source.start_x, nx
            )));
        }
        self.velocity
            .slice_mut(s![source.start_x.., ..])
            .mapv_inplace(|v| v + source.boost);
        Ok(self)
    }

    pub fn dim(&self) -> (usize, usize) {
        self.porosity.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid2D {
        Grid2D::from_extent(10.0, 10.0, 0.5, 0.5).unwrap()
    }

    #[test]
    fn seeded_porosity_is_reproducible_and_bounded() {
        let source = PorositySource::Uniform {
            min: 0.3,
            max: 0.6,
            seed: Some(7),
        };
        let a = source.realize(&grid()).unwrap();
        let b = source.realize(&grid()).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&n| (0.3..=0.6).contains(&n)));
    }

    #[test]
    fn rejects_inverted_interval() {
        let source = PorositySource::Uniform {
            min: 0.6,
            max: 0.3,
            seed: None,
        };
        assert!(matches!(
            source.realize(&grid()),
            Err(SimulationError::Configuration(_))
        ));
        assert!(PorositySource::Fixed(1.2).validate().is_err());
    }

    #[test]
    fn properties_scale_with_porosity() {
        let soil = SoilProperties::uniform(&grid(), 0.45, 0.05, 0.02);
        assert_relative_eq!(soil.diffusion[[3, 4]], 0.0225, epsilon = 1e-12);
        assert_relative_eq!(soil.velocity[[3, 4]], 0.009, epsilon = 1e-12);
    }

    #[test]
    fn groundwater_boost_covers_columns_from_start() {
        let grid = grid();
        let source = GroundwaterSource::quarter_span(&grid, 0.5);
        assert_eq!(source.start_x, 5);

        let soil = SoilProperties::uniform(&grid, 0.5, 0.05, 0.02)
            .with_groundwater(source)
            .unwrap();
        for j in 0..grid.ny {
            assert_relative_eq!(soil.velocity[[4, j]], 0.01, epsilon = 1e-12);
            assert_relative_eq!(soil.velocity[[5, j]], 0.51, epsilon = 1e-12);
            assert_relative_eq!(soil.velocity[[grid.nx - 1, j]], 0.51, epsilon = 1e-12);
        }
        assert_relative_eq!(soil.diffusion[[10, 10]], 0.025, epsilon = 1e-12);
    }

    #[test]
    fn groundwater_outside_grid_is_rejected() {
        let grid = grid();
        let soil = SoilProperties::uniform(&grid, 0.5, 0.05, 0.02);
        let source = GroundwaterSource {
            start_x: grid.nx,
            boost: 0.5,
        };
        assert!(soil.with_groundwater(source).is_err());
    }
}
