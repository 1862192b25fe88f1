use ndarray::{Array2, ArrayView2};

/// Contaminant concentration on the transport grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationField {
    pub c: Array2<f64>,
}

impl ConcentrationField {
    pub fn new(nx: usize, ny: usize) -> Self {
        ConcentrationField {
            c: Array2::zeros((nx, ny)),
        }
    }

    /// Zero everywhere except a single elevated cell.
    pub fn with_impulse(nx: usize, ny: usize, cell: (usize, usize), amount: f64) -> Self {
        let mut field = Self::new(nx, ny);
        field.c[[cell.0, cell.1]] = amount;
        field
    }

    pub fn from_array(c: Array2<f64>) -> Self {
        ConcentrationField { c }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.c.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.c.view()
    }

    pub fn zero(&mut self) {
        self.c.fill(0.0);
    }

    /// Discrete mass `Σ C[i,j]`. Multiply by the cell area for physical units.
    pub fn total_mass(&self) -> f64 {
        self.c.sum()
    }

    /// Largest value and the cell holding it.
    pub fn peak(&self) -> (f64, (usize, usize)) {
        let mut best = (f64::NEG_INFINITY, (0, 0));
        for ((i, j), &value) in self.c.indexed_iter() {
            if value > best.0 {
                best = (value, (i, j));
            }
        }
        best
    }

    pub fn min(&self) -> f64 {
        self.c.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// First cell holding NaN or Inf, scanning in index order.
    pub fn first_non_finite(&self) -> Option<((usize, usize), f64)> {
        self.c
            .indexed_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(cell, &value)| (cell, value))
    }
}
