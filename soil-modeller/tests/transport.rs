//! Integration tests for the 2-D transport stepper.
//!
//! These tests verify:
//! 1. Identity steps (no physics, or dt = 0)
//! 2. The single-step diffusion scenario around a centre impulse
//! 3. Discrete mass balance with frozen and periodic boundaries
//! 4. The frame pull contract and instability reporting

use approx::assert_relative_eq;
use ndarray::Array2;
use soil_modeller::concentration::ConcentrationField;
use soil_modeller::config::TransportConfig;
use soil_modeller::grid::Grid2D;
use soil_modeller::materials::SoilProperties;
use soil_modeller::transport::{TransportBoundary, TransportParams, TransportSimulation};
use soil_modeller::SimulationError;

const D0: f64 = 0.05;
const V0: f64 = 0.02;

fn reference_grid() -> Grid2D {
    Grid2D::from_extent(10.0, 10.0, 0.5, 0.5).unwrap()
}

fn params(dt: f64, decay_rate: f64, boundary: TransportBoundary) -> TransportParams {
    TransportParams {
        dt,
        decay_rate,
        frame_count: 200,
        boundary,
    }
}

/// Smooth non-trivial initial field.
fn bumpy_field(grid: &Grid2D) -> ConcentrationField {
    ConcentrationField::from_array(Array2::from_shape_fn(grid.shape(), |(i, j)| {
        1.0 + (i as f64 * 0.3).sin() * (j as f64 * 0.2).cos()
    }))
}

fn impulse(grid: &Grid2D) -> ConcentrationField {
    ConcentrationField::with_impulse(grid.nx, grid.ny, grid.center(), 10.0)
}

// ============================================================================
// Identity steps
// ============================================================================

#[test]
fn no_transport_no_decay_is_identity() {
    let grid = reference_grid();
    // Zero porosity gives D = 0 and v = 0
    let soil = SoilProperties::uniform(&grid, 0.0, D0, V0);
    let initial = bumpy_field(&grid);
    let mut sim = TransportSimulation::new(
        grid,
        soil,
        initial.clone(),
        params(0.1, 0.0, TransportBoundary::Frozen),
    )
    .unwrap();

    for _ in 0..5 {
        sim.step().unwrap();
    }
    assert_eq!(sim.concentration(), initial.view());
}

#[test]
fn zero_time_step_returns_unmodified_field() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let initial = bumpy_field(&grid);

    for boundary in [TransportBoundary::Frozen, TransportBoundary::Periodic] {
        let mut sim =
            TransportSimulation::new(grid, soil.clone(), initial.clone(), params(0.0, 0.001, boundary))
                .unwrap();
        sim.step().unwrap();
        assert_eq!(sim.concentration(), initial.view());
    }
}

// ============================================================================
// Centre impulse scenario
// ============================================================================

#[test]
fn one_step_diffuses_impulse_into_neighbours() {
    let config = TransportConfig {
        porosity: Some(0.45),
        v0: 0.0,
        groundwater_boost: 0.0,
        ..TransportConfig::default()
    };
    let mut sim = config.build().unwrap();
    assert_eq!(sim.grid.shape(), (20, 20));
    assert_eq!(sim.params.frame_count, 200);

    let (ci, cj) = sim.grid.center();
    assert_eq!(sim.concentration()[[ci, cj]], 10.0);

    sim.step().unwrap();
    let c = sim.concentration();

    // D = 0.05 * 0.45, neighbour gain = dt * D * 10 / dx²
    let expected = 0.1 * 0.0225 * 10.0 / 0.25;
    for (i, j) in [(ci - 1, cj), (ci + 1, cj), (ci, cj - 1), (ci, cj + 1)] {
        assert!(c[[i, j]] > 0.0);
        assert_relative_eq!(c[[i, j]], expected, epsilon = 1e-12);
    }
    assert!(c[[ci, cj]] < 10.0);
    // Diagonals are outside the five-point stencil
    assert_eq!(c[[ci + 1, cj + 1]], 0.0);
}

#[test]
fn upwind_advection_moves_mass_downstream() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.5, 0.0, V0);
    let mut sim =
        TransportSimulation::new(grid, soil, impulse(&grid), params(0.1, 0.0, TransportBoundary::Frozen))
            .unwrap();
    sim.step().unwrap();

    let (ci, cj) = grid.center();
    let c = sim.concentration();
    assert!(c[[ci + 1, cj]] > 0.0);
    assert!(c[[ci, cj + 1]] > 0.0);
    assert_eq!(c[[ci - 1, cj]], 0.0);
    assert_eq!(c[[ci, cj - 1]], 0.0);
}

// ============================================================================
// Mass balance
// ============================================================================

#[test]
fn frozen_boundary_mass_is_non_increasing() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let mut sim =
        TransportSimulation::new(grid, soil, impulse(&grid), params(0.1, 0.0, TransportBoundary::Frozen))
            .unwrap();

    let mut previous = sim.total_mass();
    for _ in 0..200 {
        sim.step().unwrap();
        let mass = sim.total_mass();
        assert!(mass <= previous + 1e-12, "mass grew from {previous} to {mass}");
        previous = mass;
    }
    assert!(sim.field().min() >= 0.0);
}

#[test]
fn periodic_domain_conserves_mass() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let mut sim = TransportSimulation::new(
        grid,
        soil,
        impulse(&grid),
        params(0.1, 0.0, TransportBoundary::Periodic),
    )
    .unwrap();

    let initial = sim.total_mass();
    for _ in 0..500 {
        sim.step().unwrap();
        assert_relative_eq!(sim.total_mass(), initial, max_relative = 1e-12);
    }
}

#[test]
fn decay_removes_mass_on_periodic_domain() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let mut sim = TransportSimulation::new(
        grid,
        soil,
        impulse(&grid),
        params(0.1, 0.001, TransportBoundary::Periodic),
    )
    .unwrap();
    sim.step().unwrap();
    assert_relative_eq!(sim.total_mass(), 10.0 * (1.0 - 0.1 * 0.001), max_relative = 1e-12);
}

// ============================================================================
// Reference run and frame contract
// ============================================================================

#[test]
fn reference_run_keeps_boundary_frozen() {
    let config = TransportConfig {
        seed: Some(2024),
        ..TransportConfig::default()
    };
    let mut sim = config.build().unwrap();
    assert!(sim.stability().is_stable());

    let initial = sim.concentration().to_owned();
    sim.run().unwrap();
    assert!(sim.is_finished());

    let c = sim.concentration();
    for i in 0..sim.grid.nx {
        for j in 0..sim.grid.ny {
            if sim.grid.is_boundary(i, j) {
                assert_eq!(c[[i, j]], initial[[i, j]]);
            }
            assert!(c[[i, j]].is_finite());
        }
    }
    assert!(sim.total_mass() < 10.0);
}

#[test]
fn frames_map_index_to_time_until_budget_is_spent() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let mut sim = TransportSimulation::new(
        grid,
        soil,
        impulse(&grid),
        TransportParams {
            dt: 0.1,
            decay_rate: 0.0,
            frame_count: 3,
            boundary: TransportBoundary::Frozen,
        },
    )
    .unwrap();

    let mut seen = Vec::new();
    while let Some(frame) = sim.advance_frame().unwrap() {
        assert_eq!(frame.concentration.dim(), (20, 20));
        seen.push((frame.index, frame.time));
    }
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], (0, 0.0));
    assert_relative_eq!(seen[2].1, 0.2, epsilon = 1e-12);
    assert!(sim.advance_frame().unwrap().is_none());
    assert_eq!(sim.current_frame(), 3);
}

#[test]
fn non_finite_values_are_reported() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let mut field = impulse(&grid);
    field.c[[4, 7]] = f64::NAN;
    let mut sim =
        TransportSimulation::new(grid, soil, field, params(0.1, 0.0, TransportBoundary::Frozen)).unwrap();

    match sim.step() {
        Err(SimulationError::NumericInstability { step, cell, value }) => {
            assert_eq!(step, 1);
            assert_eq!(cell, (3, 7));
            assert!(value.is_nan());
        }
        other => panic!("expected instability, got {other:?}"),
    }
}

#[test]
fn oversized_step_is_flagged_but_not_limited() {
    let grid = reference_grid();
    let soil = SoilProperties::uniform(&grid, 0.45, D0, V0);
    let sim =
        TransportSimulation::new(grid, soil, impulse(&grid), params(50.0, 0.0, TransportBoundary::Frozen))
            .unwrap();
    assert!(!sim.stability().is_stable());
    assert_eq!(sim.params.dt, 50.0);
}
