use soil_modeller::config::{Config, TransportConfig};
use soil_modeller::consolidation::PorosityPolicy;
use soil_modeller::transport::TransportBoundary;
use soil_modeller::SimulationError;

fn configuration_error(result: anyhow::Result<Config>) -> bool {
    match result {
        Err(e) => matches!(
            e.downcast_ref::<SimulationError>(),
            Some(SimulationError::Configuration(_))
        ),
        Ok(_) => false,
    }
}

#[test]
fn defaults_describe_reference_run() {
    let config = Config::default();
    config.validate().unwrap();

    let grid = config.transport.grid().unwrap();
    assert_eq!((grid.nx, grid.ny), (20, 20));
    assert_eq!(config.transport.frame_count(), 200);
    assert_eq!(config.consolidation.grid().unwrap().n_cells, 200);
    assert_eq!(config.visualization.interval_ms, 50);
}

#[test]
fn empty_document_is_the_default() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.transport.dx, 0.5);
    assert_eq!(config.consolidation.time_steps, 1000);
    assert_eq!(config.consolidation.porosity_policy, PorosityPolicy::Clamp);
}

#[test]
fn partial_sections_fill_defaults() {
    let config = Config::from_toml(
        r#"
        [transport]
        seed = 42
        porosity = 0.45
        boundary = "periodic"

        [consolidation]
        time_steps = 10
        porosity_policy = "fail"

        [visualization]
        enabled = false
        "#,
    )
    .unwrap();

    assert_eq!(config.transport.seed, Some(42));
    assert_eq!(config.transport.porosity, Some(0.45));
    assert_eq!(config.transport.boundary, TransportBoundary::Periodic);
    assert_eq!(config.transport.lx, 10.0);
    assert_eq!(config.consolidation.time_steps, 10);
    assert_eq!(config.consolidation.porosity_policy, PorosityPolicy::Fail);
    assert!(!config.visualization.enabled);
}

#[test]
fn rejects_non_positive_spacing_and_duration() {
    assert!(configuration_error(Config::from_toml("[transport]\ndx = 0.0")));
    assert!(configuration_error(Config::from_toml("[transport]\ndy = -0.5")));
    assert!(configuration_error(Config::from_toml("[transport]\ntotal_time = 0.0")));
    assert!(configuration_error(Config::from_toml("[transport]\ndt = 0.0")));
    assert!(configuration_error(Config::from_toml("[consolidation]\ndz = 0.0")));
    assert!(configuration_error(Config::from_toml("[consolidation]\ntime_steps = 0")));
    assert!(configuration_error(Config::from_toml("[consolidation]\ndt = -1.0")));
}

#[test]
fn rejects_bad_porosity_and_groundwater() {
    assert!(configuration_error(Config::from_toml(
        "[transport]\nporosity_min = 0.7\nporosity_max = 0.6"
    )));
    assert!(configuration_error(Config::from_toml("[transport]\nporosity = 1.5")));

    let config = TransportConfig {
        groundwater_start_x: Some(20),
        ..TransportConfig::default()
    };
    assert!(matches!(
        config.build(),
        Err(SimulationError::Configuration(_))
    ));
}

#[test]
fn malformed_toml_is_an_error() {
    assert!(Config::from_toml("[transport\nlx = ").is_err());
    assert!(Config::from_file("/nonexistent/soil.toml").is_err());
}

#[test]
fn frame_count_floors() {
    let config = TransportConfig {
        total_time: 1.05,
        dt: 0.5,
        ..TransportConfig::default()
    };
    assert_eq!(config.frame_count(), 2);
}

#[test]
fn same_seed_builds_same_soil() {
    let config = TransportConfig {
        seed: Some(11),
        ..TransportConfig::default()
    };
    let a = config.build().unwrap();
    let b = config.build().unwrap();
    assert_eq!(a.soil.porosity, b.soil.porosity);
    assert_eq!(a.soil.velocity, b.soil.velocity);

    let other = TransportConfig {
        seed: Some(12),
        ..TransportConfig::default()
    };
    assert_ne!(a.soil.porosity, other.build().unwrap().soil.porosity);
}

#[test]
fn shipped_reference_file_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/reference.toml");
    let config = Config::from_file(path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.transport.frame_count(), defaults.transport.frame_count());
    assert_eq!(config.consolidation.t0, defaults.consolidation.t0);
    assert_eq!(config.consolidation.time_steps, defaults.consolidation.time_steps);
    assert_eq!(config.visualization.interval_ms, 50);
}
