use anyhow::{Context, Result};
use soil_modeller::visualisation::{animate_transport, plot_consolidation};
use soil_modeller::Config;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    config.log_summary();

    let mut transport = config
        .transport
        .build()
        .context("Failed to set up transport model")?;
    let mut consolidation = config
        .consolidation
        .build()
        .context("Failed to set up consolidation model")?;

    if config.visualization.enabled {
        let gif = animate_transport(&mut transport, &config.visualization)?;
        log::info!("Transport animation saved to {}", gif.display());
    } else {
        transport.run()?;
    }
    log::info!(
        "Remaining contaminant mass: {:.4} (peak {:.4})",
        transport.total_mass(),
        transport.field().peak().0
    );

    let summary = consolidation.run()?;
    log::info!(
        "Consolidation finished after {} steps, surface-adjacent P = {:.3} MPa",
        summary.steps,
        consolidation.final_profile()[1] / 1e6
    );
    if config.visualization.enabled {
        let png = plot_consolidation(&consolidation, &config.visualization)?;
        log::info!("Pressure profile saved to {}", png.display());
    }

    Ok(())
}
