use crate::config::VisualizationConfig;
use crate::consolidation::ConsolidationSimulation;
use crate::error::SimulationError;
use crate::transport::TransportSimulation;
use anyhow::{anyhow, Context, Result};
use colorgrad::Gradient;
use ndarray::{ArrayView1, ArrayView2};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

fn render_error<E: Display>(e: E) -> anyhow::Error {
    anyhow!("Rendering failed: {}", e)
}

/// Concentration heat map written frame by frame into an animated GIF.
pub struct PlumeAnimation {
    root: DrawingArea<BitMapBackend<'static>, Shift>,
    gradient: Box<dyn Gradient>,
    extent: (f64, f64),
    v_max: f64,
    path: PathBuf,
}

impl PlumeAnimation {
    /// `v_max` fixes the colour scale for the whole animation.
    pub fn create(
        path: impl AsRef<Path>,
        config: &VisualizationConfig,
        extent: (f64, f64),
        v_max: f64,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let backend = BitMapBackend::gif(
            &path,
            (config.image_width, config.image_height),
            config.interval_ms,
        )
        .map_err(render_error)?;

        Ok(Self {
            root: backend.into_drawing_area(),
            gradient: Box::new(colorgrad::preset::rd_bu()),
            extent,
            v_max: if v_max > 0.0 { v_max } else { 1.0 },
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn draw_frame(&self, data: ArrayView2<'_, f64>, time: f64) -> Result<()> {
        self.root.fill(&WHITE).map_err(render_error)?;

        let (nx, ny) = data.dim();
        let (lx, ly) = self.extent;
        let (cell_w, cell_h) = (lx / nx as f64, ly / ny as f64);

        {
            let title = format!("Contaminant plume (t = {:.1} s)", time);
            let mut chart = ChartBuilder::on(&self.root)
                .caption(&title, ("sans-serif", 24))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(40)
                .build_cartesian_2d(0.0..lx, 0.0..ly)
                .map_err(render_error)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("X (m)")
                .y_desc("Y (m)")
                .draw()
                .map_err(render_error)?;

            chart
                .draw_series(data.indexed_iter().map(|((i, j), &value)| {
                    let x0 = i as f64 * cell_w;
                    let y0 = j as f64 * cell_h;
                    Rectangle::new(
                        [(x0, y0), (x0 + cell_w, y0 + cell_h)],
                        self.value_to_color(value).filled(),
                    )
                }))
                .map_err(render_error)?;
        }

        self.root.present().map_err(render_error)?;
        Ok(())
    }

    // Blue for clean soil, red at the colour-scale maximum
    fn value_to_color(&self, value: f64) -> RGBColor {
        let normalized = (value / self.v_max).clamp(0.0, 1.0);
        let rgba = self.gradient.at(1.0 - normalized as f32).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }
}

/// Pulls every frame from the transport model and renders it.
pub fn animate_transport(
    sim: &mut TransportSimulation,
    config: &VisualizationConfig,
) -> Result<PathBuf> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", config.output_dir))?;

    let path = Path::new(&config.output_dir).join("transport.gif");
    let (v_max, _) = sim.field().peak();
    let animation = PlumeAnimation::create(
        &path,
        config,
        (sim.grid.width(), sim.grid.height()),
        v_max,
    )?;

    log::info!(
        "Animating {} frames at {} ms into {}",
        sim.params.frame_count,
        config.interval_ms,
        path.display()
    );

    while let Some(frame) = sim.advance_frame()? {
        if let Err(e) = animation.draw_frame(frame.concentration, frame.time) {
            log::warn!("Failed to draw frame {}: {}", frame.index, e);
        }
    }

    Ok(animation.path().to_path_buf())
}

/// Final pore-pressure profile against depth, depth increasing downwards.
pub fn plot_pressure_profile(
    path: impl AsRef<Path>,
    pressure: ArrayView1<'_, f64>,
    depth: ArrayView1<'_, f64>,
    size: (u32, u32),
) -> Result<()> {
    if pressure.len() != depth.len() || pressure.is_empty() {
        return Err(SimulationError::configuration(format!(
            "Profile needs matching, non-empty arrays (pressure={}, depth={})",
            pressure.len(),
            depth.len()
        ))
        .into());
    }

    let path = path.as_ref();
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mpa: Vec<f64> = pressure.iter().map(|p| p / 1e6).collect();
    let (mut p_min, mut p_max) = mpa
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    if p_max <= p_min {
        p_min -= 0.5;
        p_max += 0.5;
    }
    let z_max = depth.iter().copied().fold(0.0_f64, f64::max);

    {
        let mut chart = ChartBuilder::on(&root)
            .caption("Pore pressure", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(p_min..p_max, 0.0..z_max)
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .x_desc("Pore pressure (MPa)")
            .y_desc("Depth (m)")
            .y_label_formatter(&|y| format!("{:.0}", z_max - y))
            .draw()
            .map_err(render_error)?;

        chart
            .draw_series(LineSeries::new(
                mpa.iter()
                    .zip(depth.iter())
                    .map(|(&p, &z)| (p, z_max - z)),
                &BLUE,
            ))
            .map_err(render_error)?
            .label("Pore pressure (MPa)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
    }

    root.present().map_err(render_error)?;
    log::info!("Saved profile: {}", path.display());
    Ok(())
}

/// Plots the profile of a finished consolidation run into the output directory.
pub fn plot_consolidation(sim: &ConsolidationSimulation, config: &VisualizationConfig) -> Result<PathBuf> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", config.output_dir))?;
    let path = Path::new(&config.output_dir).join("pore_pressure.png");
    plot_pressure_profile(
        &path,
        sim.final_profile(),
        sim.depth(),
        (config.image_width, config.image_height),
    )?;
    Ok(path)
}
