// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

// Run with `cargo run -p st-plot --example live_plot` and open
// `target/live_plot/linear-1.svg` while it trains.

use ndarray::Array2;
use spiral_config::{rng_from_optional, PlotSettings};
use st_init::{FloatX, Initializer, NormalizedInitialization};
use st_plot::{CallbackPoint, Extension, Plot, PlotConfig, SvgBackend, TrainingLog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = spiral_config::tracing::init_tracing() {
        eprintln!("tracing disabled: {err}");
    }

    let mut rng = rng_from_optional(Some(7), "st-plot/examples/live_plot");
    let mut weights = NormalizedInitialization::new().generate(&mut rng, (16, 1))?;
    let target = Array2::<FloatX>::from_elem((16, 1), 0.25);

    let config = PlotConfig::from_settings(&PlotSettings::from_env());
    let mut plot = Plot::new(
        "linear",
        vec![vec!["train_cost"], vec!["weight_norm"]],
        config,
        SvgBackend::new("target/live_plot"),
    )?;

    let mut log = TrainingLog::new();
    plot.dispatch(CallbackPoint::BeforeFirstEpoch, &log)?;
    for _epoch in 0..20 {
        for _ in 0..10 {
            let residual = &weights - &target;
            weights = &weights - &(residual * 0.05);
            log.next_iteration();
        }
        let residual = &weights - &target;
        log.record("train_cost", residual.mapv(|v| (v * v) as f64).mean().unwrap_or(0.0));
        log.record("weight_norm", weights.mapv(|v| (v * v) as f64).sum().sqrt());
        log.finish_epoch();
        plot.dispatch(CallbackPoint::AfterEpoch, &log)?;
    }
    Ok(())
}
