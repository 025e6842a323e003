//! Application entry point for the 3D pipes viewer.
//!
//! This binary sets up logging and eframe/egui, then delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use pipe_core::config::GrowthConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use viewer::Viewer;

/// Starts the native eframe application.
///
/// Log verbosity is taken from `RUST_LOG`, defaulting to `info` for
/// both crates. Growth starts from [`GrowthConfig::default`] with an
/// unseeded RNG; both can be changed from the config panel.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipe_core=info,pipe_view=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting pipe viewer");

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "3D Pipes",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new(GrowthConfig::default(), None)?))),
    )
}
