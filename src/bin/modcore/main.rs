//! modcore - terminal host for the modulation core
//!
//! Run with: cargo run
//!
//! The audio callback plays the role of the tick interrupt and a background
//! thread runs the render loop. Logs go to `modcore.log` (`RUST_LOG` sets the
//! level) so they don't tear up the terminal.

mod app;
mod ui;

use app::Modcore;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use modcore::{ControlMode, ModulatorSettings, ProcessorFunction};

const LOG_FILE: &str = "modcore.log";

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    Modcore::new()
        .settings(ModulatorSettings {
            function: ProcessorFunction::Lfo,
            control_mode: ControlMode::Half,
            parameters: [0x6000, 0x0000, 0x8000, 0x8000],
        })
        .run()
}

fn init_logging() -> EyreResult<()> {
    let file = std::fs::File::create(LOG_FILE)
        .wrap_err_with(|| format!("failed to create {LOG_FILE}"))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
