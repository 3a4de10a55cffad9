mod config;
mod core;
mod dictionary;
mod drag;
mod error;
mod lexicon;
mod render;
mod spatial;
mod types;
mod ui;

use std::{fs::File, sync::Mutex};

use crate::{config::GameConfig, error::AppError};

/// Logs go to the file named by `LULLWORDS_LOG`; the terminal belongs to the UI.
fn init_tracing() -> Result<(), AppError> {
    use tracing_subscriber::EnvFilter;

    let Some(path) = std::env::var_os("LULLWORDS_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;
    let config = GameConfig::from_env()?;
    ui::run(config)
}
