//! Engine binary for the Metropolis simulation.
//!
//! # Startup sequence
//!
//! 1. Load configuration from `metropolis-config.yaml` (or the path in
//!    `METROPOLIS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Resume from the latest snapshot, or create the starting city
//! 4. Build the engine and register the log subscriber
//! 5. Run the tick loop until Ctrl-C or the configured tick limit
//! 6. Save a final snapshot and log the result

mod error;
mod log_subscriber;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metropolis_core::config::SimulationConfig;
use metropolis_core::{Engine, NoOpHook, OperatorState, SnapshotHook, TickHook, run_engine};
use metropolis_db::{CityRepository, MemoryStore, SnapshotStore};
use metropolis_types::CityId;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_subscriber::LogSubscriber;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "metropolis-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the tick loop fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Configuration.
    let config_path = std::env::var_os("METROPOLIS_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Logging.
    init_logging(&config)?;
    info!(
        path = %config_path.display(),
        tick_interval_ms = config.engine.tick_interval_ms,
        seed = config.engine.seed,
        max_ticks = config.engine.max_ticks,
        "metropolis-engine starting"
    );

    // 3. Store and city.
    let (store, city_id) = load_or_create(&config)?;

    // 4. Engine.
    let mut engine = Engine::new(store, city_id, &config)?;
    engine.register(Box::new(LogSubscriber::new(
        config.time.ticks_per_hour(),
    )));
    let engine = Arc::new(Mutex::new(engine));

    // 5. Tick loop.
    let operator = Arc::new(OperatorState::new(
        config.engine.tick_interval_ms,
        config.engine.max_ticks,
    ));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                operator.request_stop();
            }
        });
    }

    let mut hook: Box<dyn TickHook<MemoryStore>> = match &config.engine.snapshot_path {
        Some(path) => Box::new(SnapshotHook::new(
            SnapshotStore::new(path),
            config.engine.snapshot_interval_ticks,
        )),
        None => Box::new(NoOpHook),
    };
    let result = run_engine(engine, &operator, hook.as_mut()).await?;

    // 6. Done.
    info!(
        end_reason = ?result.end_reason,
        ticks_run = result.ticks_run,
        last_tick = result.last_tick,
        "metropolis-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration, falling back to defaults if the file is absent.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        Ok(SimulationConfig::parse("{}")?)
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides `logging.level`.
fn init_logging(config: &SimulationConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Resume from the configured snapshot, or create a fresh starting city.
fn load_or_create(config: &SimulationConfig) -> Result<(MemoryStore, CityId), EngineError> {
    if let Some(path) = &config.engine.snapshot_path {
        if let Some(snapshot) = SnapshotStore::new(path).load()? {
            let city = snapshot
                .store
                .list_cities()?
                .into_iter()
                .next()
                .ok_or_else(|| EngineError::EmptySnapshot {
                    path: path.display().to_string(),
                })?;
            info!(
                city_id = %city.id,
                name = %city.name,
                tick = snapshot.tick,
                "resuming from snapshot"
            );
            return Ok((snapshot.store, city.id));
        }
    }

    let mut store = MemoryStore::new();
    let start = metropolis_world::create_starting_city(
        &mut store,
        &config.city.name,
        config.city.width,
        config.city.height,
        config.city.treasury,
    )?;
    info!(
        city_id = %start.city_id,
        residents = start.residents.len(),
        "starting city created"
    );
    Ok((store, start.city_id))
}
