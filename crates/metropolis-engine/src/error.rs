//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: metropolis_core::ConfigError,
    },

    /// Loading or inspecting the store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: metropolis_db::StoreError,
    },

    /// Creating the starting city failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: metropolis_world::WorldError,
    },

    /// Building the engine failed.
    #[error("engine setup error: {source}")]
    Setup {
        /// The underlying tick error.
        #[from]
        source: metropolis_core::TickError,
    },

    /// The tick loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: metropolis_core::RunnerError,
    },

    /// A snapshot holds no city to resume.
    #[error("snapshot at {path} contains no city")]
    EmptySnapshot {
        /// The snapshot file.
        path: String,
    },

    /// The log subscriber could not be installed.
    #[error("logging setup failed: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
