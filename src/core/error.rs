//! Error types for the terrain streaming core

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Tiling scheme was built from a zero or negative extent; all of its
    /// queries fail with this instead of producing NaN coordinates.
    #[error("degenerate tiling scheme")]
    DegenerateScheme,

    /// Caller broke an API precondition (non-square render extent, cancel of
    /// an unknown job id, tile address out of level range). Asserts in debug
    /// builds, rejected with this error in release.
    #[error("contract violation: {0}")]
    Contract(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("mesh fetch error: {0}")]
    Fetch(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Flag a contract violation: panics in debug builds, produces an
/// `Error::Contract` for release builds.
pub fn contract_violation(msg: impl Into<String>) -> Error {
    let msg = msg.into();
    debug_assert!(false, "contract violation: {}", msg);
    Error::Contract(msg)
}
