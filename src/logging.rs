//! @acp:module "Logging"
//! @acp:summary "tracing-subscriber setup for tools embedding the analyzer"
//! @acp:domain analysis
//! @acp:layer utility

use tracing_subscriber::EnvFilter;

use crate::error::{AxonError, Result};

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "axon_meta=debug"
    } else {
        "axon_meta=warn"
    }
}

/// `RUST_LOG` when set, otherwise the default for the verbosity
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// @acp:summary "Install a global fmt subscriber writing to stderr"
///
/// Fails if another global subscriber is already installed.
pub fn init(verbose: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AxonError::Other(format!("failed to initialize logging: {}", e)))
}
