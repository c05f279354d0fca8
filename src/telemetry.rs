//! Tracing subscriber setup for processes that embed the store.

use tracing_subscriber::EnvFilter;

use crate::error::StoreError;

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` (default
/// `info`). With `json`, events are emitted as JSON lines.
///
/// # Errors
///
/// Returns [`StoreError::Internal`] if a global subscriber is already
/// installed.
pub fn init(json: bool) -> Result<(), StoreError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| StoreError::Internal(format!("tracing subscriber: {e}")))
}
