// Author: Dustin Pilgrim
// License: MIT

use thiserror::Error;

/// Errors reported by host collaborators (window enumeration, native calls).
///
/// The engine never lets these cross its public boundary: lookups that fail
/// are skipped, native call failures are logged.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("window enumeration failed: {0}")]
    Enumeration(String),

    #[error("native call failed: {0}")]
    Native(String),

    #[error("last selection store: {0}")]
    Store(String),
}
