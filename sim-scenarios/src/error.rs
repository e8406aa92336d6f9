//! Error types for sim-scenarios.

use sim_env::NetworkError;
use sim_types::DocumentError;
use thiserror::Error;

/// A room could not be turned into a document at all.
///
/// Rule violations are not errors; they are reported in
/// [`LoadOutcome`](crate::LoadOutcome).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The room could not be fetched and no cached copy exists.
    #[error("failed to fetch room {id}: {source}")]
    Network {
        /// Room id.
        id: String,
        /// Underlying network error.
        #[source]
        source: NetworkError,
    },

    /// The room body is not a room document.
    #[error("room {id} is malformed: {source}")]
    Malformed {
        /// Room id.
        id: String,
        /// Underlying decode error.
        #[source]
        source: DocumentError,
    },
}
