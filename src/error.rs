// Error taxonomy for the valuation kernel.

use thiserror::Error;

/// The single error type returned by fallible stages of the kernel.
///
/// Per-record shape errors aggregate into one `MalformedInput` carrying every
/// offending id rather than failing on the first one, so a caller can report
/// a complete list instead of fixing one record at a time.
#[derive(Debug, Error)]
pub enum TrpError {
    #[error("malformed input record(s): {ids:?}: {message}")]
    MalformedInput { ids: Vec<String>, message: String },

    #[error("bad config field `{field}`: {message}")]
    BadConfig { field: String, message: String },

    #[error("insufficient eligible players at position `{position}`: need {needed}, have {available}")]
    InsufficientPool {
        position: String,
        needed: usize,
        available: usize,
    },

    #[error("numerical failure for player `{player_id}` in pool `{pool}` category `{category}`: produced non-finite value")]
    NumericalFailure {
        player_id: String,
        pool: String,
        category: String,
    },
}
