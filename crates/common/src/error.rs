//! Error types for the bid adapter.
//!
//! Failures are reported as [`error_stack::Report<BidAdapterError>`] so callers
//! get the full context chain when something goes wrong while loading
//! configuration or serializing a payload. Malformed bid data is never an
//! error: it is dropped or defaulted by the component that reads it.

use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum BidAdapterError {
    /// Settings could not be loaded, parsed or validated.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// The outbound request could not be assembled.
    #[display("Request error: {message}")]
    Request { message: String },
}
