//! Error types for token signing and verification.

use derive_more::{Display, Error};

/// Errors raised while signing, verifying or configuring tokens.
///
/// Every verification failure maps to [`SigningError::InvalidSignedMessage`]
/// without an attached cause, so callers cannot tell a malformed encoding
/// from a forged signature.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The payload could not be canonically serialized.
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// The token failed decoding, parsing or signature verification.
    #[display("Invalid signed message")]
    InvalidSignedMessage,

    /// The signing context could not be built from the supplied configuration.
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}
