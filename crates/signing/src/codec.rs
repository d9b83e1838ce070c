//! URL-safe base64 transport encoding for tokens.
//!
//! Tokens are encoded with the URL-safe alphabet (`-` and `_`) and without
//! trailing `=` padding. Decoding restores the padding before handing the
//! input to the strict decoder.

use base64::{engine::general_purpose, Engine};
use error_stack::Report;

use crate::error::SigningError;

/// Encode `text` as unpadded URL-safe base64.
#[must_use]
pub fn encode(text: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(text.as_bytes())
}

/// Decode unpadded (or padded) URL-safe base64 back into UTF-8 text.
///
/// # Errors
///
/// Returns [`SigningError::InvalidSignedMessage`] if the input is not valid
/// URL-safe base64 after re-padding, or if the decoded bytes are not UTF-8.
/// The underlying decoder error is not attached to the report.
pub fn decode(token: &str) -> Result<String, Report<SigningError>> {
    let padding = (4 - token.len() % 4) % 4;
    let mut padded = String::with_capacity(token.len() + padding);
    padded.push_str(token);
    padded.push_str(&"=".repeat(padding));

    let bytes = general_purpose::URL_SAFE.decode(padded).map_err(|e| {
        log::debug!("Rejected token: invalid base64 ({e})");
        Report::new(SigningError::InvalidSignedMessage)
    })?;

    String::from_utf8(bytes).map_err(|_| {
        log::debug!("Rejected token: decoded bytes are not UTF-8");
        Report::new(SigningError::InvalidSignedMessage)
    })
}
