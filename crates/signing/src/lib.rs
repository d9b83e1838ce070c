//! URL-safe signed tokens.
//!
//! This crate serializes structured data to canonical JSON, signs it with an
//! HMAC, and encodes the result as unpadded URL-safe base64. The inverse
//! operation returns the original data only when the signature verifies.
//!
//! ```
//! use mapletree_signing::Signing;
//! use serde_json::{json, Value};
//!
//! let signing = Signing::new("k")?;
//! let token = signing.sign(&json!({"a": 1}))?;
//! let data: Value = signing.unsign(&token)?;
//! assert_eq!(data, json!({"a": 1}));
//! # Ok::<(), error_stack::Report<mapletree_signing::SigningError>>(())
//! ```
//!
//! # Modules
//!
//! - [`canonical`]: Deterministic JSON serialization of payloads
//! - [`codec`]: URL-safe base64 encoding without padding
//! - [`error`]: Error kinds for signing, verification and configuration
//! - [`hash`]: Hash algorithm selection for the HMAC
//! - [`settings`]: Configuration loading and validation
//! - [`signing`]: The signing context with `sign` and `unsign`
//! - [`test_support`]: Testing fixtures

pub mod canonical;
pub mod codec;
pub mod error;
pub mod hash;
pub mod settings;
pub mod signing;

pub use error::SigningError;
pub use hash::HashAlgorithm;
pub use settings::Settings;
pub use signing::Signing;
