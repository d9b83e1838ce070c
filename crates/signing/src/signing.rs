//! Signing context: creates and verifies URL-safe signed tokens.
//!
//! A token is built as
//!
//! ```text
//! base64url_nopad( canonical_json(data) + "." + hex(HMAC(key, canonical_json(data))) )
//! ```
//!
//! Verification splits the decoded text on its last `.`, re-signs the
//! transmitted body bytes and compares signatures in constant time. The body
//! is only parsed after the signature matches.

use core::fmt;

use error_stack::Report;
use serde::de::DeserializeOwned;
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::canonical::to_canonical_string;
use crate::codec;
use crate::error::SigningError;
use crate::hash::HashAlgorithm;
use crate::settings::Settings;

/// Separator between the serialized body and its signature.
pub const SEPARATOR: char = '.';

/// Immutable signing context bound to one secret key and hash algorithm.
///
/// The context is `Send + Sync` and never mutated after construction, so a
/// single instance can serve any number of threads.
#[derive(Clone)]
pub struct Signing {
    secret_key: Vec<u8>,
    hash_algorithm: HashAlgorithm,
}

impl Signing {
    /// Create a context using HMAC-SHA256.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Configuration`] if `secret_key` is empty.
    pub fn new(secret_key: &str) -> Result<Self, Report<SigningError>> {
        Self::with_hash_algorithm(secret_key, HashAlgorithm::default())
    }

    /// Create a context using the given hash algorithm.
    ///
    /// The key is taken as its UTF-8 bytes. Key strength is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Configuration`] if `secret_key` is empty.
    pub fn with_hash_algorithm(
        secret_key: &str,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Self, Report<SigningError>> {
        if secret_key.is_empty() {
            return Err(Report::new(SigningError::Configuration {
                message: "Secret key must not be empty".into(),
            }));
        }

        Ok(Self {
            secret_key: secret_key.as_bytes().to_vec(),
            hash_algorithm,
        })
    }

    /// Create a context from loaded [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Configuration`] if the configured key is empty.
    pub fn from_settings(settings: &Settings) -> Result<Self, Report<SigningError>> {
        Self::with_hash_algorithm(
            &settings.signing.secret_key,
            settings.signing.hash_algorithm,
        )
    }

    /// Hash algorithm this context signs with.
    #[must_use]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Serialize, sign and encode `data` into a URL-safe token.
    ///
    /// Signing is deterministic: the same context and data always produce
    /// the same token.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Serialization`] if `data` cannot be serialized
    /// to JSON.
    pub fn sign<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, Report<SigningError>> {
        let body = to_canonical_string(data)?;
        let signature = self.create_signature(&body);

        log::debug!("Signed {} byte body with {}", body.len(), self.hash_algorithm);

        let mut message = String::with_capacity(body.len() + 1 + signature.len());
        message.push_str(&body);
        message.push(SEPARATOR);
        message.push_str(&signature);

        Ok(codec::encode(&message))
    }

    /// Verify `token` and return the data it carries.
    ///
    /// Use `serde_json::Value` as `T` to recover the payload untyped.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidSignedMessage`] if the token is not
    /// valid base64, has no separator, carries a wrong signature, or its body
    /// does not deserialize into `T`. The report carries no further detail.
    pub fn unsign<T: DeserializeOwned>(&self, token: &str) -> Result<T, Report<SigningError>> {
        let message = codec::decode(token)?;

        let Some((body, signature)) = message.rsplit_once(SEPARATOR) else {
            log::debug!("Rejected token: missing separator");
            return Err(Report::new(SigningError::InvalidSignedMessage));
        };

        if !self.verify_signature(body, signature) {
            log::debug!("Rejected token: signature mismatch");
            return Err(Report::new(SigningError::InvalidSignedMessage));
        }

        serde_json::from_str(body).map_err(|_| {
            log::debug!("Rejected token: body does not deserialize");
            Report::new(SigningError::InvalidSignedMessage)
        })
    }

    /// Lowercase hex MAC of `body` under this context's key.
    #[must_use]
    pub fn create_signature(&self, body: &str) -> String {
        self.hash_algorithm.hex_mac(&self.secret_key, body.as_bytes())
    }

    /// Check `signature` against the expected signature for `body`.
    ///
    /// The comparison is exact (length and letter case included) and runs in
    /// constant time with respect to the signature contents.
    #[must_use]
    pub fn verify_signature(&self, body: &str, signature: &str) -> bool {
        let expected = self.create_signature(body);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

impl fmt::Debug for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signing")
            .field("secret_key", &"[REDACTED]")
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}
