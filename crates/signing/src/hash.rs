//! Hash algorithm selection for token MACs.
//!
//! The algorithm is a plain value chosen at construction time. Each variant
//! selects a concrete `Hmac<D>` instantiation from the `sha2` family, so
//! there is no dynamic dispatch on the signing path.

use core::fmt;
use core::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::SigningError;

/// Hash function used to compute token signatures.
///
/// Deserializes through [`FromStr`], so configuration accepts the same
/// spellings as `str::parse` (`sha256`, `SHA-256`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Lowercase identifier, e.g. `sha256`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest size in bytes, as reported by the hash itself.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha224 => <Sha224 as Digest>::output_size(),
            Self::Sha256 => <Sha256 as Digest>::output_size(),
            Self::Sha384 => <Sha384 as Digest>::output_size(),
            Self::Sha512 => <Sha512 as Digest>::output_size(),
        }
    }

    /// Length of the hex-encoded signature carried in a token.
    #[must_use]
    pub fn signature_len(self) -> usize {
        self.digest_len() * 2
    }

    /// Compute `HMAC(key, message)` and render it as lowercase hex.
    #[must_use]
    pub fn hex_mac(self, key: &[u8], message: &[u8]) -> String {
        match self {
            Self::Sha224 => hex_mac::<Hmac<Sha224>>(key, message),
            Self::Sha256 => hex_mac::<Hmac<Sha256>>(key, message),
            Self::Sha384 => hex_mac::<Hmac<Sha384>>(key, message),
            Self::Sha512 => hex_mac::<Hmac<Sha512>>(key, message),
        }
    }
}

fn hex_mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> String {
    let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SigningError;

    /// Accepts `sha256`, `SHA256`, `sha-256` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "");
        match normalized.as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(SigningError::Configuration {
                message: format!("Unsupported hash algorithm: {s}"),
            }),
        }
    }
}

impl TryFrom<String> for HashAlgorithm {
    type Error = SigningError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
