//! Key-share module error types.

use std::fmt;

use condenc_crypto::CanaryError;
use thiserror::Error;

/// Which request input failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    ActivePublicKey,
    KeyShare,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputField::ActivePublicKey => f.write_str("active public key"),
            InputField::KeyShare => f.write_str("key share"),
        }
    }
}

/// Why a decoded share was not accepted as the condition's key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("decryption error: {0}")]
    DecryptError(String),

    #[error("decrypted data does not match original data")]
    Mismatch,
}

/// Errors that can occur in the key-share module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyShareError {
    #[error("msg not from trusted source: {0}")]
    Unauthorized(String),

    #[error("active key not found")]
    NoActiveKey,

    #[error("malformed {field}: {reason}")]
    MalformedInput { field: InputField, reason: String },

    #[error("crypto operation failed: {0}")]
    CryptoOperationFailed(String),

    #[error("key share verification failed: {0}")]
    VerificationFailed(VerificationFailure),

    #[error("share threshold {threshold} exceeds {trusted} trusted addresses")]
    ThresholdExceedsTrustedSet { threshold: usize, trusted: usize },
}

impl KeyShareError {
    /// Whether resubmitting the identical request could later succeed.
    ///
    /// Only a missing active key is expected to resolve on its own (the DKG
    /// provisions one). Every other rejection is a fixed verdict on the input.
    pub fn is_transient(&self) -> bool {
        matches!(self, KeyShareError::NoActiveKey)
    }
}

impl From<CanaryError> for KeyShareError {
    fn from(err: CanaryError) -> Self {
        match err {
            CanaryError::Encrypt(e) => KeyShareError::CryptoOperationFailed(e.to_string()),
            CanaryError::Decrypt(e) => {
                KeyShareError::VerificationFailed(VerificationFailure::DecryptError(e.to_string()))
            }
            CanaryError::Mismatch => KeyShareError::VerificationFailed(VerificationFailure::Mismatch),
        }
    }
}
