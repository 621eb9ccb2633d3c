use std::path::PathBuf;

use thiserror::Error;

/// Which half of a key pair an error refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyHalf {
    Public,
    Private,
}

impl core::fmt::Display for KeyHalf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyHalf::Public => f.write_str("public"),
            KeyHalf::Private => f.write_str("private"),
        }
    }
}

/// Token manager error taxonomy.
///
/// Construction fails with `UnsupportedAlgorithm`, `KeyRead` or `KeyParse`.
/// Minting fails with `Signing`. Verification failures are kept distinct so
/// callers can tell an expired token from a forged one.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("failed to read {half} key file {path:?}: {source}")]
    KeyRead {
        half: KeyHalf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error while parsing {half} key: {source}")]
    KeyParse {
        half: KeyHalf,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("{0} key is not configured")]
    MissingKey(KeyHalf),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch { expected: String, found: String },

    #[error("token has expired")]
    ExpiredToken,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("claim mismatch: {0}")]
    ClaimMismatch(&'static str),
}

impl TokenError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Stable snake_case identifier, suitable for API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::KeyRead { .. } => "key_read_error",
            Self::KeyParse { .. } => "key_parse_error",
            Self::MissingKey(_) => "missing_key",
            Self::Signing(_) => "signing_error",
            Self::MalformedToken(_) => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::AlgorithmMismatch { .. } => "algorithm_mismatch",
            Self::ExpiredToken => "expired_token",
            Self::NotYetValid => "not_yet_valid",
            Self::ClaimMismatch(_) => "claim_mismatch",
        }
    }

    /// Map a backend verification error onto the taxonomy.
    pub(crate) fn from_verification(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::ExpiredToken,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidIssuer => Self::ClaimMismatch("iss"),
            ErrorKind::InvalidAudience => Self::ClaimMismatch("aud"),
            ErrorKind::InvalidSubject => Self::ClaimMismatch("sub"),
            ErrorKind::MissingRequiredClaim(claim) => {
                Self::MalformedToken(format!("missing required claim '{claim}'"))
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::MalformedToken(err.to_string()),
            // Key/primitive failures while verifying: the signature cannot be
            // trusted under this manager's key.
            _ => Self::InvalidSignature,
        }
    }
}

pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::{Error, ErrorKind};

    #[test]
    fn verification_errors_are_not_conflated() {
        let expired = TokenError::from_verification(Error::from(ErrorKind::ExpiredSignature));
        let forged = TokenError::from_verification(Error::from(ErrorKind::InvalidSignature));
        let early = TokenError::from_verification(Error::from(ErrorKind::ImmatureSignature));
        let junk = TokenError::from_verification(Error::from(ErrorKind::InvalidToken));

        assert!(matches!(expired, TokenError::ExpiredToken));
        assert!(matches!(forged, TokenError::InvalidSignature));
        assert!(matches!(early, TokenError::NotYetValid));
        assert!(matches!(junk, TokenError::MalformedToken(_)));
    }

    #[test]
    fn claim_mismatches_name_the_claim() {
        let err = TokenError::from_verification(Error::from(ErrorKind::InvalidAudience));
        assert!(matches!(err, TokenError::ClaimMismatch("aud")));
        assert_eq!(err.kind(), "claim_mismatch");
    }

    #[test]
    fn key_half_display() {
        let err = TokenError::MissingKey(KeyHalf::Private);
        assert_eq!(err.to_string(), "private key is not configured");
    }
}
