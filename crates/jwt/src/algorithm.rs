use core::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::TokenError;

/// Signing algorithm identity.
///
/// Closed set of the JOSE algorithms a [`crate::TokenManager`] can be
/// configured with. The algorithm is fixed at construction and decides which
/// key-parsing strategy applies (see [`AlgorithmFamily`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SigningAlgorithm {
    ES256,
    ES384,
    /// Recognized, but not available in the signing backend.
    ES512,
    EdDSA,
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
}

/// Algorithm family: one key representation per family.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    Ecdsa,
    Eddsa,
    Hmac,
    Rsa,
    RsaPss,
}

impl SigningAlgorithm {
    pub const ALL: [SigningAlgorithm; 13] = [
        Self::ES256,
        Self::ES384,
        Self::ES512,
        Self::EdDSA,
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
    ];

    pub fn family(self) -> AlgorithmFamily {
        match self {
            Self::ES256 | Self::ES384 | Self::ES512 => AlgorithmFamily::Ecdsa,
            Self::EdDSA => AlgorithmFamily::Eddsa,
            Self::HS256 | Self::HS384 | Self::HS512 => AlgorithmFamily::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 => AlgorithmFamily::Rsa,
            Self::PS256 | Self::PS384 | Self::PS512 => AlgorithmFamily::RsaPss,
        }
    }

    /// JOSE `alg` header value.
    pub fn name(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::EdDSA => "EdDSA",
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        }
    }

    /// Whether signatures are randomized per call (ECDSA, RSA-PSS).
    ///
    /// Two tokens minted from identical claims only compare equal for
    /// deterministic schemes.
    pub fn is_randomized(self) -> bool {
        matches!(self.family(), AlgorithmFamily::Ecdsa | AlgorithmFamily::RsaPss)
    }

    /// Backend algorithm, if the backend implements this identity.
    pub(crate) fn backend(self) -> Option<Algorithm> {
        match self {
            Self::ES256 => Some(Algorithm::ES256),
            Self::ES384 => Some(Algorithm::ES384),
            Self::ES512 => None,
            Self::EdDSA => Some(Algorithm::EdDSA),
            Self::HS256 => Some(Algorithm::HS256),
            Self::HS384 => Some(Algorithm::HS384),
            Self::HS512 => Some(Algorithm::HS512),
            Self::RS256 => Some(Algorithm::RS256),
            Self::RS384 => Some(Algorithm::RS384),
            Self::RS512 => Some(Algorithm::RS512),
            Self::PS256 => Some(Algorithm::PS256),
            Self::PS384 => Some(Algorithm::PS384),
            Self::PS512 => Some(Algorithm::PS512),
        }
    }
}

impl core::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(trimmed.to_string()))
    }
}

impl TryFrom<String> for SigningAlgorithm {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SigningAlgorithm> for String {
    fn from(value: SigningAlgorithm) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for alg in SigningAlgorithm::ALL {
            assert_eq!(alg.name().parse::<SigningAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("hs256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::HS256);
        assert_eq!(" eddsa ".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::EdDSA);
    }

    #[test]
    fn unknown_names_are_unsupported() {
        for name in ["none", "HS1024", ""] {
            let err = name.parse::<SigningAlgorithm>().unwrap_err();
            assert!(matches!(err, TokenError::UnsupportedAlgorithm(_)), "{name}: {err:?}");
        }
    }

    #[test]
    fn families() {
        assert_eq!(SigningAlgorithm::ES384.family(), AlgorithmFamily::Ecdsa);
        assert_eq!(SigningAlgorithm::EdDSA.family(), AlgorithmFamily::Eddsa);
        assert_eq!(SigningAlgorithm::HS512.family(), AlgorithmFamily::Hmac);
        assert_eq!(SigningAlgorithm::RS256.family(), AlgorithmFamily::Rsa);
        assert_eq!(SigningAlgorithm::PS256.family(), AlgorithmFamily::RsaPss);
    }

    #[test]
    fn randomized_schemes() {
        assert!(SigningAlgorithm::ES256.is_randomized());
        assert!(SigningAlgorithm::PS512.is_randomized());
        assert!(!SigningAlgorithm::HS256.is_randomized());
        assert!(!SigningAlgorithm::RS256.is_randomized());
        assert!(!SigningAlgorithm::EdDSA.is_randomized());
    }

    #[test]
    fn serde_uses_jose_names() {
        let json = serde_json::to_string(&SigningAlgorithm::PS384).unwrap();
        assert_eq!(json, "\"PS384\"");
        let back: SigningAlgorithm = serde_json::from_str("\"rs512\"").unwrap();
        assert_eq!(back, SigningAlgorithm::RS512);
        assert!(serde_json::from_str::<SigningAlgorithm>("\"none\"").is_err());
    }
}
