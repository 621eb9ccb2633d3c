use std::collections::HashSet;

use chrono::Duration;
use jsonwebtoken::{Algorithm, Header, Validation};

use crate::keys::KeyMaterial;
use crate::config::MAX_LEEWAY_SECS;
use crate::{
    Claims, KeyConfig, KeyHalf, SigningAlgorithm, TokenError, TokenResult, ValidationConfig,
    now_seconds,
};

/// Signs and verifies bearer tokens for one algorithm and one key pair.
///
/// Built once at startup and immutable afterwards: `signed_token` and
/// `parse` take `&self` and may be called concurrently (share it behind an
/// `Arc`). The algorithm and the parsed key types always agree; that is
/// settled by the construction-time dispatch and never re-checked.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: SigningAlgorithm,
    backend: Algorithm,
    keys: KeyMaterial,
    validation: Validation,
    leeway: Duration,
}

/// Header and claims, not yet signed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedToken {
    header: Header,
    claims: Claims,
}

impl UnsignedToken {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// A token whose signature and time bounds have been checked.
///
/// Only [`TokenManager::parse`] produces one, so holding a `VerifiedToken`
/// means its claims are trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    header: Header,
    claims: Claims,
}

impl VerifiedToken {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

impl TokenManager {
    /// Read the configured key files and parse them for `algorithm`.
    ///
    /// A missing path leaves that half absent. A path that cannot be read
    /// fails with [`TokenError::KeyRead`]; bytes that do not parse for the
    /// algorithm family fail with [`TokenError::KeyParse`].
    pub fn new(algorithm: SigningAlgorithm, config: &KeyConfig) -> TokenResult<Self> {
        let keys = KeyMaterial::load(algorithm, config)?;
        Self::from_keys(algorithm, keys)
    }

    /// Same as [`TokenManager::new`], from in-memory key bytes (PEM, or the
    /// raw secret for HMAC).
    pub fn from_key_bytes(
        algorithm: SigningAlgorithm,
        public_key: Option<&[u8]>,
        private_key: Option<&[u8]>,
    ) -> TokenResult<Self> {
        let keys = KeyMaterial::parse(algorithm, public_key, private_key)?;
        Self::from_keys(algorithm, keys)
    }

    /// HMAC manager using `secret` for both signing and verification.
    pub fn from_secret(algorithm: SigningAlgorithm, secret: &[u8]) -> TokenResult<Self> {
        Self::from_key_bytes(algorithm, Some(secret), Some(secret))
    }

    fn from_keys(algorithm: SigningAlgorithm, keys: KeyMaterial) -> TokenResult<Self> {
        let backend = algorithm
            .backend()
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(algorithm.name().to_string()))?;

        Ok(Self {
            algorithm,
            backend,
            keys,
            validation: build_validation(backend, &ValidationConfig::default()),
            leeway: Duration::zero(),
        })
    }

    /// Replace the registered-claim checks used by [`TokenManager::parse`].
    pub fn with_validation(mut self, config: ValidationConfig) -> Self {
        self.validation = build_validation(self.backend, &config);
        self.leeway = Duration::seconds(config.leeway.min(MAX_LEEWAY_SECS) as i64);
        self
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn can_sign(&self) -> bool {
        self.keys.private.is_some()
    }

    pub fn can_verify(&self) -> bool {
        self.keys.public.is_some()
    }

    /// Mint a compact `header.payload.signature` token for `claims`.
    pub fn signed_token(&self, claims: &Claims) -> TokenResult<String> {
        let token = self.new_token(claims.clone());
        self.signed_string(&token)
    }

    /// Build an unsigned token carrying this manager's algorithm.
    pub fn new_token(&self, claims: Claims) -> UnsignedToken {
        UnsignedToken {
            header: Header::new(self.backend),
            claims,
        }
    }

    /// Serialize and sign `token` with the private key.
    pub fn signed_string(&self, token: &UnsignedToken) -> TokenResult<String> {
        let key = self
            .keys
            .private
            .as_ref()
            .ok_or_else(|| TokenError::signing("private key is not configured"))?;

        jsonwebtoken::encode(&token.header, &token.claims, key)
            .map_err(|e| TokenError::signing(e.to_string()))
    }

    /// Verify `token` against the public key and decode its claims.
    ///
    /// The header's `alg` must name this manager's algorithm; a token
    /// declaring anything else is rejected before the signature is checked.
    pub fn parse(&self, token: &str) -> TokenResult<VerifiedToken> {
        let segments = token.split('.').count();
        if segments != 3 {
            return Err(TokenError::malformed(format!(
                "expected 3 segments, found {segments}"
            )));
        }

        let header = jsonwebtoken::decode_header(token).map_err(TokenError::from_verification)?;
        if header.alg != self.backend {
            return Err(TokenError::AlgorithmMismatch {
                expected: self.algorithm.name().to_string(),
                found: format!("{:?}", header.alg),
            });
        }

        let key = self
            .keys
            .public
            .as_ref()
            .ok_or(TokenError::MissingKey(KeyHalf::Public))?;

        let data = jsonwebtoken::decode::<Claims>(token, key, &self.validation)
            .map_err(TokenError::from_verification)?;
        check_time_bounds(&data.claims, now_seconds(), self.leeway)?;

        Ok(VerifiedToken {
            header: data.header,
            claims: data.claims,
        })
    }

    /// Claims of a verified token.
    pub fn get_claims<'a>(&self, token: &'a VerifiedToken) -> &'a Claims {
        token.claims()
    }
}

impl core::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .field("can_sign", &self.can_sign())
            .field("can_verify", &self.can_verify())
            .finish_non_exhaustive()
    }
}

/// `exp` and `nbf` against `now`, each widened by `leeway`.
///
/// A token is expired once `now >= exp + leeway` and not yet valid while
/// `now < nbf - leeway`. Pre-1970 timestamps are compared like any other.
fn check_time_bounds(
    claims: &Claims,
    now: chrono::DateTime<chrono::Utc>,
    leeway: Duration,
) -> TokenResult<()> {
    if let Some(exp) = claims.exp {
        let deadline = exp.checked_add_signed(leeway).unwrap_or(exp);
        if now >= deadline {
            return Err(TokenError::ExpiredToken);
        }
    }

    if let Some(nbf) = claims.nbf {
        let start = nbf.checked_sub_signed(leeway).unwrap_or(nbf);
        if now < start {
            return Err(TokenError::NotYetValid);
        }
    }

    Ok(())
}

fn build_validation(backend: Algorithm, config: &ValidationConfig) -> Validation {
    let mut validation = Validation::new(backend);
    // Time bounds are checked on the decoded claims by `check_time_bounds`.
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = HashSet::new();

    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
    }

    if config.audience.is_empty() {
        validation.validate_aud = false;
    } else {
        validation.set_audience(config.audience.as_slice());
    }

    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_carries_manager_algorithm() {
        let manager = TokenManager::from_secret(SigningAlgorithm::HS384, b"k").unwrap();
        let token = manager.new_token(Claims::new("u1"));
        assert_eq!(token.header().alg, Algorithm::HS384);
        assert_eq!(token.header().typ.as_deref(), Some("JWT"));
        assert_eq!(token.claims().uid, "u1");
    }

    #[test]
    fn capabilities_follow_configured_halves() {
        let verify_only =
            TokenManager::from_key_bytes(SigningAlgorithm::HS256, Some(&b"k"[..]), None).unwrap();
        assert!(verify_only.can_verify());
        assert!(!verify_only.can_sign());

        let err = verify_only.signed_token(&Claims::new("u1")).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    fn at(ts: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let claims = Claims::new("u1").expires_at(at(1_000));
        assert!(matches!(
            check_time_bounds(&claims, at(1_000), Duration::zero()),
            Err(TokenError::ExpiredToken)
        ));
        assert!(check_time_bounds(&claims, at(999), Duration::zero()).is_ok());
        assert!(check_time_bounds(&claims, at(1_009), Duration::seconds(10)).is_ok());
        assert!(matches!(
            check_time_bounds(&claims, at(1_010), Duration::seconds(10)),
            Err(TokenError::ExpiredToken)
        ));
    }

    #[test]
    fn not_before_boundary_is_inclusive() {
        let claims = Claims::new("u1").not_before(at(1_000));
        assert!(check_time_bounds(&claims, at(1_000), Duration::zero()).is_ok());
        assert!(matches!(
            check_time_bounds(&claims, at(999), Duration::zero()),
            Err(TokenError::NotYetValid)
        ));
        assert!(check_time_bounds(&claims, at(995), Duration::seconds(5)).is_ok());
    }

    #[test]
    fn pre_epoch_expiry_is_expired() {
        let claims = Claims::new("u1").expires_at(at(-10));
        assert!(matches!(
            check_time_bounds(&claims, at(0), Duration::zero()),
            Err(TokenError::ExpiredToken)
        ));
    }

    #[test]
    fn debug_does_not_print_keys() {
        let manager = TokenManager::from_secret(SigningAlgorithm::HS256, b"super-secret").unwrap();
        let debug = format!("{manager:?}");
        assert!(debug.contains("HS256"));
        assert!(!debug.contains("super-secret"));
    }
}
