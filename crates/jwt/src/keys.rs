//! Key loading and the per-family parsing dispatch.

use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey, errors::Error as BackendError};

use crate::{AlgorithmFamily, KeyConfig, KeyHalf, SigningAlgorithm, TokenError, TokenResult};

/// Parsed key pair. Either half may be absent.
#[derive(Clone)]
pub(crate) struct KeyMaterial {
    pub(crate) public: Option<DecodingKey>,
    pub(crate) private: Option<EncodingKey>,
}

/// Key-parsing strategy for one algorithm family.
struct KeyParser {
    public: fn(&[u8]) -> Result<DecodingKey, BackendError>,
    private: fn(&[u8]) -> Result<EncodingKey, BackendError>,
}

fn parser_for(family: AlgorithmFamily) -> KeyParser {
    match family {
        AlgorithmFamily::Ecdsa => KeyParser {
            public: DecodingKey::from_ec_pem,
            private: EncodingKey::from_ec_pem,
        },
        AlgorithmFamily::Eddsa => KeyParser {
            public: DecodingKey::from_ed_pem,
            private: EncodingKey::from_ed_pem,
        },
        // Shared secret: raw bytes are both halves.
        AlgorithmFamily::Hmac => KeyParser {
            public: |bytes| Ok(DecodingKey::from_secret(bytes)),
            private: |bytes| Ok(EncodingKey::from_secret(bytes)),
        },
        AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss => KeyParser {
            public: DecodingKey::from_rsa_pem,
            private: EncodingKey::from_rsa_pem,
        },
    }
}

impl KeyMaterial {
    /// Parse raw key bytes for `algorithm`. Empty input counts as absent.
    pub(crate) fn parse(
        algorithm: SigningAlgorithm,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> TokenResult<Self> {
        if algorithm.backend().is_none() {
            return Err(TokenError::UnsupportedAlgorithm(algorithm.name().to_string()));
        }

        let parser = parser_for(algorithm.family());

        let public = public
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| (parser.public)(bytes))
            .transpose()
            .map_err(|source| TokenError::KeyParse {
                half: KeyHalf::Public,
                source,
            })?;

        let private = private
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| (parser.private)(bytes))
            .transpose()
            .map_err(|source| TokenError::KeyParse {
                half: KeyHalf::Private,
                source,
            })?;

        Ok(Self { public, private })
    }

    /// Read the configured key files and parse them for `algorithm`.
    pub(crate) fn load(algorithm: SigningAlgorithm, config: &KeyConfig) -> TokenResult<Self> {
        let public = read_key(KeyHalf::Public, config.public_key_file.as_deref())?;
        let private = read_key(KeyHalf::Private, config.private_key_file.as_deref())?;
        Self::parse(algorithm, public.as_deref(), private.as_deref())
    }
}

/// No path means "intentionally omitted"; a path that cannot be read is an error.
fn read_key(half: KeyHalf, path: Option<&Path>) -> TokenResult<Option<Vec<u8>>> {
    let Some(path) = path else {
        return Ok(None);
    };

    std::fs::read(path)
        .map(Some)
        .map_err(|source| TokenError::KeyRead {
            half,
            path: path.to_path_buf(),
            source,
        })
}
