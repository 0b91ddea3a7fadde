use std::collections::HashMap;
use std::path::PathBuf;

use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::DecodingKey;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::JwksSource;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("failed to read key set from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("key set is not a valid JWKS document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("key '{kid}' is unusable: {source}")]
    InvalidKey {
        kid: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("key '{0}' is symmetric, only public keys are accepted")]
    SymmetricKey(String),

    #[error("key set contains no usable keys")]
    Empty,
}

/// Fixed set of public verification keys indexed by key id.
#[derive(Clone)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Load the key set once from a JWKS file or endpoint.
    pub async fn load(source: &JwksSource) -> Result<Self, KeySetError> {
        let jwks: JwkSet = match source {
            JwksSource::File(path) => {
                let raw = tokio::fs::read(path).await.map_err(|source| KeySetError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_slice(&raw)?
            }
            JwksSource::Url(url) => {
                reqwest::get(url.clone())
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
        };

        let keys = Self::from_jwks(&jwks)?;
        info!("Loaded {} token verification key(s)", keys.keys.len());
        Ok(keys)
    }

    pub fn from_jwks(jwks: &JwkSet) -> Result<Self, KeySetError> {
        let mut keys = HashMap::new();

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("Skipping JWKS entry without a key id");
                continue;
            };

            if matches!(jwk.algorithm, AlgorithmParameters::OctetKey(_)) {
                return Err(KeySetError::SymmetricKey(kid));
            }

            let key = DecodingKey::from_jwk(jwk).map_err(|source| KeySetError::InvalidKey {
                kid: kid.clone(),
                source,
            })?;
            keys.insert(kid, key);
        }

        if keys.is_empty() {
            return Err(KeySetError::Empty);
        }

        Ok(Self { keys })
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kids: Vec<&String> = self.keys.keys().collect();
        kids.sort();
        f.debug_struct("KeySet").field("kids", &kids).finish()
    }
}
