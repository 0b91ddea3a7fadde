use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::{AuthClaims, AuthError, KeySet};

/// Verifies bearer tokens against a fixed key set, issuer and audience.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: KeySet,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: KeySet, issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Self { keys, validation }
    }

    /// Extract the bearer token from request headers and verify it.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<AuthClaims, AuthError> {
        let token = bearer_token(headers)?;
        self.verify(token)
    }

    pub fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidSignature(format!("unable to parse token: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidSignature("token header has no key id".to_string()))?;

        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| AuthError::InvalidSignature(format!("unknown key id '{}'", kid)))?;

        let data = decode::<AuthClaims>(token, key, &self.validation).map_err(classify)?;
        Ok(data.claims)
    }
}

/// Split an `Authorization: Bearer <token>` header into its token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(*token),
        _ => Err(AuthError::MalformedHeader),
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::InvalidClaims("token expired".to_string()),
        ErrorKind::InvalidIssuer => AuthError::InvalidClaims("incorrect issuer".to_string()),
        ErrorKind::InvalidAudience => AuthError::InvalidClaims("incorrect audience".to_string()),
        ErrorKind::ImmatureSignature => AuthError::InvalidClaims("token not yet valid".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::InvalidClaims(format!("missing required claim '{}'", claim))
        }
        // Claims are only deserialized once the signature has checked out
        ErrorKind::Json(source) => {
            tracing::debug!("Token claims did not deserialize: {}", source);
            AuthError::InvalidClaims("malformed claims".to_string())
        }
        _ => AuthError::InvalidSignature(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const ISSUER: &str = "https://issuer.test/";
    const AUDIENCE: &str = "drinks";
    const JWKS: &str = include_str!("../../tests/fixtures/jwks.json");
    const SIGNING_KEY: &[u8] = include_bytes!("../../tests/fixtures/signing_key.pem");
    const FOREIGN_KEY: &[u8] = include_bytes!("../../tests/fixtures/foreign_key.pem");

    fn verifier() -> TokenVerifier {
        let jwks: JwkSet = serde_json::from_str(JWKS).unwrap();
        TokenVerifier::new(KeySet::from_jwks(&jwks).unwrap(), ISSUER, AUDIENCE)
    }

    fn signer(key: &[u8], kid: &str) -> TokenSigner {
        TokenSigner::from_rsa_pem(key, kid, ISSUER, AUDIENCE).unwrap()
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_header_shapes() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token(&headers("Bearer ")), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token(&headers("bearer abc")), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token(&headers("Bearer abc def")), Err(AuthError::MalformedHeader));
    }

    #[test]
    fn accepts_valid_token_and_extracts_permissions() {
        let token = signer(SIGNING_KEY, "test-key")
            .sign("barista", &["get:drinks-detail", "post:drinks"], Duration::hours(1))
            .unwrap();

        let claims = verifier().verify_headers(&headers(&format!("Bearer {}", token))).unwrap();
        assert_eq!(claims.subject(), "barista");
        assert!(claims.has_permission("post:drinks"));
        assert!(!claims.has_permission("delete:drinks"));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = signer(FOREIGN_KEY, "test-key")
            .sign("mallory", &["delete:drinks"], Duration::hours(1))
            .unwrap();
        let err = verifier().verify(&token).unwrap_err();
        assert_eq!(err.code(), "invalid_signature");
    }

    #[test]
    fn unknown_kid_is_a_signature_failure() {
        let token = signer(SIGNING_KEY, "rotated-away")
            .sign("barista", &[], Duration::hours(1))
            .unwrap();
        let err = verifier().verify(&token).unwrap_err();
        assert_eq!(err.code(), "invalid_signature");
    }

    #[test]
    fn garbage_token_is_a_signature_failure() {
        let err = verifier().verify("not-a-jwt").unwrap_err();
        assert_eq!(err.code(), "invalid_signature");
    }

    #[test]
    fn expired_token_fails_claims() {
        let token = signer(SIGNING_KEY, "test-key")
            .sign("barista", &["get:drinks-detail"], Duration::hours(-2))
            .unwrap();
        assert_eq!(
            verifier().verify(&token),
            Err(AuthError::InvalidClaims("token expired".to_string()))
        );
    }

    #[test]
    fn issuer_and_audience_must_match() {
        let wrong_issuer = TokenSigner::from_rsa_pem(SIGNING_KEY, "test-key", "https://elsewhere.test/", AUDIENCE)
            .unwrap()
            .sign("barista", &[], Duration::hours(1))
            .unwrap();
        assert_eq!(
            verifier().verify(&wrong_issuer),
            Err(AuthError::InvalidClaims("incorrect issuer".to_string()))
        );

        let wrong_audience = TokenSigner::from_rsa_pem(SIGNING_KEY, "test-key", ISSUER, "billing")
            .unwrap()
            .sign("barista", &[], Duration::hours(1))
            .unwrap();
        assert_eq!(
            verifier().verify(&wrong_audience),
            Err(AuthError::InvalidClaims("incorrect audience".to_string()))
        );
    }

    #[test]
    fn wrongly_typed_claims_are_a_claims_failure() {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some("test-key".to_string());
        let claims = json!({
            "sub": "barista",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": Utc::now().timestamp() + 3600,
            "permissions": "get:drinks-detail",
        });
        let token = encode(&header, &claims, &EncodingKey::from_rsa_pem(SIGNING_KEY).unwrap()).unwrap();

        let err = verifier().verify(&token).unwrap_err();
        assert_eq!(err, AuthError::InvalidClaims("malformed claims".to_string()));
        assert_eq!(err.code(), "invalid_claims");
        assert!(!err.to_string().contains("expected a sequence"));
    }
}
