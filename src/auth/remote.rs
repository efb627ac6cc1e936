use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{AuthError, Identity, TokenVerifier, VerifiedClaims};

/// Where the trusted issuer publishes its signing keys
#[async_trait]
pub trait JwksSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// Fetches the key set over HTTPS
pub struct HttpJwksSource {
    client: reqwest::Client,
    uri: String,
}

impl HttpJwksSource {
    pub fn new(uri: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            uri: uri.into(),
        })
    }
}

#[async_trait]
impl JwksSource for HttpJwksSource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("malformed key set: {}", e)))
    }
}

/// Claims we read from an externally issued token
#[derive(Debug, Deserialize)]
struct FederatedClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

/// Verifies RS256 tokens from an external issuer.
///
/// Keys are cached by `kid`. An unknown `kid` triggers a refetch, so rotated
/// keys are picked up without a restart; refetches are serialized and capped
/// at `requests_per_minute`.
pub struct RemoteVerifier {
    source: Arc<dyn JwksSource>,
    keys: RwLock<HashMap<String, DecodingKey>>,
    refresh: Mutex<()>,
    limiter: DefaultDirectRateLimiter,
    validation: Validation,
}

impl RemoteVerifier {
    pub fn new(
        source: Arc<dyn JwksSource>,
        audience: &str,
        issuer: &str,
        requests_per_minute: u32,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&[issuer]);

        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            source,
            keys: RwLock::new(HashMap::new()),
            refresh: Mutex::new(()),
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            validation,
        }
    }

    /// Replaces the cached key set. Counts against the fetch budget.
    pub async fn refresh_keys(&self) -> Result<usize, AuthError> {
        let _guard = self.refresh.lock().await;
        self.fetch_locked().await
    }

    async fn fetch_locked(&self) -> Result<usize, AuthError> {
        if self.limiter.check().is_err() {
            return Err(AuthError::KeyUnavailable(
                "key fetch limit reached, try again shortly".to_string(),
            ));
        }

        let set = self.source.fetch().await?;
        let mut fresh = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    fresh.insert(kid, key);
                }
                Err(e) => warn!("Skipping unusable signing key '{}': {}", kid, e),
            }
        }

        let count = fresh.len();
        *self.keys.write().await = fresh;
        info!("Loaded {} signing keys from issuer", count);
        Ok(count)
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        let _guard = self.refresh.lock().await;
        // Another request may have refreshed while we waited
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        debug!("Signing key '{}' not cached, refreshing key set", kid);
        self.fetch_locked().await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key '{}'", kid)))
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;

        let key = self.key_for(&kid).await?;
        let claims = decode::<FederatedClaims>(token, &key, &self.validation)?.claims;

        Ok(VerifiedClaims {
            identity: Identity::Federated(claims.sub),
            email: claims.email.unwrap_or_default(),
            name: claims.name.unwrap_or_default(),
            admin: claims.admin,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PRIVATE_KEY: &[u8] = include_bytes!("../../tests/fixtures/rs256_private.pem");
    const MODULUS: &str = "nMVe2RXfnw6Yk_zYF9ycyGXdoS8-S4822FKyhF4TeKHfw-sBepdWd9CARG59-wMwiV9qgUjrRlBMEIs9VajtURnjuV-YUE8_eYIRhIydxdT0HUqFnagOJ7qlxj6-zjE_h7409vI2wHvTXZQZ_gHE93jFRzv_GnuDHlLyQx7UMopZlynyAwLMBmUT-zVaEAVF-hSqQbEIh5-7vajsQr5J4xbIJS7fJCXR7oQEIHNy_QNULAQTlj8oueADJV9oY4Ue6SdIYYbnZ-fwGqnLEMLlWkPG87TF9xcND7GphydSdZUjOQnSq7hrno4sAGuwkK5wCC8TAU2c32PTpf3OZ6nnEw";
    const AUDIENCE: &str = "https://songbook.example/api";
    const ISSUER: &str = "https://issuer.example/";

    /// Serves whichever key ids are currently published and counts fetches.
    struct StaticSource {
        kids: std::sync::Mutex<Vec<&'static str>>,
        fetches: AtomicUsize,
    }

    impl StaticSource {
        fn new(kids: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                kids: std::sync::Mutex::new(kids),
                fetches: AtomicUsize::new(0),
            })
        }

        fn publish(&self, kids: Vec<&'static str>) {
            *self.kids.lock().unwrap() = kids;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JwksSource for StaticSource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let keys: Vec<_> = self
                .kids
                .lock()
                .unwrap()
                .iter()
                .map(|kid| {
                    json!({ "kty": "RSA", "kid": kid, "use": "sig", "alg": "RS256", "n": MODULUS, "e": "AQAB" })
                })
                .collect();
            Ok(serde_json::from_value(json!({ "keys": keys })).unwrap())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl JwksSource for FailingSource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Err(AuthError::KeyUnavailable("connection refused".to_string()))
        }
    }

    fn sign(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims(aud: &str, iss: &str, exp_offset: i64) -> serde_json::Value {
        let now = Utc::now().timestamp();
        json!({
            "sub": "auth0|user-42",
            "email": "fed@x.com",
            "aud": aud,
            "iss": iss,
            "iat": now,
            "exp": now + exp_offset,
        })
    }

    fn verifier(source: Arc<dyn JwksSource>, per_minute: u32) -> RemoteVerifier {
        RemoteVerifier::new(source, AUDIENCE, ISSUER, per_minute)
    }

    #[tokio::test]
    async fn accepts_token_signed_by_published_key() {
        let source = StaticSource::new(vec!["key-1"]);
        let verifier = verifier(source.clone(), 5);

        let token = sign("key-1", claims(AUDIENCE, ISSUER, 3600));
        let verified = verifier.verify(&token).await.unwrap();

        assert_eq!(verified.identity, Identity::Federated("auth0|user-42".into()));
        assert_eq!(verified.email, "fed@x.com");
        assert!(!verified.admin);

        // Second verification is served from cache
        verifier.verify(&token).await.unwrap();
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn rejects_wrong_audience_and_issuer() {
        let verifier = verifier(StaticSource::new(vec!["key-1"]), 5);

        let wrong_aud = sign("key-1", claims("https://elsewhere.example/api", ISSUER, 3600));
        assert!(matches!(
            verifier.verify(&wrong_aud).await,
            Err(AuthError::InvalidToken(_))
        ));

        let wrong_iss = sign("key-1", claims(AUDIENCE, "https://evil.example/", 3600));
        assert!(matches!(
            verifier.verify(&wrong_iss).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let verifier = verifier(StaticSource::new(vec!["key-1"]), 5);
        let token = sign("key-1", claims(AUDIENCE, ISSUER, -3600));
        assert!(verifier.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn picks_up_rotated_key() {
        let source = StaticSource::new(vec!["key-1"]);
        let verifier = verifier(source.clone(), 5);

        verifier
            .verify(&sign("key-1", claims(AUDIENCE, ISSUER, 3600)))
            .await
            .unwrap();

        source.publish(vec!["key-2"]);
        let rotated = sign("key-2", claims(AUDIENCE, ISSUER, 3600));
        verifier.verify(&rotated).await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn unknown_key_fetches_are_capped() {
        let source = StaticSource::new(vec!["key-1"]);
        let verifier = verifier(source.clone(), 2);
        let token = sign("missing", claims(AUDIENCE, ISSUER, 3600));

        for _ in 0..6 {
            assert!(verifier.verify(&token).await.is_err());
        }
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_a_verification_failure() {
        let verifier = verifier(Arc::new(FailingSource), 5);
        let token = sign("key-1", claims(AUDIENCE, ISSUER, 3600));

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::KeyUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn rejects_symmetric_tokens() {
        let verifier = verifier(StaticSource::new(vec!["key-1"]), 5);
        let mut header = Header::default();
        header.kid = Some("key-1".to_string());
        let token = encode(
            &header,
            &claims(AUDIENCE, ISSUER, 3600),
            &EncodingKey::from_secret(b"guess"),
        )
        .unwrap();

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
