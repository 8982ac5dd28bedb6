//! Clerk session token verification
//!
//! Session tokens are RS256 JWTs. The signature is checked against the
//! instance's PEM public key (`CLERK_JWT_KEY`), then the user profile is
//! fetched from the Backend API with the secret key. Without a secret key
//! the profile lookup is skipped and the principal carries only the id.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AuthError, IdentityVerifier, Principal};
use crate::config::AuthConfig;

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    primary_email_address_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<ClerkUser> for Principal {
    fn from(user: ClerkUser) -> Self {
        let email = user
            .email_addresses
            .iter()
            .find(|e| user.primary_email_address_id.as_deref() == Some(e.id.as_str()))
            .or_else(|| user.email_addresses.first())
            .map(|e| e.email_address.clone());

        Principal {
            id: user.id,
            email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

pub struct ClerkVerifier {
    decoding_key: Option<DecodingKey>,
    validation: Validation,
    http: reqwest::Client,
    api_url: String,
    secret_key: Option<String>,
}

impl ClerkVerifier {
    /// Builds a verifier from configuration. A missing key is not an error:
    /// the verifier then rejects every token.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let decoding_key = config
            .jwt_key
            .as_deref()
            .map(|pem| {
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::InvalidToken(format!("bad CLERK_JWT_KEY: {e}")))
            })
            .transpose()?;

        if config.secret_key.is_none() {
            warn!("CLERK_SECRET_KEY is not set - user profiles will not be fetched");
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_nbf = true;
        // Session tokens carry `azp`, not `aud`.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            decoding_key,
            validation,
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| AuthError::InvalidToken("no verification key configured".into()))?;

        jsonwebtoken::decode::<SessionClaims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    async fn fetch_user(&self, user_id: &str, secret_key: &str) -> Result<ClerkUser, AuthError> {
        let url = format!("{}/users/{}", self.api_url, user_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Lookup(format!(
                "user lookup returned {}",
                response.status()
            )));
        }

        response
            .json::<ClerkUser>()
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for ClerkVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.decode(token)?;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }

        let Some(secret_key) = self.secret_key.as_deref() else {
            return Ok(Principal {
                id: claims.sub,
                email: None,
                first_name: None,
                last_name: None,
            });
        };

        let user = self.fetch_user(&claims.sub, secret_key).await?;
        debug!(user_id = %user.id, "Fetched identity provider profile");
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/session_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/session_key.pub.pem");
    const FOREIGN_KEY: &str = include_str!("../../tests/fixtures/foreign_key.pem");

    fn sign(private_pem: &str, claims: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap(),
        )
        .unwrap()
    }

    fn verifier() -> ClerkVerifier {
        ClerkVerifier::new(&AuthConfig {
            jwt_key: Some(PUBLIC_KEY.to_string()),
            secret_key: None,
            api_url: "http://127.0.0.1:9".to_string(),
        })
        .unwrap()
    }

    fn exp_in(secs: i64) -> i64 {
        chrono::Utc::now().timestamp() + secs
    }

    #[tokio::test]
    async fn test_valid_token_without_secret_yields_bare_principal() {
        let token = sign(PRIVATE_KEY, json!({"sub": "user_abc", "exp": exp_in(300)}));
        let principal = verifier().verify(&token).await.unwrap();
        assert_eq!(principal.id, "user_abc");
        assert_eq!(principal.email, None);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let token = sign(PRIVATE_KEY, json!({"sub": "user_abc", "exp": exp_in(-3600)}));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let token = sign(FOREIGN_KEY, json!({"sub": "user_abc", "exp": exp_in(300)}));
        assert!(verifier().verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_subject_rejected() {
        let token = sign(PRIVATE_KEY, json!({"exp": exp_in(300)}));
        assert!(verifier().verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        assert!(verifier().verify("not-a-jwt").await.is_err());
    }

    #[tokio::test]
    async fn test_no_key_rejects_everything() {
        let verifier = ClerkVerifier::new(&AuthConfig {
            jwt_key: None,
            secret_key: None,
            api_url: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();
        let token = sign(PRIVATE_KEY, json!({"sub": "user_abc", "exp": exp_in(300)}));
        assert!(verifier.verify(&token).await.is_err());
    }

    #[test]
    fn test_primary_email_selected() {
        let user: ClerkUser = serde_json::from_value(json!({
            "id": "user_1",
            "email_addresses": [
                {"id": "e1", "email_address": "old@example.com"},
                {"id": "e2", "email_address": "main@example.com"}
            ],
            "primary_email_address_id": "e2",
            "first_name": "Ada",
            "last_name": null
        }))
        .unwrap();
        let principal = Principal::from(user);
        assert_eq!(principal.email.as_deref(), Some("main@example.com"));
        assert_eq!(principal.first_name.as_deref(), Some("Ada"));
    }
}
