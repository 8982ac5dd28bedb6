//! Clerk verifier against a mocked Backend API

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use leadbook_server::{
    auth::{AuthError, ClerkVerifier, IdentityVerifier},
    config::AuthConfig,
};

const PRIVATE_KEY: &str = include_str!("fixtures/session_key.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/session_key.pub.pem");
const SECRET_KEY: &str = "sk_test_leadbook";

fn session_token(sub: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 300;
    jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &json!({"sub": sub, "exp": exp, "azp": "http://localhost:3000"}),
        &EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}

fn verifier(api_url: String) -> ClerkVerifier {
    ClerkVerifier::new(&AuthConfig {
        jwt_key: Some(PUBLIC_KEY.to_string()),
        secret_key: Some(SECRET_KEY.to_string()),
        api_url,
    })
    .unwrap()
}

#[tokio::test]
async fn test_profile_is_fetched_with_secret_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/user_abc"))
        .and(header("authorization", format!("Bearer {SECRET_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user_abc",
            "email_addresses": [
                {"id": "idn_1", "email_address": "agent@unite.com"}
            ],
            "primary_email_address_id": "idn_1",
            "first_name": "Priya",
            "last_name": "Patel"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let principal = verifier(server.uri())
        .verify(&session_token("user_abc"))
        .await
        .unwrap();

    assert_eq!(principal.id, "user_abc");
    assert_eq!(principal.email.as_deref(), Some("agent@unite.com"));
    assert_eq!(principal.first_name.as_deref(), Some("Priya"));
    assert_eq!(principal.last_name.as_deref(), Some("Patel"));
}

#[tokio::test]
async fn test_unknown_user_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/user_gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = verifier(server.uri())
        .verify(&session_token("user_gone"))
        .await;

    assert!(matches!(result, Err(AuthError::Lookup(_))));
}

#[tokio::test]
async fn test_bad_signature_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut token = session_token("user_abc");
    token.push('x');

    let result = verifier(server.uri()).verify(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[tokio::test]
async fn test_trailing_slash_in_api_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/user_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user_abc"})))
        .mount(&server)
        .await;

    let principal = verifier(format!("{}/", server.uri()))
        .verify(&session_token("user_abc"))
        .await
        .unwrap();

    assert_eq!(principal.id, "user_abc");
    assert_eq!(principal.email, None);
}
