#![allow(dead_code)]

use std::sync::Arc;

use api::{
    AppState,
    broadcaster::Broadcaster,
    create_router,
    jwt::{Claims, DEFAULT_ISSUER, JwtConfig, JwtService, TokenType, unix_now},
    repositories::{BetRepository, InMemoryBetRepository, InMemoryUserRepository},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: SECRET.to_string(),
        issuer: DEFAULT_ISSUER.to_string(),
        access_token_expiry: 86400,
    })
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_app() -> TestApp {
    test_app_with(Arc::new(InMemoryBetRepository::new()))
}

pub fn test_app_with(bet_repository: Arc<dyn BetRepository>) -> TestApp {
    let state = AppState::new(
        jwt_service(),
        Arc::new(InMemoryUserRepository::new()),
        bet_repository,
        Arc::new(Broadcaster::new(8)),
    );
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

/// Sign arbitrary access claims with the test secret
pub fn signed_token(subject: &str, nbf: u64, exp: u64) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        iat: nbf,
        nbf,
        exp,
        iss: DEFAULT_ISSUER.to_string(),
        token_type: TokenType::Access,
    };
    encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn expired_token(subject: &str) -> String {
    let now = unix_now();
    signed_token(subject, now - 7200, now - 3600)
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Authenticated GET
pub async fn get(router: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(router, request(Method::GET, uri, Some(token), None)).await
}

/// Register `username` and return its access token
pub async fn register(router: &Router, username: &str) -> String {
    let (status, body) = send(
        router,
        request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "username": username,
                "password": "correct horse",
                "email": format!("{username}@example.com"),
                "name": format!("{username} tester"),
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["body"]["accessToken"].as_str().unwrap().to_string()
}

pub fn rain_bet() -> Value {
    json!({
        "name": "Will it rain",
        "description": "Rain in Douala tomorrow",
        "betOptions": ["yes", "nope"],
        "inputOption": "yes",
        "inputBet": 10.0,
        "endsAt": (Utc::now() + Duration::days(1)).to_rfc3339(),
    })
}
