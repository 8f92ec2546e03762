mod support;

use api::middleware::AuthContext;
use api::jwt::unix_now;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::json;
use support::{expired_token, get, register, request, send, signed_token, test_app};

#[tokio::test]
async fn request_without_headers_is_rejected_with_400() {
    let app = test_app();
    let req = Request::builder().uri("/bets").body(Body::empty()).unwrap();

    let (status, body) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "Bad request, no headers");
}

#[tokio::test]
async fn request_without_bearer_prefix_is_rejected_with_400() {
    let app = test_app();

    let (status, _) = send(&app.router, request(Method::GET, "/bets", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .uri("/bets")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bad request, invalid token");
}

#[tokio::test]
async fn expired_token_is_reported_as_408() {
    let app = test_app();
    let token = expired_token("00000000-0000-0000-0000-000000000000");

    let (status, body) =
        send(&app.router, request(Method::GET, "/bets?type=0", Some(&token), None)).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["code"], 408);
    assert_eq!(body["message"], "Unauthorized, token expired");
}

#[tokio::test]
async fn forged_and_immature_tokens_are_401() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        request(Method::GET, "/bets", Some("not.a.token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let now = unix_now();
    let immature = signed_token("someone", now + 600, now + 3600);
    let (status, body) =
        send(&app.router, request(Method::GET, "/bets", Some(&immature), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized, invalid token");
}

#[tokio::test]
async fn earlier_authorization_in_the_chain_is_reused() {
    let app = test_app();
    let mut req = Request::builder().uri("/bets").body(Body::empty()).unwrap();
    req.extensions_mut().insert(AuthContext {
        authorized: true,
        subject: "00000000-0000-0000-0000-000000000000".to_string(),
        expires_at: unix_now() + 60,
    });

    let (status, body) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], json!([]));
}

#[tokio::test]
async fn stale_authorization_is_verified_again() {
    let app = test_app();
    let mut req = Request::builder().uri("/bets").body(Body::empty()).unwrap();
    req.extensions_mut().insert(AuthContext {
        authorized: true,
        subject: "someone".to_string(),
        expires_at: unix_now().saturating_sub(1),
    });

    let (status, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_and_refresh_issue_working_tokens() {
    let app = test_app();
    register(&app.router, "alice").await;

    let (status, _) = send(
        &app.router,
        request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "alice", "password": "wrong horse"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "alice", "password": "correct horse"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = body["body"]["refreshToken"].as_str().unwrap().to_string();
    let access = body["body"]["accessToken"].as_str().unwrap().to_string();

    // A refresh token does not open protected routes.
    let (status, _) = get(&app.router, "/auth/me", &refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({"refreshToken": refresh})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["body"]["accessToken"].is_string());

    let (status, _) = send(
        &app.router,
        request(Method::POST, "/auth/refresh", None, Some(json!({"refreshToken": access}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app.router, "/auth/me", &access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["username"], "alice");
    assert!(body["body"].get("passwordHash").is_none());
}

#[tokio::test]
async fn invalid_registration_is_a_bad_request() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "username": "bob",
                "password": "has:colon",
                "email": "bob@example.com",
                "name": "Bob B",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app.router,
        request(Method::POST, "/auth/register", None, Some(json!({"username": "bob"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_registrations_of_one_username_yield_one_conflict() {
    let app = test_app();
    let payload = |email: &str| {
        json!({
            "username": "carol",
            "password": "correct horse",
            "email": email,
            "name": "Carol C",
        })
    };

    let first = send(
        &app.router,
        request(Method::POST, "/auth/register", None, Some(payload("carol@example.com"))),
    );
    let second = send(
        &app.router,
        request(Method::POST, "/auth/register", None, Some(payload("carol2@example.com"))),
    );
    let ((first, _), (second, _)) = tokio::join!(first, second);

    let mut statuses = vec![first, second];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
}
