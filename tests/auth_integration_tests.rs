mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp, user};
use portfolio_admin::{
    auth::TokenIssuer,
    handlers::auth::{
        EMAIL_TAKEN, INVALID_LOGIN, PASSWORD_MISMATCH, PASSWORD_TOO_SHORT, USERNAME_TAKEN,
    },
    repository::{REGISTRATION_CLOSED, Repository},
};
use serde_json::{Value, json};

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
        "confirm_password": PASSWORD,
    })
}

// --- Registration ---

#[tokio::test]
async fn test_bootstrap_registration_creates_the_first_admin() {
    let app = TestApp::new();

    let res = app.post("/auth/register/", None, registration("first")).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["username"], "first");
    assert_eq!(res.body["email"], "first@example.com");
    assert_eq!(res.body["is_admin"], true);
    assert!(res.body["token"]["access"].is_string());
    assert!(res.body["token"]["refresh"].is_string());
    assert!(res.body.get("password").is_none());

    let stored = app.repo.get_user_by_username("first").await.unwrap().unwrap();
    assert!(stored.is_admin && stored.is_staff && !stored.is_superuser);
    assert_ne!(stored.password_hash, PASSWORD);
}

#[tokio::test]
async fn test_second_anonymous_registration_is_forbidden() {
    let app = TestApp::new();
    app.post("/auth/register/", None, registration("first")).await;

    let res = app.post("/auth/register/", None, registration("second")).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], REGISTRATION_CLOSED);
    assert!(app.repo.get_user_by_username("second").await.unwrap().is_none());
}

#[tokio::test]
async fn test_non_superuser_admin_cannot_register_more_admins() {
    let app = TestApp::new();
    let admin_token = app.admin_token();

    let res = app.post("/auth/register/", Some(&admin_token), registration("second")).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_superuser_can_register_additional_admins() {
    let app = TestApp::new();
    app.admin_token();
    let (_, root_token) = app.seed_user("root", true, true);

    let res = app.post("/auth/register/", Some(&root_token), registration("second")).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["is_admin"], true);
}

#[tokio::test]
async fn test_registration_closed_is_checked_before_the_body() {
    let app = TestApp::new();
    app.admin_token();

    let res = app.post("/auth/register/", None, json!({})).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration_field_errors() {
    let app = TestApp::new();

    let res = app
        .post(
            "/auth/register/",
            None,
            json!({ "username": "bad name!", "email": "nope", "password": "123" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["username"].is_array());
    assert_eq!(res.body["email"][0], "Enter a valid email address.");
    assert_eq!(res.body["password"][0], PASSWORD_TOO_SHORT);
    assert_eq!(res.body["confirm_password"][0], "This field is required.");
}

#[tokio::test]
async fn test_registration_password_mismatch() {
    let app = TestApp::new();
    let mut body = registration("first");
    body["confirm_password"] = json!("something-else");

    let res = app.post("/auth/register/", None, body).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "confirm_password": [PASSWORD_MISMATCH] }));
}

#[tokio::test]
async fn test_registration_rejects_taken_username_and_email() {
    let app = TestApp::new();
    let (_, root_token) = app.seed_user("root", true, true);

    let res = app.post("/auth/register/", Some(&root_token), registration("root")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "username": [USERNAME_TAKEN] }));

    let mut body = registration("fresh");
    body["email"] = json!("root@example.com");
    let res = app.post("/auth/register/", Some(&root_token), body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "email": [EMAIL_TAKEN] }));
}

#[tokio::test]
async fn test_concurrent_bootstrap_registrations_yield_one_admin() {
    let app = TestApp::new();
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..4 {
        let router = app.router.clone();
        tasks.spawn(async move {
            use tower::util::ServiceExt;
            let req = axum::http::Request::builder()
                .method("POST")
                .uri("/auth/register/")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(registration(&format!("racer{i}")).to_string()))
                .unwrap();
            router.oneshot(req).await.unwrap().status()
        });
    }

    let mut created = 0;
    while let Some(status) = tasks.join_next().await {
        let status = status.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }
    assert_eq!(created, 1);
}

// --- Login ---

#[tokio::test]
async fn test_login_returns_profile_and_tokens() {
    let app = TestApp::new();
    let (owner, _) = app.seed_user("owner", true, false);

    let res = app
        .post("/auth/login/", None, json!({ "username": "owner", "password": PASSWORD }))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["id"], owner.id.to_string());
    assert_eq!(res.body["user"]["username"], "owner");
    assert_eq!(res.body["user"]["is_admin"], true);
    assert!(res.body["user"].get("password_hash").is_none());

    let access = res.body["access"].as_str().unwrap();
    assert_eq!(app.tokens.verify_access(access).unwrap().sub, owner.id);
}

#[tokio::test]
async fn test_non_admin_login_looks_like_wrong_password() {
    let app = TestApp::new();
    app.seed_user("owner", true, false);
    app.seed_user("visitor", false, false);

    let wrong_password = app
        .post("/auth/login/", None, json!({ "username": "owner", "password": "wrong-pass" }))
        .await;
    let non_admin = app
        .post("/auth/login/", None, json!({ "username": "visitor", "password": PASSWORD }))
        .await;
    let unknown = app
        .post("/auth/login/", None, json!({ "username": "ghost", "password": PASSWORD }))
        .await;

    for res in [&wrong_password, &non_admin, &unknown] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body, json!({ "error": INVALID_LOGIN }));
    }
}

#[tokio::test]
async fn test_unreadable_stored_hash_is_a_plain_login_failure() {
    let app = TestApp::new();
    let mut broken = user("broken", true, false);
    broken.password_hash = "not-a-phc-string".into();
    app.repo.insert_user(broken).unwrap();

    let res = app
        .post("/auth/login/", None, json!({ "username": "broken", "password": PASSWORD }))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "error": INVALID_LOGIN }));
}

#[tokio::test]
async fn test_inactive_admin_cannot_login() {
    let app = TestApp::new();
    let mut disabled = user("disabled", true, false);
    disabled.is_active = false;
    app.repo.insert_user(disabled).unwrap();

    let res = app
        .post("/auth/login/", None, json!({ "username": "disabled", "password": PASSWORD }))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// --- Tokens & Principal Resolution ---

#[tokio::test]
async fn test_refresh_issues_a_working_access_token() {
    let app = TestApp::new();
    let (owner, _) = app.seed_user("owner", true, false);
    let pair = app.tokens.issue(&owner).unwrap();

    let res = app
        .post("/auth/token/refresh/", None, json!({ "refresh": pair.refresh }))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let access = res.body["access"].as_str().unwrap().to_string();
    let verify = app.get("/auth/verify/", Some(&access)).await;
    assert_eq!(verify.status, StatusCode::OK);
    assert_eq!(verify.body["user"]["username"], "owner");
}

#[tokio::test]
async fn test_refresh_rejects_access_tokens() {
    let app = TestApp::new();
    let token = app.admin_token();

    let res = app.post("/auth/token/refresh/", None, json!({ "refresh": token })).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_requires_a_token() {
    let app = TestApp::new();

    let res = app.get("/auth/verify/", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected_even_on_open_endpoints() {
    let app = TestApp::new();

    let res = app.get("/projects/", Some("not-a-jwt")).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Given token not valid for any token type");
}

#[tokio::test]
async fn test_token_of_deactivated_user_is_rejected() {
    let app = TestApp::new();
    let mut gone = user("gone", true, false);
    gone.is_active = false;
    app.repo.insert_user(gone.clone()).unwrap();
    let token = app.tokens.issue(&gone).unwrap().access;

    let res = app.get("/contact/", Some(&token)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let app = TestApp::new();
    let stranger = user("stranger", true, false);
    let token = app.tokens.issue(&stranger).unwrap().access;

    let res = app.get("/auth/verify/", Some(&token)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
