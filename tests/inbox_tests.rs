mod common;

use axum::http::StatusCode;
use common::TestApp;
use portfolio_admin::{
    MockNotifier, MockStorageService,
    handlers::newsletter::{ALREADY_SUBSCRIBED, SUBSCRIBED, UNSUBSCRIBED},
    repository::Repository,
};
use serde_json::{Value, json};
use tokio::task::JoinSet;
use uuid::Uuid;

fn contact_form() -> Value {
    json!({
        "name": "Jane Visitor",
        "email": "jane@example.com",
        "mobile": "555-0100",
        "city": "Lisbon",
        "subject": "Website quote",
        "message": "Can you build us a site?",
    })
}

// --- Contact Form ---

#[tokio::test]
async fn test_contact_submission_is_stored_and_mailed() {
    let app = TestApp::new();

    let res = app.post("/contact/", None, contact_form()).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["name"], "Jane Visitor");
    assert_eq!(res.body["is_read"], false);
    assert!(res.body["submitted_at"].is_string());

    assert!(app.wait_for_emails(1).await, "notification never sent");
    let email = &app.notifier.sent()[0];
    assert_eq!(email.subject, "New Contact: Website quote");
    assert!(email.body.contains("Name: Jane Visitor"));
    assert!(email.body.contains("Email: jane@example.com"));
    assert!(email.body.contains("Mobile: 555-0100"));
    assert!(email.body.contains("City: Lisbon"));
    assert!(email.body.contains("Message: Can you build us a site?"));
}

#[tokio::test]
async fn test_contact_submission_survives_mailer_failure() {
    let app = TestApp::with_services(MockNotifier::new_failing(), MockStorageService::new());

    let res = app.post("/contact/", None, contact_form()).await;
    assert_eq!(res.status, StatusCode::CREATED);

    let contacts = app.repo.list_contacts().await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].email, "jane@example.com");
}

#[tokio::test]
async fn test_contact_create_ignores_client_supplied_read_flag() {
    let app = TestApp::new();
    let mut form = contact_form();
    form["is_read"] = json!(true);

    let res = app.post("/contact/", None, form).await;

    assert_eq!(res.body["is_read"], false);
}

#[tokio::test]
async fn test_contact_validation() {
    let app = TestApp::new();

    let res = app
        .post("/contact/", None, json!({ "name": "Jane", "email": "jane@", "city": "" }))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["email"][0], "Enter a valid email address.");
    assert_eq!(res.body["mobile"][0], "This field is required.");
    assert_eq!(res.body["city"][0], "This field may not be blank.");
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_dashboard_marks_contact_as_read() {
    let app = TestApp::new();
    let token = app.admin_token();
    let created = app.post("/contact/", None, contact_form()).await;
    let uri = format!("/contact/{}/", created.body["id"].as_str().unwrap());

    let res = app.patch(&uri, Some(&token), json!({ "is_read": true })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["is_read"], true);
    assert_eq!(res.body["submitted_at"], created.body["submitted_at"]);

    let stats = app.get("/dashboard/stats", Some(&token)).await;
    assert_eq!(stats.body["contacts"], 1);
    assert_eq!(stats.body["unread_contacts"], 0);

    let res = app.delete(&uri, Some(&token)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, Some(&token)).await.status, StatusCode::NOT_FOUND);
}

// --- Newsletter ---

#[tokio::test]
async fn test_newsletter_subscription_lifecycle() {
    let app = TestApp::new();
    let email = json!({ "email": "a@b.com" });

    let first = app.post("/newsletter/", None, email.clone()).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body, json!({ "message": SUBSCRIBED }));

    let repeat = app.post("/newsletter/", None, email.clone()).await;
    assert_eq!(repeat.status, StatusCode::BAD_REQUEST);
    assert_eq!(repeat.body, json!({ "email": [ALREADY_SUBSCRIBED] }));

    let subscriber = app.repo.list_subscribers().await.unwrap().remove(0);
    let res = app
        .post(&format!("/newsletter/{}/unsubscribe/", subscriber.id), None, json!({}))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "message": UNSUBSCRIBED }));

    let stored = app.repo.get_subscriber(subscriber.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert!(stored.unsubscribed_at.is_some());

    let again = app.post("/newsletter/", None, email).await;
    assert_eq!(again.status, StatusCode::CREATED);
    assert_eq!(again.body, first.body);

    let stored = app.repo.get_subscriber(subscriber.id).await.unwrap().unwrap();
    assert!(stored.is_active);
    assert_eq!(stored.unsubscribed_at, None);
    assert_eq!(app.repo.list_subscribers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_subscribe_requires_email() {
    let app = TestApp::new();

    let res = app.post("/newsletter/", None, json!({})).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "email": ["This field is required."] }));
}

#[tokio::test]
async fn test_unsubscribe_unknown_id_is_not_found() {
    let app = TestApp::new();

    let res = app
        .post(&format!("/newsletter/{}/unsubscribe/", Uuid::new_v4()), None, json!({}))
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_identical_subscriptions_store_one_record() {
    let app = TestApp::new();
    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let router = app.router.clone();
        tasks.spawn(async move {
            use tower::util::ServiceExt;
            let req = axum::http::Request::builder()
                .method("POST")
                .uri("/newsletter/")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(r#"{"email":"race@example.com"}"#))
                .unwrap();
            router.oneshot(req).await.unwrap().status()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = tasks.join_next().await {
        statuses.push(status.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 15);
    assert_eq!(app.repo.list_subscribers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_put_keeps_unsubscribed_state_consistent() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.post("/newsletter/", None, json!({ "email": "a@b.com" })).await;
    let subscriber = app.repo.list_subscribers().await.unwrap().remove(0);
    app.post(&format!("/newsletter/{}/unsubscribe/", subscriber.id), None, json!({}))
        .await;
    let stopped = app.repo.get_subscriber(subscriber.id).await.unwrap().unwrap();
    let uri = format!("/newsletter/{}/", subscriber.id);

    let renamed = app.put(&uri, Some(&token), json!({ "email": "new@b.com" })).await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["email"], "new@b.com");
    assert_eq!(renamed.body["is_active"], false);
    assert_eq!(
        app.repo.get_subscriber(subscriber.id).await.unwrap().unwrap().unsubscribed_at,
        stopped.unsubscribed_at
    );

    let resumed = app
        .put(&uri, Some(&token), json!({ "email": "new@b.com", "is_active": true }))
        .await;
    assert_eq!(resumed.body["is_active"], true);
    assert_eq!(resumed.body["unsubscribed_at"], Value::Null);

    let paused = app.patch(&uri, Some(&token), json!({ "is_active": false })).await;
    assert_eq!(paused.body["is_active"], false);
    assert!(paused.body["unsubscribed_at"].is_string());

    let stats = app.get("/dashboard/stats", Some(&token)).await;
    assert_eq!(stats.body["active_subscribers"], 0);
}

#[tokio::test]
async fn test_dashboard_manages_subscribers() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.post("/newsletter/", None, json!({ "email": "one@example.com" })).await;
    app.post("/newsletter/", None, json!({ "email": "two@example.com" })).await;

    let list = app.get("/newsletter/", Some(&token)).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body.as_array().unwrap().len(), 2);

    let one = app.repo.list_subscribers().await.unwrap()
        .into_iter()
        .find(|s| s.email == "one@example.com")
        .unwrap();
    let uri = format!("/newsletter/{}/", one.id);

    let clash = app.patch(&uri, Some(&token), json!({ "email": "two@example.com" })).await;
    assert_eq!(clash.status, StatusCode::BAD_REQUEST);
    assert_eq!(clash.body["email"][0], ALREADY_SUBSCRIBED);

    let paused = app.patch(&uri, Some(&token), json!({ "is_active": false })).await;
    assert_eq!(paused.status, StatusCode::OK);
    assert_eq!(paused.body["is_active"], false);
    assert_eq!(paused.body["email"], "one@example.com");

    let stats = app.get("/dashboard/stats", Some(&token)).await;
    assert_eq!(stats.body["active_subscribers"], 1);

    assert_eq!(app.delete(&uri, Some(&token)).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&uri, Some(&token)).await.status, StatusCode::NOT_FOUND);
}
