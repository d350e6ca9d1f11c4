//! Handlers invoked directly, without the router: extractors are built by hand so
//! the policy and body-handling order can be checked in isolation.

mod common;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use common::TestApp;
use portfolio_admin::{
    AppError,
    auth::{AuthUser, Principal},
    error::JsonBody,
    handlers::{clients, contacts, dashboard, newsletter, projects},
    models::{
        ClientPatch, ClientRequest, ContactPatch, ContactRequest, ProjectRequest, SubscribeRequest,
    },
    repository::Repository,
};
use uuid::Uuid;

fn signed_in() -> Principal {
    Principal::Authenticated(AuthUser {
        id: Uuid::new_v4(),
        username: "owner".into(),
        is_admin: true,
        is_superuser: false,
    })
}

fn body<T>(value: T) -> Result<JsonBody<T>, AppError> {
    Ok(JsonBody(value))
}

fn client_request(name: &str) -> ClientRequest {
    ClientRequest { name: Some(name.into()), ..ClientRequest::default() }
}

#[tokio::test]
async fn test_policy_runs_before_body_errors() {
    let app = TestApp::new();

    let broken: Result<JsonBody<ProjectRequest>, AppError> =
        Err(AppError::Internal("body never read".into()));
    let err = projects::create_project(Principal::Anonymous, State(app.state.clone()), broken)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Authentication(_)));
}

#[tokio::test]
async fn test_create_client_returns_created_record() {
    let app = TestApp::new();

    let (status, Json(client)) =
        clients::create_client(signed_in(), State(app.state.clone()), body(client_request("Acme")))
            .await
            .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(client.name, "Acme");
    assert_eq!(client.designation, "Client");
    assert_eq!(app.repo.get_client(client.id).await.unwrap(), Some(client));
}

#[tokio::test]
async fn test_update_missing_client_is_not_found_before_validation() {
    let app = TestApp::new();

    let err = clients::update_client(
        signed_in(),
        State(app.state.clone()),
        Path(Uuid::new_v4().to_string()),
        body(ClientPatch::default()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn test_delete_client_reports_missing_record() {
    let app = TestApp::new();

    let err = clients::delete_client(signed_in(), State(app.state.clone()), Path("nope".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn test_contact_patch_only_touches_read_flag() {
    let app = TestApp::new();
    let (_, Json(contact)) = contacts::create_contact(
        Principal::Anonymous,
        State(app.state.clone()),
        body(ContactRequest {
            name: Some("Jane".into()),
            email: Some("jane@example.com".into()),
            mobile: Some("555".into()),
            city: Some("Porto".into()),
            subject: None,
            message: Some("Hi".into()),
            is_read: None,
        }),
    )
    .await
    .unwrap();

    let Json(updated) = contacts::partial_update_contact(
        signed_in(),
        State(app.state.clone()),
        Path(contact.id.to_string()),
        body(ContactPatch { is_read: Some(true), ..ContactPatch::default() }),
    )
    .await
    .unwrap();

    assert!(updated.is_read);
    assert_eq!(updated.message, contact.message);
    assert_eq!(updated.subject, None);
    assert_eq!(updated.submitted_at, contact.submitted_at);
}

#[tokio::test]
async fn test_contact_put_keeps_omitted_optional_fields() {
    let app = TestApp::new();
    let form = ContactRequest {
        name: Some("Jane".into()),
        email: Some("jane@example.com".into()),
        mobile: Some("555".into()),
        city: Some("Porto".into()),
        subject: Some("Quote".into()),
        message: Some("Hi".into()),
        is_read: None,
    };
    let (_, Json(contact)) =
        contacts::create_contact(Principal::Anonymous, State(app.state.clone()), body(form))
            .await
            .unwrap();
    let id = contact.id.to_string();

    contacts::partial_update_contact(
        signed_in(),
        State(app.state.clone()),
        Path(id.clone()),
        body(ContactPatch { is_read: Some(true), ..ContactPatch::default() }),
    )
    .await
    .unwrap();

    let Json(replaced) = contacts::update_contact(
        signed_in(),
        State(app.state.clone()),
        Path(id),
        body(ContactPatch {
            name: Some("Jane".into()),
            email: Some("jane@example.com".into()),
            mobile: Some("555".into()),
            city: Some("Braga".into()),
            ..ContactPatch::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(replaced.city, "Braga");
    assert!(replaced.is_read);
    assert_eq!(replaced.subject.as_deref(), Some("Quote"));
    assert_eq!(replaced.message.as_deref(), Some("Hi"));
}

#[tokio::test]
async fn test_subscribe_reports_already_active_as_field_error() {
    let app = TestApp::new();
    let request = || body(SubscribeRequest { email: Some("a@b.com".into()) });

    let (status, _) = newsletter::subscribe(Principal::Anonymous, State(app.state.clone()), request())
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let err = newsletter::subscribe(Principal::Anonymous, State(app.state.clone()), request())
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert_eq!(errors.messages("email"), [newsletter::ALREADY_SUBSCRIBED]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unsubscribe_needs_no_identity() {
    let app = TestApp::new();
    newsletter::subscribe(
        Principal::Anonymous,
        State(app.state.clone()),
        body(SubscribeRequest { email: Some("a@b.com".into()) }),
    )
    .await
    .unwrap();
    let subscriber = app.repo.list_subscribers().await.unwrap().remove(0);

    let Json(message) = newsletter::unsubscribe(
        Principal::Anonymous,
        State(app.state.clone()),
        Path(subscriber.id.to_string()),
    )
    .await
    .unwrap();

    assert_eq!(message.message, newsletter::UNSUBSCRIBED);
}

#[tokio::test]
async fn test_dashboard_stats_on_empty_store() {
    let app = TestApp::new();
    let user = AuthUser { id: Uuid::new_v4(), username: "owner".into(), is_admin: true, is_superuser: false };

    let Json(stats) = dashboard::get_dashboard_stats(user, State(app.state.clone()))
        .await
        .unwrap();

    assert_eq!(stats, Default::default());
}
