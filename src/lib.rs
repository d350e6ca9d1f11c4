use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod policy;
pub mod repository;
pub mod storage;
pub mod validation;

pub mod routes;
use routes::{auth as auth_routes, content, dashboard, inbox};

// --- Public Re-exports ---

pub use auth::{JwtTokenIssuer, TokenState};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use notifier::{LogNotifier, MockNotifier, NotifierState, SmtpNotifier};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every endpoint, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::login, handlers::auth::refresh_token,
        handlers::auth::verify,
        handlers::projects::list_projects, handlers::projects::get_project,
        handlers::projects::create_project, handlers::projects::update_project,
        handlers::projects::partial_update_project, handlers::projects::delete_project,
        handlers::clients::list_clients, handlers::clients::get_client,
        handlers::clients::create_client, handlers::clients::update_client,
        handlers::clients::partial_update_client, handlers::clients::delete_client,
        handlers::contacts::list_contacts, handlers::contacts::get_contact,
        handlers::contacts::create_contact, handlers::contacts::update_contact,
        handlers::contacts::partial_update_contact, handlers::contacts::delete_contact,
        handlers::newsletter::list_subscribers, handlers::newsletter::get_subscriber,
        handlers::newsletter::subscribe, handlers::newsletter::update_subscriber,
        handlers::newsletter::partial_update_subscriber, handlers::newsletter::delete_subscriber,
        handlers::newsletter::unsubscribe,
        handlers::uploads::get_presigned_url, handlers::dashboard::get_dashboard_stats
    ),
    components(
        schemas(
            models::Project, models::ProjectRequest, models::ProjectPatch,
            models::Client, models::ClientRequest, models::ClientPatch,
            models::Contact, models::ContactRequest, models::ContactPatch,
            models::NewsletterSubscriber, models::SubscribeRequest, models::SubscriberRequest,
            models::RegisterRequest, models::RegisterResponse, models::LoginRequest,
            models::LoginResponse, models::RefreshRequest, models::AccessTokenResponse,
            models::VerifyResponse, models::TokenPair, models::UserProfile,
            models::MessageResponse, models::DashboardStats, models::UploadFolder,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
        )
    ),
    tags(
        (name = "portfolio-admin", description = "Portfolio Admin API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Every shared service a handler can reach. Cloned per request; each field is a
/// cheap `Arc` handle or small config value.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub tokens: TokenState,
    pub notifier: NotifierState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for NotifierState {
    fn from_ref(app_state: &AppState) -> NotifierState {
        app_state.notifier.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles all route groups, the Swagger UI and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(auth_routes::auth_routes())
        .merge(content::content_routes())
        .merge(inbox::inbox_routes())
        .merge(dashboard::dashboard_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Outermost: every request gets an id before the span opens.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span with method, uri and the `x-request-id`, so every
/// log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
