use crate::{
    AppState,
    handlers::{contacts, newsletter},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Inbox Router Module
///
/// Visitor submissions. Only the create endpoints and unsubscribe are open; the
/// dashboard reads and manages everything else.
pub fn inbox_routes() -> Router<AppState> {
    Router::new()
        // POST /contact/ is public and triggers the admin email.
        .route(
            "/contact/",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/contact/{id}/",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .patch(contacts::partial_update_contact)
                .delete(contacts::delete_contact),
        )
        // POST /newsletter/ is public and idempotent by email.
        .route(
            "/newsletter/",
            get(newsletter::list_subscribers).post(newsletter::subscribe),
        )
        .route(
            "/newsletter/{id}/",
            get(newsletter::get_subscriber)
                .put(newsletter::update_subscriber)
                .patch(newsletter::partial_update_subscriber)
                .delete(newsletter::delete_subscriber),
        )
        // POST /newsletter/{id}/unsubscribe/
        // Public, so it can sit behind a link in outgoing mail.
        .route(
            "/newsletter/{id}/unsubscribe/",
            post(newsletter::unsubscribe),
        )
}
