use crate::{
    AppState,
    handlers::{clients, projects},
};
use axum::{Router, routing::get};

/// Content Router Module
///
/// Projects and clients: readable by anyone, writable by any authenticated caller.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}/",
            get(projects::get_project)
                .put(projects::update_project)
                .patch(projects::partial_update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/clients/",
            get(clients::list_clients).post(clients::create_client),
        )
        // DELETE also removes the client's projects.
        .route(
            "/clients/{id}/",
            get(clients::get_client)
                .put(clients::update_client)
                .patch(clients::partial_update_client)
                .delete(clients::delete_client),
        )
}
