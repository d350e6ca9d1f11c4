use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Client, ClientInput, Contact, ContactInput, DashboardStats, NewAdmin, NewsletterSubscriber,
    Project, ProjectInput, SubscribeOutcome, SubscriberInput, User,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

pub const REGISTRATION_CLOSED: &str =
    "Permission denied. Only existing superusers can create new admin accounts.";

/// Repository Trait
///
/// The persistence contract behind every handler. Implementations must keep the
/// store-level guarantees the handlers rely on:
/// - `create_admin` decides bootstrap-vs-superuser and inserts atomically.
/// - `subscribe` is a single get-or-create against the unique email.
/// - deleting a client deletes its projects.
///
/// `update_*` and `delete_*` return `None`/`false` for an unknown id.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn admin_exists(&self) -> AppResult<bool>;
    async fn username_taken(&self, username: &str) -> AppResult<bool>;
    async fn email_taken(&self, email: &str) -> AppResult<bool>;
    /// Inserts an admin+staff user. When at least one admin already exists the
    /// insert only proceeds if `caller_is_superuser`, otherwise `PermissionDenied`.
    /// The admin count and the insert happen under one lock/transaction.
    async fn create_admin(&self, admin: NewAdmin, caller_is_superuser: bool) -> AppResult<User>;

    // --- Projects ---
    async fn list_projects(&self) -> AppResult<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> AppResult<Option<Project>>;
    async fn create_project(&self, input: ProjectInput) -> AppResult<Project>;
    async fn update_project(&self, id: Uuid, input: ProjectInput) -> AppResult<Option<Project>>;
    async fn delete_project(&self, id: Uuid) -> AppResult<bool>;

    // --- Clients ---
    async fn list_clients(&self) -> AppResult<Vec<Client>>;
    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>>;
    async fn create_client(&self, input: ClientInput) -> AppResult<Client>;
    async fn update_client(&self, id: Uuid, input: ClientInput) -> AppResult<Option<Client>>;
    /// Cascades to the client's projects.
    async fn delete_client(&self, id: Uuid) -> AppResult<bool>;

    // --- Contacts ---
    async fn list_contacts(&self) -> AppResult<Vec<Contact>>;
    async fn get_contact(&self, id: Uuid) -> AppResult<Option<Contact>>;
    async fn create_contact(&self, input: ContactInput) -> AppResult<Contact>;
    async fn update_contact(&self, id: Uuid, input: ContactInput) -> AppResult<Option<Contact>>;
    async fn delete_contact(&self, id: Uuid) -> AppResult<bool>;

    // --- Newsletter ---
    async fn list_subscribers(&self) -> AppResult<Vec<NewsletterSubscriber>>;
    async fn get_subscriber(&self, id: Uuid) -> AppResult<Option<NewsletterSubscriber>>;
    async fn subscribe(&self, email: &str) -> AppResult<SubscribeOutcome>;
    async fn update_subscriber(
        &self,
        id: Uuid,
        input: SubscriberInput,
    ) -> AppResult<Option<NewsletterSubscriber>>;
    async fn unsubscribe(&self, id: Uuid) -> AppResult<Option<NewsletterSubscriber>>;
    async fn delete_subscriber(&self, id: Uuid) -> AppResult<bool>;

    // --- Dashboard ---
    async fn get_stats(&self) -> AppResult<DashboardStats>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
