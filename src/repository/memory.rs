use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{REGISTRATION_CLOSED, Repository};
use crate::error::{
    ALREADY_SUBSCRIBED, AppError, AppResult, EMAIL_TAKEN, FieldErrors, UNKNOWN_CLIENT, USERNAME_TAKEN,
};
use crate::models::{
    Client, ClientInput, Contact, ContactInput, DashboardStats, NewAdmin, NewsletterSubscriber,
    Project, ProjectInput, SubscribeOutcome, SubscriberInput, User,
};

#[derive(Default)]
struct Store {
    users: Vec<User>,
    clients: Vec<Client>,
    projects: Vec<Project>,
    contacts: Vec<Contact>,
    subscribers: Vec<NewsletterSubscriber>,
}

/// InMemoryRepository
///
/// A process-local `Repository` with the same observable semantics as
/// `PostgresRepository`: unique usernames/emails, cascade from clients to
/// projects, and atomic registration/subscription. Every operation runs under a
/// single mutex, which plays the role of the store's transaction isolation.
///
/// Used by the test suite and for running the API without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user row as-is. Stands in for accounts provisioned outside the
    /// API (superusers, disabled or non-admin accounts).
    pub fn insert_user(&self, user: User) -> AppResult<()> {
        let mut store = self.lock()?;
        if store.users.iter().any(|u| u.username == user.username) {
            return Err(FieldErrors::single("username", USERNAME_TAKEN).into());
        }
        store.users.push(user);
        Ok(())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }
}

impl Store {
    fn client_name(&self, client_id: Option<Uuid>) -> Option<String> {
        let id = client_id?;
        self.clients.iter().find(|c| c.id == id).map(|c| c.name.clone())
    }

    fn ensure_client(&self, client_id: Option<Uuid>) -> AppResult<()> {
        match client_id {
            Some(id) if !self.clients.iter().any(|c| c.id == id) => {
                Err(FieldErrors::single("client", UNKNOWN_CLIENT).into())
            }
            _ => Ok(()),
        }
    }

    fn with_client_name(&self, mut project: Project) -> Project {
        project.client_name = self.client_name(project.client_id);
        project
    }

    fn ensure_subscriber_email_free(&self, email: &str, except: Uuid) -> AppResult<()> {
        if self.subscribers.iter().any(|s| s.email == email && s.id != except) {
            return Err(FieldErrors::single("email", ALREADY_SUBSCRIBED).into());
        }
        Ok(())
    }
}

/// Newest first, matching `ORDER BY <timestamp> DESC`.
fn newest_first<T: Clone, K: Ord>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.username == username).cloned())
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        Ok(self.lock()?.users.iter().any(|u| u.is_admin))
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Ok(self.lock()?.users.iter().any(|u| u.username == username))
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Ok(self.lock()?.users.iter().any(|u| u.email == email))
    }

    async fn create_admin(&self, admin: NewAdmin, caller_is_superuser: bool) -> AppResult<User> {
        let mut store = self.lock()?;

        let admin_exists = store.users.iter().any(|u| u.is_admin);
        if admin_exists && !caller_is_superuser {
            return Err(AppError::PermissionDenied(REGISTRATION_CLOSED.to_string()));
        }
        if store.users.iter().any(|u| u.username == admin.username) {
            return Err(FieldErrors::single("username", USERNAME_TAKEN).into());
        }
        if store.users.iter().any(|u| u.email == admin.email) {
            return Err(FieldErrors::single("email", EMAIL_TAKEN).into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: admin.username,
            email: admin.email,
            password_hash: admin.password_hash,
            first_name: String::new(),
            last_name: String::new(),
            is_admin: true,
            is_staff: true,
            is_superuser: false,
            is_active: true,
            date_joined: now,
            created_at: now,
            updated_at: now,
        };
        store.users.push(user.clone());

        tracing::info!(user_id = %user.id, bootstrap = !admin_exists, "admin account created");
        Ok(user)
    }

    // --- PROJECTS ---

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let store = self.lock()?;
        Ok(store
            .projects
            .iter()
            .cloned()
            .map(|p| store.with_client_name(p))
            .collect())
    }

    async fn get_project(&self, id: Uuid) -> AppResult<Option<Project>> {
        let store = self.lock()?;
        Ok(store
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .map(|p| store.with_client_name(p)))
    }

    async fn create_project(&self, input: ProjectInput) -> AppResult<Project> {
        let mut store = self.lock()?;
        store.ensure_client(input.client_id)?;
        let project = Project {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            image: input.image,
            link: input.link,
            client_id: input.client_id,
            client_name: None,
            created_at: Utc::now(),
        };
        store.projects.push(project.clone());
        Ok(store.with_client_name(project))
    }

    async fn update_project(&self, id: Uuid, input: ProjectInput) -> AppResult<Option<Project>> {
        let mut store = self.lock()?;
        store.ensure_client(input.client_id)?;
        let Some(project) = store.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.title = input.title;
        project.description = input.description;
        project.image = input.image;
        project.link = input.link;
        project.client_id = input.client_id;
        let updated = project.clone();
        Ok(Some(store.with_client_name(updated)))
    }

    async fn delete_project(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.lock()?;
        let before = store.projects.len();
        store.projects.retain(|p| p.id != id);
        Ok(store.projects.len() < before)
    }

    // --- CLIENTS ---

    async fn list_clients(&self) -> AppResult<Vec<Client>> {
        Ok(newest_first(&self.lock()?.clients, |c| c.created_at))
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        Ok(self.lock()?.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn create_client(&self, input: ClientInput) -> AppResult<Client> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name: input.name,
            image: input.image,
            designation: input.designation,
            description: input.description,
            website: input.website,
            created_at: now,
            updated_at: now,
        };
        self.lock()?.clients.push(client.clone());
        Ok(client)
    }

    async fn update_client(&self, id: Uuid, input: ClientInput) -> AppResult<Option<Client>> {
        let mut store = self.lock()?;
        let Some(client) = store.clients.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        client.name = input.name;
        client.image = input.image;
        client.designation = input.designation;
        client.description = input.description;
        client.website = input.website;
        client.updated_at = Utc::now();
        Ok(Some(client.clone()))
    }

    async fn delete_client(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.lock()?;
        let before = store.clients.len();
        store.clients.retain(|c| c.id != id);
        if store.clients.len() == before {
            return Ok(false);
        }
        store.projects.retain(|p| p.client_id != Some(id));
        Ok(true)
    }

    // --- CONTACTS ---

    async fn list_contacts(&self) -> AppResult<Vec<Contact>> {
        Ok(newest_first(&self.lock()?.contacts, |c| c.submitted_at))
    }

    async fn get_contact(&self, id: Uuid) -> AppResult<Option<Contact>> {
        Ok(self.lock()?.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn create_contact(&self, input: ContactInput) -> AppResult<Contact> {
        let contact = Contact {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            mobile: input.mobile,
            city: input.city,
            subject: input.subject,
            message: input.message,
            is_read: false,
            submitted_at: Utc::now(),
        };
        self.lock()?.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn update_contact(&self, id: Uuid, input: ContactInput) -> AppResult<Option<Contact>> {
        let mut store = self.lock()?;
        let Some(contact) = store.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        contact.name = input.name;
        contact.email = input.email;
        contact.mobile = input.mobile;
        contact.city = input.city;
        contact.subject = input.subject;
        contact.message = input.message;
        contact.is_read = input.is_read;
        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.lock()?;
        let before = store.contacts.len();
        store.contacts.retain(|c| c.id != id);
        Ok(store.contacts.len() < before)
    }

    // --- NEWSLETTER ---

    async fn list_subscribers(&self) -> AppResult<Vec<NewsletterSubscriber>> {
        Ok(newest_first(&self.lock()?.subscribers, |s| s.subscribed_at))
    }

    async fn get_subscriber(&self, id: Uuid) -> AppResult<Option<NewsletterSubscriber>> {
        Ok(self.lock()?.subscribers.iter().find(|s| s.id == id).cloned())
    }

    async fn subscribe(&self, email: &str) -> AppResult<SubscribeOutcome> {
        let mut store = self.lock()?;
        if let Some(existing) = store.subscribers.iter_mut().find(|s| s.email == email) {
            if existing.is_active {
                return Ok(SubscribeOutcome::AlreadyActive);
            }
            existing.is_active = true;
            existing.unsubscribed_at = None;
            return Ok(SubscribeOutcome::Reactivated(existing.clone()));
        }

        let subscriber = NewsletterSubscriber {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_active: true,
            subscribed_at: Utc::now(),
            unsubscribed_at: None,
        };
        store.subscribers.push(subscriber.clone());
        Ok(SubscribeOutcome::Created(subscriber))
    }

    async fn update_subscriber(
        &self,
        id: Uuid,
        input: SubscriberInput,
    ) -> AppResult<Option<NewsletterSubscriber>> {
        let mut store = self.lock()?;
        store.ensure_subscriber_email_free(&input.email, id)?;
        let Some(subscriber) = store.subscribers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        subscriber.unsubscribed_at = match (subscriber.is_active, input.is_active) {
            (_, true) => None,
            (true, false) => Some(Utc::now()),
            (false, false) => subscriber.unsubscribed_at,
        };
        subscriber.email = input.email;
        subscriber.is_active = input.is_active;
        Ok(Some(subscriber.clone()))
    }

    async fn unsubscribe(&self, id: Uuid) -> AppResult<Option<NewsletterSubscriber>> {
        let mut store = self.lock()?;
        let Some(subscriber) = store.subscribers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        subscriber.is_active = false;
        subscriber.unsubscribed_at = Some(Utc::now());
        Ok(Some(subscriber.clone()))
    }

    async fn delete_subscriber(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.lock()?;
        let before = store.subscribers.len();
        store.subscribers.retain(|s| s.id != id);
        Ok(store.subscribers.len() < before)
    }

    // --- DASHBOARD ---

    async fn get_stats(&self) -> AppResult<DashboardStats> {
        let store = self.lock()?;
        let count = |n: usize| n as i64;
        Ok(DashboardStats {
            projects: count(store.projects.len()),
            clients: count(store.clients.len()),
            contacts: count(store.contacts.len()),
            unread_contacts: count(store.contacts.iter().filter(|c| !c.is_read).count()),
            active_subscribers: count(store.subscribers.iter().filter(|s| s.is_active).count()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_input(client_id: Option<Uuid>) -> ProjectInput {
        ProjectInput {
            title: "Site".into(),
            description: "A site".into(),
            image: "projects/a.png".into(),
            link: String::new(),
            client_id,
        }
    }

    fn client_input(name: &str) -> ClientInput {
        ClientInput {
            name: name.into(),
            image: None,
            designation: "CEO".into(),
            description: None,
            website: None,
        }
    }

    #[tokio::test]
    async fn deleting_client_cascades_to_its_projects_only() {
        let repo = InMemoryRepository::new();
        let acme = repo.create_client(client_input("Acme")).await.unwrap();
        let other = repo.create_client(client_input("Other")).await.unwrap();
        repo.create_project(project_input(Some(acme.id))).await.unwrap();
        repo.create_project(project_input(Some(acme.id))).await.unwrap();
        let kept = repo.create_project(project_input(Some(other.id))).await.unwrap();
        let orphan = repo.create_project(project_input(None)).await.unwrap();

        assert!(repo.delete_client(acme.id).await.unwrap());

        let remaining: Vec<Uuid> = repo.list_projects().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![kept.id, orphan.id]);
        assert!(!repo.delete_client(acme.id).await.unwrap());
    }

    #[tokio::test]
    async fn project_reports_client_name() {
        let repo = InMemoryRepository::new();
        let acme = repo.create_client(client_input("Acme")).await.unwrap();
        let project = repo.create_project(project_input(Some(acme.id))).await.unwrap();
        assert_eq!(project.client_name.as_deref(), Some("Acme"));

        let detached = repo
            .update_project(project.id, project_input(None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detached.client_name, None);
    }

    #[tokio::test]
    async fn project_with_unknown_client_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = repo.create_project(project_input(Some(Uuid::new_v4()))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.contains("client")));
    }

    #[tokio::test]
    async fn subscribe_cycle_reuses_the_same_row() {
        let repo = InMemoryRepository::new();
        let SubscribeOutcome::Created(created) = repo.subscribe("a@b.com").await.unwrap() else {
            panic!("expected a new subscriber");
        };
        assert_eq!(repo.subscribe("a@b.com").await.unwrap(), SubscribeOutcome::AlreadyActive);

        let unsubscribed = repo.unsubscribe(created.id).await.unwrap().unwrap();
        assert!(!unsubscribed.is_active);
        assert!(unsubscribed.unsubscribed_at.is_some());

        let SubscribeOutcome::Reactivated(again) = repo.subscribe("a@b.com").await.unwrap() else {
            panic!("expected reactivation");
        };
        assert_eq!(again.id, created.id);
        assert!(again.is_active);
        assert_eq!(again.unsubscribed_at, None);
        assert_eq!(repo.list_subscribers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_admin_needs_superuser() {
        let repo = InMemoryRepository::new();
        let admin = |name: &str| NewAdmin {
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: "x".into(),
        };

        let first = repo.create_admin(admin("first"), false).await.unwrap();
        assert!(first.is_admin && first.is_staff && !first.is_superuser);

        let denied = repo.create_admin(admin("second"), false).await.unwrap_err();
        assert!(matches!(denied, AppError::PermissionDenied(_)));

        assert!(repo.create_admin(admin("second"), true).await.is_ok());
    }

    #[tokio::test]
    async fn stats_count_unread_and_active() {
        let repo = InMemoryRepository::new();
        repo.create_contact(ContactInput {
            name: "N".into(),
            email: "n@example.com".into(),
            mobile: "1".into(),
            city: "C".into(),
            subject: None,
            message: None,
            is_read: false,
        })
        .await
        .unwrap();
        let SubscribeOutcome::Created(sub) = repo.subscribe("x@y.com").await.unwrap() else {
            panic!("expected a new subscriber");
        };
        repo.subscribe("z@y.com").await.unwrap();
        repo.unsubscribe(sub.id).await.unwrap();

        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.contacts, 1);
        assert_eq!(stats.unread_contacts, 1);
        assert_eq!(stats.active_subscribers, 1);
    }
}
