use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{REGISTRATION_CLOSED, Repository};
use crate::error::{AppError, AppResult};
use crate::models::{
    Client, ClientInput, Contact, ContactInput, DashboardStats, NewAdmin, NewsletterSubscriber,
    Project, ProjectInput, SubscribeOutcome, SubscriberInput, User,
};

// Serializes concurrent registrations so the "no admin yet" check and the insert
// cannot interleave across transactions.
const REGISTRATION_LOCK_KEY: i64 = 0x706f_7274_666f_6c69;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
    is_admin, is_staff, is_superuser, is_active, date_joined, created_at, updated_at";

const CLIENT_COLUMNS: &str =
    "id, name, image, designation, description, website, created_at, updated_at";

const CONTACT_COLUMNS: &str =
    "id, name, email, mobile, city, subject, message, is_read, submitted_at";

const SUBSCRIBER_COLUMNS: &str = "id, email, is_active, subscribed_at, unsubscribed_at";

// Projects are always read through a join so `client_name` is populated.
const PROJECT_PROJECTION: &str = "SELECT p.id, p.title, p.description, p.image, p.link, \
    p.client_id, c.name AS client_name, p.created_at \
    FROM p LEFT JOIN clients c ON c.id = p.client_id";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Queries are checked at
/// runtime so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn project_query(source: &str, tail: &str) -> String {
        format!("WITH p AS ({source}) {PROJECT_PROJECTION} {tail}")
    }
}

#[derive(FromRow)]
struct SubscribeRow {
    #[sqlx(flatten)]
    subscriber: NewsletterSubscriber,
    inserted: bool,
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        Ok(sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE is_admin)")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Ok(sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Ok(sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?)
    }

    /// create_admin
    ///
    /// Count-and-insert inside one transaction holding a transaction-scoped
    /// advisory lock. Two simultaneous "first" registrations serialize on the
    /// lock; the second one sees the first admin and is refused.
    async fn create_admin(&self, admin: NewAdmin, caller_is_superuser: bool) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REGISTRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let admin_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE is_admin)")
                .fetch_one(&mut *tx)
                .await?;

        if admin_exists && !caller_is_superuser {
            return Err(AppError::PermissionDenied(REGISTRATION_CLOSED.to_string()));
        }

        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, is_admin, is_staff, \
                 date_joined, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, TRUE, TRUE, NOW(), NOW(), NOW()) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&admin.username)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, bootstrap = !admin_exists, "admin account created");
        Ok(user)
    }

    // --- PROJECTS ---

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let sql = Self::project_query("SELECT * FROM projects", "ORDER BY p.created_at, p.id");
        Ok(sqlx::query_as::<_, Project>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_project(&self, id: Uuid) -> AppResult<Option<Project>> {
        let sql = Self::project_query("SELECT * FROM projects WHERE id = $1", "");
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_project(&self, input: ProjectInput) -> AppResult<Project> {
        let sql = Self::project_query(
            "INSERT INTO projects (id, title, description, image, link, client_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *",
            "",
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image)
            .bind(&input.link)
            .bind(input.client_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_project(&self, id: Uuid, input: ProjectInput) -> AppResult<Option<Project>> {
        let sql = Self::project_query(
            "UPDATE projects SET title = $2, description = $3, image = $4, link = $5, \
             client_id = $6 WHERE id = $1 RETURNING *",
            "",
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image)
            .bind(&input.link)
            .bind(input.client_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_project(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- CLIENTS ---

    async fn list_clients(&self) -> AppResult<Vec<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC, id");
        Ok(sqlx::query_as::<_, Client>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1");
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_client(&self, input: ClientInput) -> AppResult<Client> {
        let sql = format!(
            "INSERT INTO clients (id, name, image, designation, description, website, \
                 created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {CLIENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.image)
            .bind(&input.designation)
            .bind(&input.description)
            .bind(&input.website)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_client(&self, id: Uuid, input: ClientInput) -> AppResult<Option<Client>> {
        let sql = format!(
            "UPDATE clients SET name = $2, image = $3, designation = $4, description = $5, \
                 website = $6, updated_at = NOW() \
             WHERE id = $1 RETURNING {CLIENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.image)
            .bind(&input.designation)
            .bind(&input.description)
            .bind(&input.website)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// delete_client
    ///
    /// The `projects.client_id` foreign key is `ON DELETE CASCADE`.
    async fn delete_client(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- CONTACTS ---

    async fn list_contacts(&self) -> AppResult<Vec<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY submitted_at DESC, id");
        Ok(sqlx::query_as::<_, Contact>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_contact(&self, id: Uuid) -> AppResult<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_contact(&self, input: ContactInput) -> AppResult<Contact> {
        let sql = format!(
            "INSERT INTO contacts (id, name, email, mobile, city, subject, message, is_read, \
                 submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, NOW()) RETURNING {CONTACT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.mobile)
            .bind(&input.city)
            .bind(&input.subject)
            .bind(&input.message)
            .fetch_one(&self.pool)
            .await?)
    }

    /// update_contact
    ///
    /// `submitted_at` is never rewritten.
    async fn update_contact(&self, id: Uuid, input: ContactInput) -> AppResult<Option<Contact>> {
        let sql = format!(
            "UPDATE contacts SET name = $2, email = $3, mobile = $4, city = $5, subject = $6, \
                 message = $7, is_read = $8 \
             WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.mobile)
            .bind(&input.city)
            .bind(&input.subject)
            .bind(&input.message)
            .bind(input.is_read)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_contact(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- NEWSLETTER ---

    async fn list_subscribers(&self) -> AppResult<Vec<NewsletterSubscriber>> {
        let sql = format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers ORDER BY subscribed_at DESC, id"
        );
        Ok(sqlx::query_as::<_, NewsletterSubscriber>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_subscriber(&self, id: Uuid) -> AppResult<Option<NewsletterSubscriber>> {
        let sql = format!("SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers WHERE id = $1");
        Ok(sqlx::query_as::<_, NewsletterSubscriber>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// subscribe
    ///
    /// One statement against the unique email constraint:
    /// - no row: inserted active (`xmax = 0` identifies a fresh insert);
    /// - inactive row: reactivated in place, `unsubscribed_at` cleared;
    /// - active row: the conditional DO UPDATE matches nothing and no row is returned.
    async fn subscribe(&self, email: &str) -> AppResult<SubscribeOutcome> {
        let sql = format!(
            "INSERT INTO newsletter_subscribers (id, email, is_active, subscribed_at) \
             VALUES ($1, $2, TRUE, NOW()) \
             ON CONFLICT ON CONSTRAINT newsletter_subscribers_email_key DO UPDATE \
                 SET is_active = TRUE, unsubscribed_at = NULL \
                 WHERE newsletter_subscribers.is_active = FALSE \
             RETURNING {SUBSCRIBER_COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, SubscribeRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(SubscribeRow { subscriber, inserted: true }) => SubscribeOutcome::Created(subscriber),
            Some(SubscribeRow { subscriber, inserted: false }) => {
                SubscribeOutcome::Reactivated(subscriber)
            }
            None => SubscribeOutcome::AlreadyActive,
        })
    }

    /// update_subscriber
    ///
    /// `unsubscribed_at` follows `is_active`: cleared on activation, stamped when an
    /// active row is deactivated, kept when the row was already inactive.
    async fn update_subscriber(
        &self,
        id: Uuid,
        input: SubscriberInput,
    ) -> AppResult<Option<NewsletterSubscriber>> {
        let sql = format!(
            "UPDATE newsletter_subscribers SET email = $2, is_active = $3, \
                 unsubscribed_at = CASE \
                     WHEN $3 THEN NULL \
                     WHEN is_active THEN NOW() \
                     ELSE unsubscribed_at \
                 END \
             WHERE id = $1 RETURNING {SUBSCRIBER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, NewsletterSubscriber>(&sql)
            .bind(id)
            .bind(&input.email)
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn unsubscribe(&self, id: Uuid) -> AppResult<Option<NewsletterSubscriber>> {
        let sql = format!(
            "UPDATE newsletter_subscribers SET is_active = FALSE, unsubscribed_at = NOW() \
             WHERE id = $1 RETURNING {SUBSCRIBER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, NewsletterSubscriber>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_subscriber(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM newsletter_subscribers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- DASHBOARD ---

    async fn get_stats(&self) -> AppResult<DashboardStats> {
        Ok(sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM projects) AS projects,
                (SELECT COUNT(*) FROM clients) AS clients,
                (SELECT COUNT(*) FROM contacts) AS contacts,
                (SELECT COUNT(*) FROM contacts WHERE NOT is_read) AS unread_contacts,
                (SELECT COUNT(*) FROM newsletter_subscribers WHERE is_active) AS active_subscribers
            "#,
        )
        .fetch_one(&self.pool)
        .await?)
    }
}
