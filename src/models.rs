use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::FieldErrors;
use crate::validation::{
    optional_text, optional_url, required_email, required_text,
};

/// Deserializes a present-but-null field as `Some(None)`, keeping absent fields `None`.
/// PATCH payloads use this to tell "leave unchanged" apart from "clear".
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Identity (Mapped to the `users` table) ---

/// User
///
/// An account able to sign in to the dashboard. Only rows with `is_admin = true`
/// can complete a login; the password is stored as an Argon2id PHC string and is
/// never serialized. Use [`UserProfile`] for anything leaving the process.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NewAdmin
///
/// A validated registration, ready to be inserted with admin and staff privileges.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// UserProfile
///
/// The public representation of a user returned by login, registration and verify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

// --- Portfolio Content ---

/// Client
///
/// A client/testimonial record from the `clients` table. Newest first by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    // Storage key of the uploaded portrait/logo.
    pub image: Option<String>,
    pub designation: String,
    pub description: Option<String>,
    pub website: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Project
///
/// A showcased project from the `projects` table. `client` references an optional
/// [`Client`]; deleting that client deletes the project as well. `client_name` is
/// resolved by a join and is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // Storage key of the cover image (required).
    pub image: String,
    // Empty when the project has no public link.
    pub link: String,
    #[serde(rename = "client")]
    pub client_id: Option<Uuid>,
    #[sqlx(default)]
    pub client_name: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Inbox ---

/// Contact
///
/// An inquiry submitted through the public contact form. `submitted_at` is set
/// on insert and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub city: String,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub is_read: bool,
    #[ts(type = "string")]
    pub submitted_at: DateTime<Utc>,
}

/// NewsletterSubscriber
///
/// One row per email address (unique at the store level). Unsubscribing flips
/// `is_active` and stamps `unsubscribed_at`; subscribing again reactivates the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct NewsletterSubscriber {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    #[ts(type = "string")]
    pub subscribed_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// SubscribeOutcome
///
/// Result of the atomic get-or-create performed for `POST /newsletter/`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
    Created(NewsletterSubscriber),
    Reactivated(NewsletterSubscriber),
    AlreadyActive,
}

// --- Request Payloads (Input Schemas) ---
//
// Create/PUT payloads carry every field as `Option` so that missing required
// fields are reported as field errors rather than deserialization failures.
// `validate` turns them into the concrete `*Input` written by the repository.

/// ClientRequest
///
/// Body of `POST /clients/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ClientRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub designation: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// ClientPatch
///
/// Body of `PUT`/`PATCH /clients/{id}/`. Nullable columns accept `null` to clear
/// them; an absent field keeps its stored value except where PUT requires it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ClientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(optional)]
    pub image: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(optional)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(optional)]
    pub website: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientInput {
    pub name: String,
    pub image: Option<String>,
    pub designation: String,
    pub description: Option<String>,
    pub website: Option<String>,
}

pub const DEFAULT_DESIGNATION: &str = "Client";

impl ClientRequest {
    pub fn validate(self) -> Result<ClientInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let input = ClientInput {
            name: required_text(&mut errors, "name", self.name, Some(255)),
            image: optional_text(&mut errors, "image", self.image, Some(255)),
            designation: required_text(
                &mut errors,
                "designation",
                Some(self.designation.unwrap_or_else(|| DEFAULT_DESIGNATION.to_string())),
                Some(100),
            ),
            description: optional_text(&mut errors, "description", self.description, None),
            website: optional_url(&mut errors, "website", self.website, 200),
        };
        errors.into_result(input)
    }
}

impl ClientPatch {
    /// PUT semantics: `name` must be in the body, omitted optional fields keep
    /// their stored values.
    pub fn replace(self, current: &Client) -> ClientRequest {
        ClientRequest {
            name: self.name,
            image: self.image.unwrap_or_else(|| current.image.clone()),
            designation: Some(self.designation.unwrap_or_else(|| current.designation.clone())),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            website: self.website.unwrap_or_else(|| current.website.clone()),
        }
    }

    /// Overlays the patch on the stored record, yielding a full request to validate.
    pub fn merge(self, current: &Client) -> ClientRequest {
        let name = Some(self.name.unwrap_or_else(|| current.name.clone()));
        Self { name, ..self }.replace(current)
    }
}

/// ProjectRequest
///
/// Body of `POST /projects/`. `image` is the storage key
/// returned by `POST /uploads/presigned`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub client: Option<Uuid>,
}

/// ProjectPatch
///
/// Body of `PUT`/`PATCH /projects/{id}/`. `client: null` detaches the project from its client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    #[ts(optional)]
    pub client: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub image: String,
    pub link: String,
    pub client_id: Option<Uuid>,
}

impl ProjectRequest {
    /// Field checks only; the handler verifies that `client` names an existing row.
    pub fn validate(self) -> Result<ProjectInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let input = ProjectInput {
            title: required_text(&mut errors, "title", self.title, Some(200)),
            description: required_text(&mut errors, "description", self.description, None),
            image: required_text(&mut errors, "image", self.image, Some(255)),
            link: optional_url(&mut errors, "link", self.link, 200).unwrap_or_default(),
            client_id: self.client,
        };
        errors.into_result(input)
    }
}

impl ProjectPatch {
    /// PUT semantics: `title`, `description` and `image` must be in the body;
    /// `link` and `client` keep their stored values when omitted.
    pub fn replace(self, current: &Project) -> ProjectRequest {
        ProjectRequest {
            title: self.title,
            description: self.description,
            image: self.image,
            link: Some(self.link.unwrap_or_else(|| current.link.clone())),
            client: self.client.unwrap_or(current.client_id),
        }
    }

    pub fn merge(self, current: &Project) -> ProjectRequest {
        Self {
            title: Some(self.title.unwrap_or_else(|| current.title.clone())),
            description: Some(self.description.unwrap_or_else(|| current.description.clone())),
            image: Some(self.image.unwrap_or_else(|| current.image.clone())),
            ..self
        }
        .replace(current)
    }
}

/// ContactRequest
///
/// Body of `POST /contact/`. `is_read` is ignored on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub is_read: Option<bool>,
}

/// ContactPatch
///
/// Body of `PUT`/`PATCH /contact/{id}/`; the dashboard sends `{ "is_read": true }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(optional)]
    pub subject: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(optional)]
    pub message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub city: String,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub is_read: bool,
}

impl ContactRequest {
    pub fn validate(self) -> Result<ContactInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let input = ContactInput {
            name: required_text(&mut errors, "name", self.name, Some(255)),
            email: required_email(&mut errors, "email", self.email),
            mobile: required_text(&mut errors, "mobile", self.mobile, Some(20)),
            city: required_text(&mut errors, "city", self.city, Some(100)),
            subject: optional_text(&mut errors, "subject", self.subject, Some(255)),
            message: optional_text(&mut errors, "message", self.message, None),
            is_read: self.is_read.unwrap_or(false),
        };
        errors.into_result(input)
    }
}

impl ContactPatch {
    /// PUT semantics: the contact details must be in the body; `subject`,
    /// `message` and `is_read` keep their stored values when omitted.
    pub fn replace(self, current: &Contact) -> ContactRequest {
        ContactRequest {
            name: self.name,
            email: self.email,
            mobile: self.mobile,
            city: self.city,
            subject: self.subject.unwrap_or_else(|| current.subject.clone()),
            message: self.message.unwrap_or_else(|| current.message.clone()),
            is_read: Some(self.is_read.unwrap_or(current.is_read)),
        }
    }

    pub fn merge(self, current: &Contact) -> ContactRequest {
        Self {
            name: Some(self.name.unwrap_or_else(|| current.name.clone())),
            email: Some(self.email.unwrap_or_else(|| current.email.clone())),
            mobile: Some(self.mobile.unwrap_or_else(|| current.mobile.clone())),
            city: Some(self.city.unwrap_or_else(|| current.city.clone())),
            ..self
        }
        .replace(current)
    }
}

/// SubscribeRequest
///
/// Body of the public `POST /newsletter/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

impl SubscribeRequest {
    pub fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = required_email(&mut errors, "email", self.email);
        errors.into_result(email)
    }
}

/// SubscriberRequest
///
/// Body of the authenticated `PUT`/`PATCH /newsletter/{id}/`. Timestamps are read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SubscriberRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberInput {
    pub email: String,
    pub is_active: bool,
}

impl SubscriberRequest {
    pub fn validate(self) -> Result<SubscriberInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let input = SubscriberInput {
            email: required_email(&mut errors, "email", self.email),
            is_active: self.is_active.unwrap_or(true),
        };
        errors.into_result(input)
    }

    /// PUT semantics: `email` must be in the body; an omitted `is_active` keeps
    /// the stored flag.
    pub fn replace(self, current: &NewsletterSubscriber) -> SubscriberRequest {
        SubscriberRequest {
            email: self.email,
            is_active: Some(self.is_active.unwrap_or(current.is_active)),
        }
    }

    pub fn merge(self, current: &NewsletterSubscriber) -> SubscriberRequest {
        let email = Some(self.email.unwrap_or_else(|| current.email.clone()));
        Self { email, ..self }.replace(current)
    }
}

// --- Authentication Payloads ---

/// RegisterRequest
///
/// Body of `POST /auth/register/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// LoginRequest
///
/// Body of `POST /auth/login/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// RefreshRequest
///
/// Body of `POST /auth/token/refresh/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// TokenPair
///
/// A freshly issued refresh/access credential pair bound to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// RegisterResponse
///
/// `201` body of `POST /auth/register/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub token: TokenPair,
}

/// LoginResponse
///
/// `200` body of `POST /auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VerifyResponse {
    pub user: UserProfile,
}

/// MessageResponse
///
/// Human-readable confirmation used by subscribe/unsubscribe.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

// --- Dashboard ---

/// DashboardStats
///
/// Output of `GET /dashboard/stats`: the counters shown on the admin landing tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct DashboardStats {
    pub projects: i64,
    pub clients: i64,
    pub contacts: i64,
    pub unread_contacts: i64,
    pub active_subscribers: i64,
}

/// UploadFolder
///
/// Key prefix for uploaded images, one per entity that stores an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UploadFolder {
    Projects,
    Clients,
}

impl UploadFolder {
    pub fn prefix(self) -> &'static str {
        match self {
            UploadFolder::Projects => "projects",
            UploadFolder::Clients => "clients",
        }
    }
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL (POST /uploads/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "hero.png")]
    pub filename: String,
    /// The MIME type the upload is constrained to. Must be an `image/*` type.
    #[schema(example = "image/png")]
    pub file_type: String,
    pub folder: UploadFolder,
}

/// PresignedUrlResponse
///
/// The time-limited PUT URL plus the object key to store on the Project/Client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}
