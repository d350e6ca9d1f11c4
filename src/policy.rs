//! Authorization policy for the resource endpoints.
//!
//! Each handler states which [`Resource`] and [`Action`] it serves and asks
//! [`authorize`] for a [`Decision`] before touching the repository. The rules are
//! a pure function of `(resource, action, principal)` so they can be tested
//! without a transport.
//!
//! Write access is granted to any authenticated principal, not specifically to
//! admins. Only the login flow checks `is_admin`, and every token is issued by
//! that flow or by registration, both of which produce admins.

use crate::auth::Principal;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Project,
    Client,
    Contact,
    Newsletter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
    /// A named extra action such as `unsubscribe`.
    Custom(&'static str),
}

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

pub const UNSUBSCRIBE: &str = "unsubscribe";

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";

/// required_access
///
/// The rule table:
/// - Project, Client: reads are open, every write needs authentication.
/// - Contact: only `create` is open.
/// - Newsletter: `create` and `unsubscribe` are open.
pub fn required_access(resource: Resource, action: Action) -> Access {
    match (resource, action) {
        (Resource::Project | Resource::Client, Action::List | Action::Retrieve) => Access::Anyone,
        (Resource::Project | Resource::Client, _) => Access::Authenticated,
        (Resource::Contact, Action::Create) => Access::Anyone,
        (Resource::Contact, _) => Access::Authenticated,
        (Resource::Newsletter, Action::Create) => Access::Anyone,
        (Resource::Newsletter, Action::Custom(UNSUBSCRIBE)) => Access::Anyone,
        (Resource::Newsletter, _) => Access::Authenticated,
    }
}

pub fn authorize(resource: Resource, action: Action, principal: &Principal) -> Decision {
    match required_access(resource, action) {
        Access::Anyone => Decision::Allow,
        Access::Authenticated if principal.is_authenticated() => Decision::Allow,
        Access::Authenticated => Decision::Deny,
    }
}

/// enforce
///
/// `authorize` mapped onto the error taxonomy: a denial is always an anonymous
/// caller, so it surfaces as 401.
pub fn enforce(resource: Resource, action: Action, principal: &Principal) -> AppResult<()> {
    match authorize(resource, action, principal) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::debug!(?resource, ?action, "rejected anonymous request");
            Err(AppError::Authentication(NOT_AUTHENTICATED.to_string()))
        }
    }
}
