/// Router Module Index
///
/// Routes are grouped by the area of the site they serve. Access control is not
/// applied by layers here: each resource handler consults the authorization
/// policy itself, and the remaining protected endpoints require the `AuthUser`
/// extractor.

/// Registration, login, token refresh and session verification.
pub mod auth;

/// Portfolio content shown on the public site: projects and clients.
pub mod content;

/// Inbound visitor traffic: the contact form and newsletter subscriptions.
pub mod inbox;

/// Dashboard-only helpers: upload URLs and landing-page counters.
pub mod dashboard;
