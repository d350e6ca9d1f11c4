use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use std::sync::{Arc, Mutex};

use crate::config::{AppConfig, SmtpConfig};
use crate::models::Contact;

/// NotifyError
///
/// Everything that can go wrong while handing a message to the mail relay.
/// Never reaches an HTTP caller.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Build(String),

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// ContactEmail
///
/// The plain-text summary sent to the admin inbox for every new contact submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEmail {
    pub subject: String,
    pub body: String,
}

impl ContactEmail {
    pub fn from_contact(contact: &Contact) -> Self {
        let or_na = |value: &str| {
            if value.is_empty() { "N/A".to_string() } else { value.to_string() }
        };
        Self {
            subject: format!(
                "New Contact: {}",
                contact.subject.as_deref().unwrap_or("No Subject")
            ),
            body: format!(
                "Name: {}\nEmail: {}\nMobile: {}\nCity: {}\nMessage: {}",
                contact.name,
                contact.email,
                or_na(&contact.mobile),
                or_na(&contact.city),
                contact.message.as_deref().unwrap_or_default(),
            ),
        }
    }
}

/// Notifier
///
/// Outbound notification channel. Implementations report failures but callers
/// treat them as best-effort: see [`dispatch_contact_notification`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_contact(&self, contact: &Contact) -> Result<(), NotifyError>;
}

pub type NotifierState = Arc<dyn Notifier>;

/// SmtpNotifier
///
/// Sends contact summaries to the configured admin address over a STARTTLS relay.
/// The transport pools its connections, so one instance is shared for the process.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    admin_email: String,
    from_email: String,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, admin_email: &str, from_email: &str) -> Result<Self, NotifyError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);

        if let (Some(user), Some(password)) = (&smtp.user, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            admin_email: admin_email.to_string(),
            from_email: from_email.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_contact(&self, contact: &Contact) -> Result<(), NotifyError> {
        let email = ContactEmail::from_contact(contact);

        let message = Message::builder()
            .from(self.from_email.parse()?)
            .to(self.admin_email.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport.send(message).await?;

        tracing::info!(contact_id = %contact.id, to = %self.admin_email, "contact notification sent");
        Ok(())
    }
}

/// LogNotifier
///
/// Used when no SMTP relay is configured: the email is written to the log instead.
pub struct LogNotifier {
    admin_email: String,
}

impl LogNotifier {
    pub fn new(admin_email: &str) -> Self {
        Self { admin_email: admin_email.to_string() }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_contact(&self, contact: &Contact) -> Result<(), NotifyError> {
        let email = ContactEmail::from_contact(contact);
        tracing::info!(
            contact_id = %contact.id,
            to = %self.admin_email,
            subject = %email.subject,
            body = %email.body,
            "SMTP not configured; contact notification logged"
        );
        Ok(())
    }
}

/// notifier_from_config
///
/// SMTP when `SMTP_HOST` is set, the log otherwise. A relay that cannot be
/// configured falls back to the log so startup never depends on the mail server.
pub fn notifier_from_config(config: &AppConfig) -> NotifierState {
    let Some(smtp) = &config.smtp else {
        return Arc::new(LogNotifier::new(&config.admin_email));
    };
    match SmtpNotifier::new(smtp, &config.admin_email, &config.from_email) {
        Ok(notifier) => Arc::new(notifier),
        Err(err) => {
            tracing::warn!(error = %err, host = %smtp.host, "invalid SMTP settings, logging notifications instead");
            Arc::new(LogNotifier::new(&config.admin_email))
        }
    }
}

/// dispatch_contact_notification
///
/// Fire-and-forget: the send runs on its own task and any failure is logged and
/// dropped. No retry.
pub fn dispatch_contact_notification(notifier: NotifierState, contact: Contact) {
    tokio::spawn(async move {
        if let Err(err) = notifier.notify_contact(&contact).await {
            tracing::warn!(contact_id = %contact.id, error = %err, "contact notification failed");
        }
    });
}

/// MockNotifier
///
/// Records every email it is asked to send. With `should_fail` set it records
/// nothing and reports a transport failure.
#[derive(Clone, Default)]
pub struct MockNotifier {
    pub should_fail: bool,
    pub sent: Arc<Mutex<Vec<ContactEmail>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<ContactEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_contact(&self, contact: &Contact) -> Result<(), NotifyError> {
        if self.should_fail {
            return Err(NotifyError::Unavailable("Mock SMTP Error: Simulation requested".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| NotifyError::Unavailable("mock mailbox poisoned".to_string()))?
            .push(ContactEmail::from_contact(contact));
        Ok(())
    }
}
