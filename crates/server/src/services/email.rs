//! Outbound notifications: welcome, OTP, and password reset emails.
//!
//! The account flows talk to a [`Notifier`]. [`SmtpNotifier`] renders Askama
//! text and HTML templates and sends them via lettre; [`LogNotifier`] is used
//! when SMTP is not configured and only records that a message was due.
//! Neither ever logs the payload (codes and reset links).

use std::sync::Mutex;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use stockmate_core::{Email, SecretKind};

use crate::config::EmailConfig;

/// Which template a notification uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Welcome,
    Otp,
    PasswordReset,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Welcome => write!(f, "welcome"),
            Self::Otp => write!(f, "otp"),
            Self::PasswordReset => write!(f, "password_reset"),
        }
    }
}

/// A message to deliver, with its template payload.
///
/// `Debug` shows only the template kind.
#[derive(Clone, PartialEq, Eq)]
pub enum Notification {
    Welcome { name: String },
    Otp { name: String, code: String },
    PasswordReset { name: String, reset_url: String },
}

impl Notification {
    #[must_use]
    pub const fn kind(&self) -> TemplateKind {
        match self {
            Self::Welcome { .. } => TemplateKind::Welcome,
            Self::Otp { .. } => TemplateKind::Otp,
            Self::PasswordReset { .. } => TemplateKind::PasswordReset,
        }
    }
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The transport refused the message.
    #[error("Delivery refused: {0}")]
    Refused(String),
}

/// Best-effort delivery of account notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `notification` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` if the message cannot be rendered or sent.
    async fn send(&self, to: &Email, notification: &Notification) -> Result<(), DeliveryError>;
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/otp.html")]
struct OtpEmailHtml<'a> {
    name: &'a str,
    code: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/otp.txt")]
struct OtpEmailText<'a> {
    name: &'a str,
    code: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_minutes: i64,
}

/// A rendered message: subject, plain text body, HTML body.
struct Rendered {
    subject: &'static str,
    text: String,
    html: String,
}

fn render(notification: &Notification) -> Result<Rendered, DeliveryError> {
    let rendered = match notification {
        Notification::Welcome { name } => Rendered {
            subject: "Welcome to StockMate - Your Shop is Registered!",
            text: WelcomeEmailText { name }.render()?,
            html: WelcomeEmailHtml { name }.render()?,
        },
        Notification::Otp { name, code } => {
            let valid_minutes = SecretKind::Otp.lifetime().num_minutes();
            Rendered {
                subject: "Your OTP for Shop Verification - StockMate",
                text: OtpEmailText {
                    name,
                    code,
                    valid_minutes,
                }
                .render()?,
                html: OtpEmailHtml {
                    name,
                    code,
                    valid_minutes,
                }
                .render()?,
            }
        }
        Notification::PasswordReset { name, reset_url } => {
            let valid_minutes = SecretKind::PasswordReset.lifetime().num_minutes();
            Rendered {
                subject: "Reset Your Password - StockMate",
                text: PasswordResetEmailText {
                    name,
                    reset_url,
                    valid_minutes,
                }
                .render()?,
                html: PasswordResetEmailHtml {
                    name,
                    reset_url,
                    valid_minutes,
                }
                .render()?,
            }
        }
    };
    Ok(rendered)
}

// =============================================================================
// SMTP
// =============================================================================

/// Email delivery over SMTP with STARTTLS.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &Email, notification: &Notification) -> Result<(), DeliveryError> {
        let rendered = render(notification)?;

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| DeliveryError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| DeliveryError::InvalidAddress(to.to_string()))?)
            .subject(rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html),
                    ),
            )?;

        self.mailer.send(email).await?;

        info!(to = %to, kind = %notification.kind(), "Email sent successfully");
        Ok(())
    }
}

// =============================================================================
// Log-only
// =============================================================================

/// Stand-in used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &Email, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            to = %to,
            kind = %notification.kind(),
            "SMTP not configured; notification not delivered"
        );
        Ok(())
    }
}

// =============================================================================
// Recording (tests)
// =============================================================================

/// Keeps every notification in memory instead of sending it.
///
/// Exposed for the integration test crate, which reads OTP codes and reset
/// links out of it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Email, Notification)>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (the message is still recorded).
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Everything sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<(Email, Notification)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// The most recent OTP code sent to `to`.
    #[must_use]
    pub fn last_otp(&self, to: &Email) -> Option<String> {
        self.sent().into_iter().rev().find_map(|(addr, n)| match n {
            Notification::Otp { code, .. } if &addr == to => Some(code),
            _ => None,
        })
    }

    /// The most recent password reset link sent to `to`.
    #[must_use]
    pub fn last_reset_url(&self, to: &Email) -> Option<String> {
        self.sent().into_iter().rev().find_map(|(addr, n)| match n {
            Notification::PasswordReset { reset_url, .. } if &addr == to => Some(reset_url),
            _ => None,
        })
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &Email, notification: &Notification) -> Result<(), DeliveryError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.clone(), notification.clone()));
        }
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DeliveryError::Refused("recording notifier set to fail".to_string()));
        }
        Ok(())
    }
}
