//! Feedback mail delivery.
//!
//! A feedback submission is formatted into a plain-text message and handed to
//! an `EmailSender` in a single attempt; there is no queue and no retry. The
//! SMTP sender relays through the configured server. Without SMTP settings
//! the service falls back to `LogEmailSender`, which only logs the message.

mod smtp;

pub use smtp::{SmtpConfig, SmtpEmailSender, SmtpSecurity};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::models::Feedback;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("mail relay failed: {0}")]
    Delivery(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or report why the relay refused it.
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Local dev sender that logs the message instead of sending it.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

pub struct FeedbackMailer {
    sender: Arc<dyn EmailSender>,
    inbox: Option<String>,
}

impl FeedbackMailer {
    #[must_use]
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self {
            sender,
            inbox: None,
        }
    }

    /// Deliver feedback to `inbox` instead of echoing it to the submitter.
    #[must_use]
    pub fn with_inbox(mut self, inbox: Option<String>) -> Self {
        self.inbox = inbox.filter(|address| !address.trim().is_empty());
        self
    }

    #[must_use]
    pub fn compose(&self, feedback: &Feedback) -> EmailMessage {
        let name = feedback.name.trim();
        let email = feedback.email.trim();
        EmailMessage {
            to: self.inbox.clone().unwrap_or_else(|| email.to_string()),
            reply_to: Some(email.to_string()),
            subject: format!("Feedback from {name}"),
            body: format!(
                "Name: {name}\nEmail: {email}\nMessage: {}",
                feedback.message.trim()
            ),
        }
    }

    /// # Errors
    /// `Validation` for incomplete feedback; any relay failure otherwise.
    #[instrument(skip(self, feedback), fields(from = %feedback.email))]
    pub async fn send_feedback(&self, feedback: &Feedback) -> Result<(), MailError> {
        feedback.check().map_err(MailError::Validation)?;

        let message = self.compose(feedback);

        match self.sender.send(&message).await {
            Ok(()) => {
                info!(to = %message.to, "feedback delivered");
                Ok(())
            }
            Err(err) => {
                error!("Error sending feedback email: {err}");
                Err(err)
            }
        }
    }
}
