use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, str::FromStr, time::Duration};
use tracing::debug;

use super::{EmailMessage, EmailSender, MailError};

/// How the connection to the relay is secured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587).
    #[default]
    StartTls,
    /// Implicit TLS (port 465).
    Tls,
    /// No encryption. Only for local relays.
    None,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" => Ok(Self::Tls),
            "none" => Ok(Self::None),
            other => Err(format!("unknown SMTP security mode: {other}")),
        }
    }
}

impl fmt::Display for SmtpSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StartTls => "starttls",
            Self::Tls => "tls",
            Self::None => "none",
        })
    }
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
    pub security: SmtpSecurity,
    pub timeout: Duration,
}

impl SmtpConfig {
    #[must_use]
    pub fn new(host: String, from: String) -> Self {
        Self {
            host,
            port: 587,
            username: None,
            password: None,
            from,
            security: SmtpSecurity::StartTls,
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, username: String, password: SecretString) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn with_security(mut self, security: SmtpSecurity) -> Self {
        self.security = security;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse().map_err(|err: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

/// Sends through an SMTP relay, one attempt per message.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// # Errors
    /// Returns an error if the sender address or TLS parameters are invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from)?;

        let builder = match config.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailError::Build(e.to_string()))?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Build(e.to_string()))?,
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };

        let mut builder = builder.port(config.port).timeout(Some(config.timeout));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        debug!(
            host = %config.host,
            port = config.port,
            security = %config.security,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = &message.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        builder
            .body(message.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = self.build_message(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        debug!(code = %response.code(), "SMTP relay accepted message");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_parses() {
        assert_eq!("STARTTLS".parse::<SmtpSecurity>(), Ok(SmtpSecurity::StartTls));
        assert_eq!("tls".parse::<SmtpSecurity>(), Ok(SmtpSecurity::Tls));
        assert_eq!("none".parse::<SmtpSecurity>(), Ok(SmtpSecurity::None));
        assert!("ssl3".parse::<SmtpSecurity>().is_err());
    }

    #[test]
    fn config_builder_defaults() {
        let config = SmtpConfig::new("smtp.example.com".to_string(), "noreply@example.com".into());
        assert_eq!(config.port, 587);
        assert_eq!(config.security, SmtpSecurity::StartTls);
        assert!(config.username.is_none());

        let config = config
            .with_port(2525)
            .with_security(SmtpSecurity::None)
            .with_credentials("user".to_string(), SecretString::from("pw".to_string()));
        assert_eq!(config.port, 2525);
        assert_eq!(config.username.as_deref(), Some("user"));
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let config = SmtpConfig::new("localhost".to_string(), "not an address".to_string())
            .with_security(SmtpSecurity::None);
        assert!(matches!(
            SmtpEmailSender::new(&config),
            Err(MailError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_recipient_is_rejected_before_sending() {
        let config = SmtpConfig::new("localhost".to_string(), "noreply@example.com".to_string())
            .with_security(SmtpSecurity::None);
        let sender = SmtpEmailSender::new(&config).unwrap();
        let message = EmailMessage {
            to: "nobody".to_string(),
            reply_to: None,
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(matches!(
            sender.send(&message).await,
            Err(MailError::Address { .. })
        ));
    }
}
