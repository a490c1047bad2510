use crate::{
    api::{self, Services},
    auth::{token::TokenSigner, AuthService},
    mailer::{EmailSender, FeedbackMailer, LogEmailSender, SmtpConfig, SmtpEmailSender},
    store::{memory::MemoryStore, postgres::PgStore, Store},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub secret_key: SecretString,
    pub token_ttl_seconds: u64,
    pub enforce_auth: bool,
    pub cors_origin: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub feedback_inbox: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database or SMTP relay cannot be set up, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store = open_store(args.dsn.as_deref()).await?;

    let auth = AuthService::new(store.clone(), TokenSigner::new(args.secret_key))
        .with_ttl(Duration::from_secs(args.token_ttl_seconds));

    let sender: Arc<dyn EmailSender> = match &args.smtp {
        Some(config) => {
            info!(host = %config.host, port = config.port, security = %config.security, "using SMTP relay");
            Arc::new(SmtpEmailSender::new(config).context("Failed to configure SMTP relay")?)
        }
        None => {
            warn!("No SMTP host configured, feedback is logged instead of sent");
            Arc::new(LogEmailSender)
        }
    };

    let services = Services {
        store,
        auth: Arc::new(auth),
        mailer: Arc::new(FeedbackMailer::new(sender).with_inbox(args.feedback_inbox)),
        enforce_auth: args.enforce_auth,
    };

    api::new(args.port, services, args.cors_origin.as_deref()).await
}

async fn open_store(dsn: Option<&str>) -> Result<Arc<dyn Store>> {
    match dsn {
        Some(dsn) => {
            let dsn = Url::parse(dsn).context("Invalid database connection string")?;
            let store = PgStore::connect(dsn.as_str()).await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("No database configured, records are kept in memory and lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_without_dsn() {
        let store = open_store(None).await.unwrap();
        assert_eq!(store.kind(), "memory");
    }

    #[tokio::test]
    async fn rejects_malformed_dsn() {
        assert!(open_store(Some("not a dsn")).await.is_err());
    }
}
