#![allow(dead_code)]

use anyhow::Result;
use campus::{
    api::{router, Services},
    auth::{token::TokenSigner, AuthService},
    mailer::{EmailSender, FeedbackMailer, LogEmailSender},
    store::{memory::MemoryStore, Store},
};
use secrecy::SecretString;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-secret";

pub fn services(sender: Arc<dyn EmailSender>, enforce_auth: bool) -> Services {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let auth = AuthService::new(
        store.clone(),
        TokenSigner::new(SecretString::from(SECRET.to_string())),
    );
    Services {
        store,
        auth: Arc::new(auth),
        mailer: Arc::new(FeedbackMailer::new(sender)),
        enforce_auth,
    }
}

pub fn default_services() -> Services {
    services(Arc::new(LogEmailSender), false)
}

/// Serve the router on an ephemeral local port and return its base URL.
pub async fn spawn_app(services: Services) -> Result<String> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let app = router(&services);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });

    Ok(format!("http://{addr}"))
}
