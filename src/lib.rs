//! # Campus (administration API and client)
//!
//! `campus` serves a small campus-administration backend and a typed client
//! for it.
//!
//! ## Accounts and sessions
//!
//! Users register with a username, password and one of four roles
//! (`student`, `faculty`, `staff`, `management`). Passwords are stored as
//! Argon2id PHC strings. Login issues an HS256 token valid for one hour by
//! default; there is no revocation, expiry is the only way a token stops
//! working.
//!
//! ## Records
//!
//! Students and faculty are plain CRUD collections kept in PostgreSQL, or in
//! memory when no DSN is configured. Updates are partial, deletes are
//! unconditional.
//!
//! ## Feedback
//!
//! Feedback forms are relayed through SMTP with a single delivery attempt.
//! Without a relay configured, messages are only logged.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod mailer;
pub mod models;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
