//! Typed HTTP client for the campus API.
//!
//! Every REST endpoint has a method here. A [`Session`] obtained from
//! [`ApiClient::login`] is attached explicitly with [`ApiClient::with_session`].

mod session;

pub use session::Session;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::{
    api::handlers::health::Health,
    auth::token::TokenError,
    models::{
        Credentials, Faculty, FacultyFields, Feedback, LoginResponse, Message, Role, Student,
        StudentFields, TokenCheck,
    },
    APP_USER_AGENT,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("server returned an unreadable token: {0}")]
    Token(#[from] TokenError),
}

impl ClientError {
    /// HTTP status for errors reported by the API.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    base: Url,
    http: Client,
    session: Option<Session>,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().user_agent(APP_USER_AGENT).build()?;

        // endpoints join relative to the base path
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            http,
            session: None,
        })
    }

    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base.join(path.trim_start_matches('/'))?;
        let builder = self.http.request(method, url);
        Ok(match &self.session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Message>(&body)
            .map(|m| m.message)
            .unwrap_or(body);

        debug!(%status, %message, "API request rejected");

        Err(ClientError::Api { status, message })
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path)?;
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        self.send(builder).await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn health(&self) -> Result<Health, ClientError> {
        self.call::<(), _>(Method::GET, "/health", None).await
    }

    /// # Errors
    /// `Api` with status 400 when the username is taken or a field is missing.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<Message, ClientError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        self.call(Method::POST, "/api/register", Some(&credentials))
            .await
    }

    /// Log in and return the resulting session.
    ///
    /// # Errors
    /// `Api` with status 400 for unknown users and 401 for wrong passwords.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
            role: None,
        };
        let response: LoginResponse = self
            .call(Method::POST, "/api/login", Some(&credentials))
            .await?;
        Ok(Session::from_token(response.token)?)
    }

    /// Ask the server to validate the attached token.
    ///
    /// # Errors
    /// `Api` with status 401 without a session, 403 for a rejected token.
    pub async fn test_token(&self) -> Result<TokenCheck, ClientError> {
        self.call::<(), _>(Method::GET, "/api/test", None).await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn list_students(&self) -> Result<Vec<Student>, ClientError> {
        self.call::<(), _>(Method::GET, "/api/students", None).await
    }

    /// # Errors
    /// `Api` with status 400 when a field is missing.
    pub async fn create_student(&self, fields: &StudentFields) -> Result<Student, ClientError> {
        self.call(Method::POST, "/api/students", Some(fields)).await
    }

    /// # Errors
    /// `Api` with status 404 for an unknown id.
    pub async fn update_student(
        &self,
        id: Uuid,
        fields: &StudentFields,
    ) -> Result<Student, ClientError> {
        self.call(Method::PUT, &format!("/api/students/{id}"), Some(fields))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete_student(&self, id: Uuid) -> Result<Message, ClientError> {
        self.call::<(), _>(Method::DELETE, &format!("/api/students/{id}"), None)
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn list_faculty(&self) -> Result<Vec<Faculty>, ClientError> {
        self.call::<(), _>(Method::GET, "/api/faculty", None).await
    }

    /// # Errors
    /// `Api` with status 400 when a field is missing.
    pub async fn create_faculty(&self, fields: &FacultyFields) -> Result<Faculty, ClientError> {
        self.call(Method::POST, "/api/faculty", Some(fields)).await
    }

    /// # Errors
    /// `Api` with status 404 for an unknown id.
    pub async fn update_faculty(
        &self,
        id: Uuid,
        fields: &FacultyFields,
    ) -> Result<Faculty, ClientError> {
        self.call(Method::PUT, &format!("/api/faculty/{id}"), Some(fields))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete_faculty(&self, id: Uuid) -> Result<Message, ClientError> {
        self.call::<(), _>(Method::DELETE, &format!("/api/faculty/{id}"), None)
            .await
    }

    /// # Errors
    /// `Api` with status 500 when the relay is unreachable.
    #[instrument(skip(self, feedback), fields(from = %feedback.email))]
    pub async fn send_feedback(&self, feedback: &Feedback) -> Result<Message, ClientError> {
        self.call(Method::POST, "/api/send", Some(feedback)).await
    }
}
