use crate::{
    api::handlers::{auth, faculty, feedback, health, require_session, students},
    auth::AuthService,
    mailer::FeedbackMailer,
    store::Store,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Shared dependencies handed to every handler through request extensions.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub mailer: Arc<FeedbackMailer>,
    /// Require a bearer token on the student, faculty and feedback routes.
    pub enforce_auth: bool,
}

/// Build the application router without the transport layers.
#[must_use]
pub fn router(services: &Services) -> Router {
    let resources = Router::new()
        .route("/api/students", get(students::list).post(students::create))
        .route(
            "/api/students/:id",
            put(students::update).delete(students::delete),
        )
        .route("/api/faculty", get(faculty::list).post(faculty::create))
        .route(
            "/api/faculty/:id",
            put(faculty::update).delete(faculty::delete),
        )
        .route("/api/send", post(feedback::send));

    let resources = if services.enforce_auth {
        resources.route_layer(middleware::from_fn(require_session))
    } else {
        resources
    };

    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/test", get(auth::test_token))
        .merge(resources)
        .route("/health", get(health).options(health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(Extension(services.store.clone()))
        .layer(Extension(services.auth.clone()))
        .layer(Extension(services.mailer.clone()))
}

/// Start the server
/// # Errors
/// Return error if failed to bind the port or the origin is not a valid URL
pub async fn new(port: u16, services: Services, cors_origin: Option<&str>) -> Result<()> {
    if !services.enforce_auth {
        warn!("Student, faculty and feedback routes accept anonymous requests, use --enforce-auth to require a token");
    }

    let cors = cors_layer(cors_origin)?;

    let app = router(&services).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!(
        store = services.store.kind(),
        "Listening on [::]:{}", port
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    Ok(match origin {
        Some(origin) => cors.allow_origin(AllowOrigin::exact(origin_header(origin)?)),
        None => cors.allow_origin(Any),
    })
}

fn origin_header(base_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(base_url).with_context(|| format!("Invalid CORS origin: {base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("CORS origin must include a valid host: {base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build CORS origin header")
}
