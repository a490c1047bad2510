use axum::{extract::rejection::JsonRejection, Extension, Json};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    api::error::ApiError,
    mailer::FeedbackMailer,
    models::{Feedback, Message},
};

#[utoipa::path(
    post,
    path = "/api/send",
    request_body = Feedback,
    responses(
        (status = 200, description = "Email sent successfully", body = Message),
        (status = 400, description = "Missing or invalid fields", body = Message),
        (status = 500, description = "Error sending email", body = Message),
    ),
    tag = "feedback"
)]
#[instrument(skip(mailer, payload))]
pub async fn send(
    Extension(mailer): Extension<Arc<FeedbackMailer>>,
    payload: Result<Json<Feedback>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(feedback) = payload?;

    mailer.send_feedback(&feedback).await?;

    Ok(Json(Message::new("Email sent successfully")))
}
