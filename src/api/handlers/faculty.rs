use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::parse_id;
use crate::{
    api::error::ApiError,
    models::{Faculty, FacultyFields, Message},
    store::Store,
};

#[utoipa::path(
    get,
    path = "/api/faculty",
    operation_id = "list_faculty",
    responses(
        (status = 200, description = "All faculty members in insertion order", body = [Faculty]),
    ),
    tag = "faculty"
)]
pub async fn list(
    Extension(store): Extension<Arc<dyn Store>>,
) -> Result<Json<Vec<Faculty>>, ApiError> {
    Ok(Json(store.list_faculty().await?))
}

#[utoipa::path(
    post,
    path = "/api/faculty",
    operation_id = "create_faculty",
    request_body = FacultyFields,
    responses(
        (status = 201, description = "Faculty member created", body = Faculty),
        (status = 400, description = "All fields are required", body = Message),
    ),
    tag = "faculty"
)]
#[instrument(skip(store, payload))]
pub async fn create(
    Extension(store): Extension<Arc<dyn Store>>,
    payload: Result<Json<FacultyFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Faculty>), ApiError> {
    let Json(fields) = payload?;
    let faculty = fields.require().map_err(ApiError::BadRequest)?;

    let faculty = store.insert_faculty(faculty).await?;

    debug!(faculty_id = %faculty.id, "faculty created");

    Ok((StatusCode::CREATED, Json(faculty)))
}

#[utoipa::path(
    put,
    path = "/api/faculty/{id}",
    operation_id = "update_faculty",
    params(("id" = String, Path, description = "Faculty id")),
    request_body = FacultyFields,
    responses(
        (status = 200, description = "Faculty member updated", body = Faculty),
        (status = 400, description = "Invalid id or fields", body = Message),
        (status = 404, description = "Faculty member not found", body = Message),
    ),
    tag = "faculty"
)]
#[instrument(skip(store, payload))]
pub async fn update(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn Store>>,
    payload: Result<Json<FacultyFields>, JsonRejection>,
) -> Result<Json<Faculty>, ApiError> {
    let id = parse_id(&id)?;
    let Json(fields) = payload?;
    fields.check().map_err(ApiError::BadRequest)?;

    store
        .update_faculty(id, &fields)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Faculty not found".to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/faculty/{id}",
    operation_id = "delete_faculty",
    params(("id" = String, Path, description = "Faculty id")),
    responses(
        (status = 200, description = "Faculty member deleted", body = Message),
        (status = 400, description = "Invalid id", body = Message),
    ),
    tag = "faculty"
)]
#[instrument(skip(store))]
pub async fn delete(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn Store>>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;

    let removed = store.delete_faculty(id).await?;
    debug!(removed, "faculty delete");

    Ok(Json(Message::new("Faculty deleted")))
}
