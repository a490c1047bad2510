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
    models::{Message, Student, StudentFields},
    store::Store,
};

#[utoipa::path(
    get,
    path = "/api/students",
    operation_id = "list_students",
    responses(
        (status = 200, description = "All students in insertion order", body = [Student]),
    ),
    tag = "students"
)]
pub async fn list(
    Extension(store): Extension<Arc<dyn Store>>,
) -> Result<Json<Vec<Student>>, ApiError> {
    Ok(Json(store.list_students().await?))
}

#[utoipa::path(
    post,
    path = "/api/students",
    operation_id = "create_student",
    request_body = StudentFields,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Missing or invalid fields", body = Message),
    ),
    tag = "students"
)]
#[instrument(skip(store, payload))]
pub async fn create(
    Extension(store): Extension<Arc<dyn Store>>,
    payload: Result<Json<StudentFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let Json(fields) = payload?;
    let student = fields.require().map_err(ApiError::BadRequest)?;

    let student = store.insert_student(student).await?;

    debug!(student_id = %student.id, "student created");

    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    operation_id = "update_student",
    params(("id" = String, Path, description = "Student id")),
    request_body = StudentFields,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 400, description = "Invalid id or fields", body = Message),
        (status = 404, description = "Student not found", body = Message),
    ),
    tag = "students"
)]
#[instrument(skip(store, payload))]
pub async fn update(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn Store>>,
    payload: Result<Json<StudentFields>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id)?;
    let Json(fields) = payload?;
    fields.check().map_err(ApiError::BadRequest)?;

    store
        .update_student(id, &fields)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    operation_id = "delete_student",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student deleted", body = Message),
        (status = 400, description = "Invalid id", body = Message),
    ),
    tag = "students"
)]
#[instrument(skip(store))]
pub async fn delete(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn Store>>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;

    // unconditional: deleting a missing student still succeeds
    let removed = store.delete_student(id).await?;
    debug!(removed, "student delete");

    Ok(Json(Message::new("Student deleted")))
}
