#![allow(clippy::needless_for_each)]

use super::handlers::{auth, faculty, feedback, health, students};
use crate::{
    auth::token::SessionClaims,
    models::{
        Credentials, Faculty, FacultyFields, Feedback, LoginResponse, Message, Role, Student,
        StudentFields, TokenCheck,
    },
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::test_token,
        students::list,
        students::create,
        students::update,
        students::delete,
        faculty::list,
        faculty::create,
        faculty::update,
        faculty::delete,
        feedback::send,
    ),
    components(
        schemas(
            health::Health,
            Role,
            Credentials,
            LoginResponse,
            TokenCheck,
            SessionClaims,
            Message,
            Student,
            StudentFields,
            Faculty,
            FacultyFields,
            Feedback,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service and store status"),
        (name = "auth", description = "Registration, login and token checks"),
        (name = "students", description = "Student records"),
        (name = "faculty", description = "Faculty records"),
        (name = "feedback", description = "Feedback relayed by email"),
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
