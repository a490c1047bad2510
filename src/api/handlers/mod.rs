pub mod auth;
pub mod faculty;
pub mod feedback;
pub mod health;
pub mod session;
pub mod students;

pub use self::health::health;
pub use self::session::{require_session, Session};

use crate::api::error::ApiError;
use uuid::Uuid;

// common functions for the handlers
pub(crate) fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid id: {id}")))
}
