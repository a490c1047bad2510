//! Persistence for users, students and faculty.
//!
//! `PgStore` is the production backend; `MemoryStore` keeps everything in
//! process and is used when no database is configured.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Faculty, FacultyFields, NewFaculty, NewStudent, NewUser, Student, StudentFields, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name reported by `/health`.
    fn kind(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a user; `Duplicate` when the username is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn list_students(&self) -> Result<Vec<Student>, StoreError>;

    async fn insert_student(&self, student: NewStudent) -> Result<Student, StoreError>;

    /// Merge the supplied fields; `None` when no student has `id`.
    async fn update_student(
        &self,
        id: Uuid,
        fields: &StudentFields,
    ) -> Result<Option<Student>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_student(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_faculty(&self) -> Result<Vec<Faculty>, StoreError>;

    async fn insert_faculty(&self, faculty: NewFaculty) -> Result<Faculty, StoreError>;

    async fn update_faculty(
        &self,
        id: Uuid,
        fields: &FacultyFields,
    ) -> Result<Option<Faculty>, StoreError>;

    async fn delete_faculty(&self, id: Uuid) -> Result<bool, StoreError>;
}
