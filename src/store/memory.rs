use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    Faculty, FacultyFields, NewFaculty, NewStudent, NewUser, Student, StudentFields, User,
};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    students: Vec<Student>,
    faculty: Vec<Faculty>,
}

/// In-process store. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut collections = self.collections.write().await;
        if collections
            .users
            .iter()
            .any(|existing| existing.username == user.username)
        {
            return Err(StoreError::Duplicate);
        }

        let user = User {
            id: Uuid::now_v7(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        collections.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.collections.read().await.students.clone())
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Student, StoreError> {
        let now = Utc::now();
        let student = Student {
            id: Uuid::now_v7(),
            name: student.name,
            branch: student.branch,
            cgpa: student.cgpa,
            created_at: now,
            updated_at: now,
        };
        self.collections.write().await.students.push(student.clone());
        Ok(student)
    }

    async fn update_student(
        &self,
        id: Uuid,
        fields: &StudentFields,
    ) -> Result<Option<Student>, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .students
            .iter_mut()
            .find(|student| student.id == id)
            .map(|student| {
                fields.apply(student);
                student.updated_at = Utc::now();
                student.clone()
            }))
    }

    async fn delete_student(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let before = collections.students.len();
        collections.students.retain(|student| student.id != id);
        Ok(collections.students.len() != before)
    }

    async fn list_faculty(&self) -> Result<Vec<Faculty>, StoreError> {
        Ok(self.collections.read().await.faculty.clone())
    }

    async fn insert_faculty(&self, faculty: NewFaculty) -> Result<Faculty, StoreError> {
        let now = Utc::now();
        let faculty = Faculty {
            id: Uuid::now_v7(),
            name: faculty.name,
            designation: faculty.designation,
            qualification: faculty.qualification,
            salary: faculty.salary,
            created_at: now,
            updated_at: now,
        };
        self.collections.write().await.faculty.push(faculty.clone());
        Ok(faculty)
    }

    async fn update_faculty(
        &self,
        id: Uuid,
        fields: &FacultyFields,
    ) -> Result<Option<Faculty>, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .faculty
            .iter_mut()
            .find(|faculty| faculty.id == id)
            .map(|faculty| {
                fields.apply(faculty);
                faculty.updated_at = Utc::now();
                faculty.clone()
            }))
    }

    async fn delete_faculty(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let before = collections.faculty.len();
        collections.faculty.retain(|faculty| faculty.id != id);
        Ok(collections.faculty.len() != before)
    }
}
