use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Connection, PgPool, Row,
};
use std::time::Duration;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    Faculty, FacultyFields, NewFaculty, NewStudent, NewUser, Role, Student, StudentFields, User,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const STUDENT_COLUMNS: &str = "id, name, branch, cgpa, created_at, updated_at";
const FACULTY_COLUMNS: &str =
    "id, name, designation, qualification, salary, created_at, updated_at";

fn query_span(operation: &'static str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn trimmed(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim())
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: role
            .parse::<Role>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?,
        created_at: row.try_get("created_at")?,
    })
}

fn student_from_row(row: &PgRow) -> Result<Student, sqlx::Error> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        branch: row.try_get("branch")?,
        cgpa: row.try_get("cgpa")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn faculty_from_row(row: &PgRow) -> Result<Faculty, sqlx::Error> {
    Ok(Faculty {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        designation: row.try_get("designation")?,
        qualification: row.try_get("qualification")?,
        salary: row.try_get("salary")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL backend.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply the schema.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the schema fails to apply.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply `sql/schema.sql`; every statement in it is idempotent.
    ///
    /// # Errors
    /// Returns an error if a statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(info_span!(
                "db.migrate",
                db.system = "postgresql",
                db.operation = "DDL"
            ))
            .await
            .context("Failed to apply database schema")?;

        info!("Database schema applied");

        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await?;
        conn.ping()
            .instrument(info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = "INSERT INTO users (id, username, password_hash, role, created_at) \
                     VALUES ($1, $2, $3, $4, $5) \
                     RETURNING id, username, password_hash, role, created_at";
        let row = sqlx::query(query)
            .bind(Uuid::now_v7())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::Duplicate
                } else {
                    StoreError::Database(err)
                }
            })?;

        Ok(user_from_row(&row)?)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query =
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1";
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at, id");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;

        Ok(rows
            .iter()
            .map(student_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Student, StoreError> {
        let query = format!(
            "INSERT INTO students (id, name, branch, cgpa, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {STUDENT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(&student.name)
            .bind(&student.branch)
            .bind(student.cgpa)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await?;

        Ok(student_from_row(&row)?)
    }

    async fn update_student(
        &self,
        id: Uuid,
        fields: &StudentFields,
    ) -> Result<Option<Student>, StoreError> {
        let query = format!(
            "UPDATE students SET \
                name = COALESCE($2, name), \
                branch = COALESCE($3, branch), \
                cgpa = COALESCE($4, cgpa), \
                updated_at = $5 \
             WHERE id = $1 RETURNING {STUDENT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(trimmed(fields.name.as_ref()))
            .bind(trimmed(fields.branch.as_ref()))
            .bind(fields.cgpa)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await?;

        Ok(row.as_ref().map(student_from_row).transpose()?)
    }

    async fn delete_student(&self, id: Uuid) -> Result<bool, StoreError> {
        let query = "DELETE FROM students WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_faculty(&self) -> Result<Vec<Faculty>, StoreError> {
        let query = format!("SELECT {FACULTY_COLUMNS} FROM faculty ORDER BY created_at, id");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;

        Ok(rows
            .iter()
            .map(faculty_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn insert_faculty(&self, faculty: NewFaculty) -> Result<Faculty, StoreError> {
        let query = format!(
            "INSERT INTO faculty (id, name, designation, qualification, salary, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {FACULTY_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(&faculty.name)
            .bind(&faculty.designation)
            .bind(&faculty.qualification)
            .bind(faculty.salary)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await?;

        Ok(faculty_from_row(&row)?)
    }

    async fn update_faculty(
        &self,
        id: Uuid,
        fields: &FacultyFields,
    ) -> Result<Option<Faculty>, StoreError> {
        let query = format!(
            "UPDATE faculty SET \
                name = COALESCE($2, name), \
                designation = COALESCE($3, designation), \
                qualification = COALESCE($4, qualification), \
                salary = COALESCE($5, salary), \
                updated_at = $6 \
             WHERE id = $1 RETURNING {FACULTY_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(trimmed(fields.name.as_ref()))
            .bind(trimmed(fields.designation.as_ref()))
            .bind(trimmed(fields.qualification.as_ref()))
            .bind(fields.salary)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await?;

        Ok(row.as_ref().map(faculty_from_row).transpose()?)
    }

    async fn delete_faculty(&self, id: Uuid) -> Result<bool, StoreError> {
        let query = "DELETE FROM faculty WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
