//! Documents and request/response payloads shared by the server and the client.
//!
//! Documents serialize their identifier as `_id` and timestamps in camelCase so
//! existing front ends built against the document-store API keep working.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::token::SessionClaims;

/// Account role, used for landing-page routing after login.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Faculty,
    Staff,
    Management,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Staff => "staff",
            Self::Management => "management",
        }
    }

    /// Landing route a client navigates to after a successful login.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Student => "/students",
            Self::Faculty => "/faculty",
            Self::Staff => "/staff",
            Self::Management => "/management",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "staff" => Ok(Self::Staff),
            "management" => Ok(Self::Management),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Stored account. Never serialized: the password hash stays server side.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub branch: String,
    pub cgpa: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated student ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub branch: String,
    pub cgpa: f64,
}

/// Student fields as sent by clients: every field is required on create,
/// any subset may be sent on update.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StudentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(
        default,
        deserialize_with = "number::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cgpa: Option<f64>,
}

impl StudentFields {
    /// Check a create payload: all fields present and well typed.
    ///
    /// # Errors
    /// Returns a message naming the first missing or invalid field.
    pub fn require(&self) -> Result<NewStudent, String> {
        self.check()?;
        Ok(NewStudent {
            name: required("name", self.name.as_deref())?,
            branch: required("branch", self.branch.as_deref())?,
            cgpa: self.cgpa.ok_or_else(|| "cgpa is required".to_string())?,
        })
    }

    /// Check an update payload: supplied fields must be well typed.
    ///
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn check(&self) -> Result<(), String> {
        blank_check("name", self.name.as_deref())?;
        blank_check("branch", self.branch.as_deref())?;
        finite_check("cgpa", self.cgpa)
    }

    /// Merge the supplied fields into `student`, leaving the rest untouched.
    pub fn apply(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name = name.trim().to_string();
        }
        if let Some(branch) = &self.branch {
            student.branch = branch.trim().to_string();
        }
        if let Some(cgpa) = self.cgpa {
            student.cgpa = cgpa;
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub designation: String,
    pub qualification: String,
    pub salary: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFaculty {
    pub name: String,
    pub designation: String,
    pub qualification: String,
    pub salary: f64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FacultyFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(
        default,
        deserialize_with = "number::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary: Option<f64>,
}

impl FacultyFields {
    /// # Errors
    /// Returns a message naming the first missing or invalid field.
    pub fn require(&self) -> Result<NewFaculty, String> {
        self.check()?;
        Ok(NewFaculty {
            name: required("name", self.name.as_deref())?,
            designation: required("designation", self.designation.as_deref())?,
            qualification: required("qualification", self.qualification.as_deref())?,
            salary: self
                .salary
                .ok_or_else(|| "salary is required".to_string())?,
        })
    }

    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn check(&self) -> Result<(), String> {
        blank_check("name", self.name.as_deref())?;
        blank_check("designation", self.designation.as_deref())?;
        blank_check("qualification", self.qualification.as_deref())?;
        finite_check("salary", self.salary)
    }

    pub fn apply(&self, faculty: &mut Faculty) {
        if let Some(name) = &self.name {
            faculty.name = name.trim().to_string();
        }
        if let Some(designation) = &self.designation {
            faculty.designation = designation.trim().to_string();
        }
        if let Some(qualification) = &self.qualification {
            faculty.qualification = qualification.trim().to_string();
        }
        if let Some(salary) = self.salary {
            faculty.salary = salary;
        }
    }
}

/// Register and login payload. `uname` is accepted for older clients.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct Credentials {
    #[serde(alias = "uname")]
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct Feedback {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Feedback {
    /// # Errors
    /// Returns a message when a field is blank or the email is malformed.
    pub fn check(&self) -> Result<(), String> {
        required("name", Some(&self.name))?;
        required("message", Some(&self.message))?;
        if !valid_email(self.email.trim()) {
            return Err("Invalid email".to_string());
        }
        Ok(())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct TokenCheck {
    pub message: String,
    pub user: SessionClaims,
}

/// Email check: a dotted domain, and an address the mail relay can carry.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
        && email.parse::<lettre::Address>().is_ok()
}

fn required(field: &str, value: Option<&str>) -> Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{field} is required")),
    }
}

fn blank_check(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("{field} must not be empty")),
        _ => Ok(()),
    }
}

fn finite_check(field: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() => Err(format!("{field} must be a number")),
        _ => Ok(()),
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings from form inputs.
mod number {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(n)) => Ok(Some(n)),
            Some(NumberOrText::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got {text:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> Student {
        let now = Utc::now();
        Student {
            id: Uuid::now_v7(),
            name: "Asha".to_string(),
            branch: "CSE".to_string(),
            cgpa: 8.1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_parses_and_routes() {
        assert_eq!("Faculty".parse::<Role>(), Ok(Role::Faculty));
        assert!("dean".parse::<Role>().is_err());
        assert_eq!(Role::Student.home_path(), "/students");
        assert_eq!(Role::Management.home_path(), "/management");
        assert_eq!(Role::default(), Role::Student);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Staff).unwrap();
        assert_eq!(json, "\"staff\"");
    }

    #[test]
    fn student_fields_accept_numeric_strings() {
        let fields: StudentFields =
            serde_json::from_str(r#"{"name":"Asha","branch":"CSE","cgpa":"8.75"}"#).unwrap();
        assert_eq!(fields.cgpa, Some(8.75));
        let fields: StudentFields = serde_json::from_str(r#"{"cgpa":9}"#).unwrap();
        assert_eq!(fields.cgpa, Some(9.0));
    }

    #[test]
    fn student_fields_reject_non_numeric_cgpa() {
        let result = serde_json::from_str::<StudentFields>(r#"{"cgpa":"excellent"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn require_reports_missing_field() {
        let fields = StudentFields {
            name: Some("Asha".to_string()),
            branch: None,
            cgpa: Some(7.0),
        };
        assert_eq!(fields.require(), Err("branch is required".to_string()));

        let fields = StudentFields {
            name: Some("   ".to_string()),
            branch: Some("ECE".to_string()),
            cgpa: Some(7.0),
        };
        assert!(fields.require().is_err());
    }

    #[test]
    fn apply_merges_only_supplied_fields() {
        let mut s = student();
        let patch = StudentFields {
            cgpa: Some(9.2),
            ..StudentFields::default()
        };
        patch.apply(&mut s);
        assert_eq!(s.name, "Asha");
        assert_eq!(s.branch, "CSE");
        assert!((s.cgpa - 9.2).abs() < f64::EPSILON);
    }

    #[test]
    fn faculty_require_and_check() {
        let fields = FacultyFields {
            name: Some("Dr. Rao".to_string()),
            designation: Some("Professor".to_string()),
            qualification: Some("PhD".to_string()),
            salary: Some(120_000.0),
        };
        let faculty = fields.require().unwrap();
        assert_eq!(faculty.designation, "Professor");

        let bad = FacultyFields {
            salary: Some(f64::NAN),
            ..FacultyFields::default()
        };
        assert_eq!(bad.check(), Err("salary must be a number".to_string()));
    }

    #[test]
    fn credentials_accept_uname_alias() {
        let creds: Credentials =
            serde_json::from_str(r#"{"uname":"asha","password":"pw","role":"staff"}"#).unwrap();
        assert_eq!(creds.username, "asha");
        assert_eq!(creds.role, Some(Role::Staff));
    }

    #[test]
    fn student_serializes_document_shape() {
        let value = serde_json::to_value(student()).unwrap();
        assert!(value.get("_id").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn feedback_check() {
        let feedback = Feedback {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            message: "Great labs".to_string(),
        };
        assert!(feedback.check().is_ok());

        let feedback = Feedback {
            email: "not-an-email".to_string(),
            ..feedback
        };
        assert_eq!(feedback.check(), Err("Invalid email".to_string()));
    }

    #[test]
    fn valid_email_rejects_unsendable_addresses() {
        assert!(valid_email("asha@campus.dev"));
        assert!(!valid_email("a<b@x.y"));
        assert!(!valid_email("a,b@x.y"));
        assert!(!valid_email("asha@localhost"));
    }
}
