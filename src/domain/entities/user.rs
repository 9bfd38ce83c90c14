//! User account entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::domain::document::{CollectionSpec, Document, Resource};
use crate::domain::query::Filter;
use crate::error::AppError;

pub const DEFAULT_PHOTO: &str = "default.jpg";

/// Account role. Serialized as `user`, `guide`, `lead-guide` or `admin`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "guide" => Ok(Role::Guide),
            "lead-guide" => Ok(Role::LeadGuide),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::bad_request(
                format!("Unknown role '{other}'"),
                Value::Null,
            )),
        }
    }
}

/// A registered account.
///
/// `password_hash` is stored under the `password` key and, together with the
/// reset-token fields and `active`, never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[serde(with = "crate::domain::document::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

fn default_active() -> bool {
    true
}

impl User {
    /// Returns true when the password changed after a token issued at
    /// `issued_at` (seconds since epoch). The change time is backdated by one
    /// second so a token issued right after a change stays valid.
    pub fn was_password_changed_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| (changed - Duration::seconds(1)).timestamp() > issued_at)
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub photo: Option<String>,
}

/// Partial update of profile fields. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[validate(length(min = 1, message = "Please tell us your name"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role: Option<Role>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Document for User {
    const COLLECTION: CollectionSpec = CollectionSpec {
        name: "users",
        unique_keys: &[&["email"]],
    };
    const LABEL: &'static str = "user";
    const PRIVATE_FIELDS: &'static [&'static str] = &[
        "password",
        "active",
        "passwordResetToken",
        "passwordResetExpires",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    /// Deactivated accounts are invisible to every read.
    fn scope() -> Filter {
        Filter::new().ne("active", false)
    }
}

impl Resource for User {
    type Create = NewUser;
    type Update = UserPatch;

    fn create(input: NewUser, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError> {
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            email: normalize_email(&input.email),
            photo: input.photo.unwrap_or_else(default_photo),
            role: input.role,
            password_hash: input.password_hash,
            active: true,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
        })
    }

    fn apply(&mut self, patch: UserPatch) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        if let Some(photo) = patch.photo {
            self.photo = photo;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        Ok(())
    }
}
