//! DTOs for profile and user administration endpoints.

use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::domain::entities::{Role, UserPatch};
use crate::error::AppError;
use crate::utils::validation::validate_password_strength;

/// Profile update from the signed-in user.
///
/// Password fields are captured only to reject them: passwords change
/// through `/update-password`. Presence is what counts, so an explicit
/// `null` is rejected too.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Please tell us your name"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role: Option<Role>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub password: Option<Option<Value>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub password_confirm: Option<Option<Value>>,
}

impl UpdateProfileRequest {
    /// Converts into a patch, rejecting any password field.
    pub fn into_patch(self) -> Result<UserPatch, AppError> {
        if self.password.is_some() || self.password_confirm.is_some() {
            return Err(AppError::bad_request(
                "This route is not for password updates. Please use /update-password.",
                Value::Null,
            ));
        }

        Ok(UserPatch {
            name: self.name,
            email: self.email,
            photo: self.photo,
            role: self.role,
        })
    }
}

/// Account creation by an admin.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_confirmation"))]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Please tell us your name"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub role: Role,
}

fn validate_create_confirmation(req: &CreateUserRequest) -> Result<(), ValidationError> {
    if req.password == req.password_confirm {
        Ok(())
    } else {
        Err(ValidationError::new("password_confirm").with_message("Passwords are not the same!".into()))
    }
}
