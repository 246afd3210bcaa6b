use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::users::error::{FieldError, UserError};
use crate::users::repo_types::User;
use crate::users::services::{NewUser, UserPatch};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "value is not a valid email address"));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        errors.push(FieldError::new(
            "password",
            format!("must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"),
        ));
    }
}

/// Request body for user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, UserError> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }
        Ok(NewUser {
            email: self.email,
            is_active: self.is_active.unwrap_or(true),
            password: self.password,
        })
    }
}

/// Request body for a partial update; at least one field is required.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserPatch, UserError> {
        if self.email.is_none() && self.is_active.is_none() && self.password.is_none() {
            return Err(UserError::Validation(vec![FieldError::new(
                "body",
                "at least one of email, is_active or password must be supplied",
            )]));
        }
        let mut errors = Vec::new();
        if let Some(email) = &self.email {
            check_email(email, &mut errors);
        }
        if let Some(password) = &self.password {
            check_password(password, &mut errors);
        }
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }
        Ok(UserPatch {
            email: self.email,
            is_active: self.is_active,
            password: self.password,
        })
    }
}

/// Query string for `GET /users`.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub is_active: Option<bool>,
}

fn default_limit() -> u32 {
    100
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            is_active: None,
            password: password.into(),
        }
    }

    fn field_names(err: UserError) -> Vec<String> {
        match err {
            UserError::Validation(fields) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user example@x.io"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn create_defaults_is_active_to_true() {
        let new_user = create("user@example.com", "string123").validate().unwrap();
        assert!(new_user.is_active);
    }

    #[test]
    fn create_keeps_explicit_is_active() {
        let req = CreateUserRequest {
            is_active: Some(false),
            ..create("user@example.com", "string123")
        };
        assert!(!req.validate().unwrap().is_active);
    }

    #[test]
    fn create_reports_every_bad_field() {
        let err = create("nope", "short").validate().unwrap_err();
        assert_eq!(field_names(err), vec!["email", "password"]);
    }

    #[test]
    fn password_bounds_are_inclusive() {
        assert!(create("u@x.io", &"a".repeat(8)).validate().is_ok());
        assert!(create("u@x.io", &"a".repeat(128)).validate().is_ok());
        assert!(create("u@x.io", &"a".repeat(7)).validate().is_err());
        assert!(create("u@x.io", &"a".repeat(129)).validate().is_err());
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = UpdateUserRequest::default().validate().unwrap_err();
        assert_eq!(field_names(err), vec!["body"]);
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let patch = UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.is_active, Some(false));
        assert!(patch.email.is_none());

        let err = UpdateUserRequest {
            password: Some("short".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(field_names(err), vec!["password"]);
    }

    #[test]
    fn null_fields_count_as_absent() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"email": null, "is_active": null}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn list_query_defaults() {
        let q: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert_eq!((q.skip, q.limit, q.is_active), (0, 100, None));
    }
}
