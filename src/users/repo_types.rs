use serde::Serialize;
use sqlx::FromRow;

use crate::gateway::{Entity, Fields, GatewayError, GatewayResult, Value};

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,        // generated, never reassigned
    pub email: String,  // unique across users
    #[serde(skip_serializing)]
    pub hashed_password: String, // never exposed in JSON
    pub is_active: bool,
}

impl User {
    pub const EMAIL: &'static str = "email";
    pub const HASHED_PASSWORD: &'static str = "hashed_password";
    pub const IS_ACTIVE: &'static str = "is_active";
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[User::EMAIL, User::HASHED_PASSWORD, User::IS_ACTIVE];
    const UNIQUE: &'static [&'static str] = &[User::EMAIL];

    fn id(&self) -> i64 {
        self.id
    }

    fn get(&self, column: &str) -> Option<Value> {
        match column {
            "id" => Some(Value::Int(self.id)),
            User::EMAIL => Some(Value::Text(self.email.clone())),
            User::HASHED_PASSWORD => Some(Value::Text(self.hashed_password.clone())),
            User::IS_ACTIVE => Some(Value::Bool(self.is_active)),
            _ => None,
        }
    }

    fn set(&mut self, column: &'static str, value: Value) -> GatewayResult<()> {
        match (column, value) {
            (User::EMAIL, Value::Text(v)) => self.email = v,
            (User::HASHED_PASSWORD, Value::Text(v)) => self.hashed_password = v,
            (User::IS_ACTIVE, Value::Bool(v)) => self.is_active = v,
            (User::EMAIL | User::HASHED_PASSWORD | User::IS_ACTIVE, _) => {
                return Err(GatewayError::TypeMismatch(column))
            }
            _ => return Err(GatewayError::UnknownField(column.to_string())),
        }
        Ok(())
    }

    fn from_fields(id: i64, fields: &Fields) -> GatewayResult<Self> {
        if !fields.contains(User::EMAIL) {
            return Err(GatewayError::MissingField(User::EMAIL));
        }
        if !fields.contains(User::HASHED_PASSWORD) {
            return Err(GatewayError::MissingField(User::HASHED_PASSWORD));
        }
        // Mirrors the column default in the users migration.
        let mut user = User {
            id,
            email: String::new(),
            hashed_password: String::new(),
            is_active: true,
        };
        for (column, value) in fields.iter() {
            user.set(column, value.clone())?;
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_omits_hashed_password() {
        let user = User {
            id: 1,
            email: "test@example.com".into(),
            hashed_password: "secret".into(),
            is_active: true,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn from_fields_defaults_is_active_to_true() {
        let fields = Fields::new()
            .with(User::EMAIL, "a@b.io")
            .with(User::HASHED_PASSWORD, "x");
        let user = User::from_fields(9, &fields).unwrap();
        assert_eq!(user.id, 9);
        assert!(user.is_active);
    }

    #[test]
    fn from_fields_requires_email_and_password() {
        let err = User::from_fields(1, &Fields::new().with(User::EMAIL, "a@b.io")).unwrap_err();
        assert!(matches!(err, GatewayError::MissingField("hashed_password")));
    }

    #[test]
    fn set_rejects_wrong_value_type() {
        let mut user = User::from_fields(
            1,
            &Fields::new().with(User::EMAIL, "a@b.io").with(User::HASHED_PASSWORD, "x"),
        )
        .unwrap();
        let err = user.set(User::IS_ACTIVE, Value::Text("yes".into())).unwrap_err();
        assert!(matches!(err, GatewayError::TypeMismatch("is_active")));
    }
}
