use tracing::{debug, info, instrument, warn};

use crate::gateway::{Fields, Filter, GatewayError};
use crate::users::error::{UserError, UserResult};
use crate::users::password::hash_password;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

/// Validated input for user creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub is_active: bool,
    pub password: String,
}

/// Update mask: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// Business rules for user accounts. Every mutation goes through here.
#[derive(Clone)]
pub struct UserService {
    store: UserStore,
}

/// A unique-index hit on write means another request claimed the email
/// between our pre-check and the write.
fn duplicate_on_conflict(email: &str) -> impl FnOnce(GatewayError) -> UserError + '_ {
    move |err| match err {
        GatewayError::UniqueViolation { constraint } => {
            warn!(%email, %constraint, "email claimed concurrently");
            UserError::DuplicateEmail(email.to_owned())
        }
        other => other.into(),
    }
}

impl UserService {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUser) -> UserResult<User> {
        if self.store.get_by_email(&input.email).await?.is_some() {
            warn!("email already registered");
            return Err(UserError::DuplicateEmail(input.email));
        }

        let fields = Fields::new()
            .with(User::EMAIL, input.email.as_str())
            .with(User::HASHED_PASSWORD, hash_password(&input.password))
            .with(User::IS_ACTIVE, input.is_active);

        let user = self
            .store
            .create(fields)
            .await
            .map_err(duplicate_on_conflict(&input.email))?;

        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> UserResult<User> {
        self.store.get(id).await?.ok_or(UserError::NotFound(id))
    }

    pub async fn list_users(
        &self,
        skip: i64,
        limit: i64,
        is_active: Option<bool>,
    ) -> UserResult<Vec<User>> {
        let filters: Vec<Filter> = is_active
            .map(|flag| Filter::eq(User::IS_ACTIVE, flag))
            .into_iter()
            .collect();
        let users = self.store.list(skip, limit, &filters).await?;
        debug!(count = users.len(), skip, limit, ?is_active, "users listed");
        Ok(users)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> UserResult<User> {
        let current = self.get_user(id).await?;

        if let Some(email) = patch.email.as_deref() {
            if email != current.email && self.store.get_by_email(email).await?.is_some() {
                warn!(%email, "email already registered");
                return Err(UserError::DuplicateEmail(email.to_owned()));
            }
        }

        let mut fields = Fields::new();
        if let Some(email) = &patch.email {
            fields.insert(User::EMAIL, email.as_str());
        }
        if let Some(is_active) = patch.is_active {
            fields.insert(User::IS_ACTIVE, is_active);
        }
        if let Some(password) = &patch.password {
            fields.insert(User::HASHED_PASSWORD, hash_password(password));
        }

        let email = patch.email.unwrap_or(current.email);
        let updated = self
            .store
            .update(id, fields)
            .await
            .map_err(duplicate_on_conflict(&email))?
            .ok_or(UserError::NotFound(id))?;

        info!(user_id = id, "user updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        if !self.store.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }
}
