use std::sync::Arc;

use crate::gateway::{Fields, Filter, Gateway, GatewayResult};
use crate::users::repo_types::User;

/// Users table access: the generic gateway plus the lookup by email.
#[derive(Clone)]
pub struct UserStore {
    gateway: Arc<dyn Gateway<User>>,
}

impl UserStore {
    pub fn new(gateway: Arc<dyn Gateway<User>>) -> Self {
        Self { gateway }
    }

    pub async fn get(&self, id: i64) -> GatewayResult<Option<User>> {
        self.gateway.get(id).await
    }

    pub async fn list(&self, offset: i64, limit: i64, filters: &[Filter]) -> GatewayResult<Vec<User>> {
        self.gateway.list(offset, limit, filters).await
    }

    pub async fn create(&self, fields: Fields) -> GatewayResult<User> {
        self.gateway.create(fields).await
    }

    pub async fn update(&self, id: i64, fields: Fields) -> GatewayResult<Option<User>> {
        self.gateway.update(id, fields).await
    }

    pub async fn delete(&self, id: i64) -> GatewayResult<bool> {
        self.gateway.delete(id).await
    }

    /// Find a user by exact email.
    pub async fn get_by_email(&self, email: &str) -> GatewayResult<Option<User>> {
        let mut found = self
            .gateway
            .list(0, 1, &[Filter::eq(User::EMAIL, email)])
            .await?;
        Ok(found.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    #[tokio::test]
    async fn get_by_email_is_exact_match() {
        let store = UserStore::new(Arc::new(MemoryGateway::<User>::new()));
        let created = store
            .create(
                Fields::new()
                    .with(User::EMAIL, "user@example.com")
                    .with(User::HASHED_PASSWORD, "x"),
            )
            .await
            .unwrap();

        assert_eq!(store.get_by_email("user@example.com").await.unwrap(), Some(created));
        assert!(store.get_by_email("other@example.com").await.unwrap().is_none());
        assert!(store.get_by_email("user@example").await.unwrap().is_none());
    }
}
