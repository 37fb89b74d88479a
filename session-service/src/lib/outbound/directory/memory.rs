use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::Principal;
use crate::domain::session::ports::UserDirectory;
use crate::session::errors::DirectoryError;

/// Directory held in process memory, keyed by normalized email.
///
/// For local runs and tests; production deployments read from Postgres.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    principals: DashMap<EmailAddress, Principal>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a principal.
    pub fn insert(&self, principal: Principal) {
        self.principals.insert(principal.email.clone(), principal);
    }

    pub fn remove(&self, email: &EmailAddress) -> Option<Principal> {
        self.principals.remove(email).map(|(_, principal)| principal)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Principal>, DirectoryError> {
        Ok(self
            .principals
            .get(email)
            .map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use auth::HashedSecret;
    use chrono::Utc;

    use super::*;
    use crate::domain::session::models::PrincipalId;

    fn principal(email: &str) -> Principal {
        Principal {
            id: PrincipalId::new(),
            email: EmailAddress::normalize(email),
            secret_hash: HashedSecret::new("$argon2id$placeholder"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_normalized_email() {
        let directory = InMemoryUserDirectory::new();
        let alice = principal("Alice@Example.com");
        let alice_id = alice.id;
        directory.insert(alice);

        let found = directory
            .find_by_email(&EmailAddress::normalize(" alice@example.COM"))
            .await
            .expect("lookup failed")
            .expect("principal missing");
        assert_eq!(found.id, alice_id);

        let missing = directory
            .find_by_email(&EmailAddress::normalize("bob@example.com"))
            .await
            .expect("lookup failed");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let directory = InMemoryUserDirectory::new();
        directory.insert(principal("a@x.com"));
        assert_eq!(directory.len(), 1);

        assert!(directory.remove(&EmailAddress::normalize("a@x.com")).is_some());
        assert!(directory.is_empty());
    }
}
