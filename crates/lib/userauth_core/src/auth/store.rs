//! Credential store contract and an in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;

use super::AuthError;
use crate::models::auth::User;

/// Persistence for user records, keyed by email and by current token.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, AuthError>;

    /// Persist the full record, returning the saved form.
    async fn save(&self, user: User) -> Result<User, AuthError>;
}

/// `UserStore` held in memory.
///
/// Only the token currently stored on a user resolves; saving a user with a
/// new token drops the old index entry.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
    /// token -> email
    tokens: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        let Some(email) = self.tokens.get(token).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        let user = self.users.get(&email).map(|u| u.value().clone());
        match user {
            Some(user) if user.token.as_deref() == Some(token) => Ok(Some(user)),
            _ => {
                // Index entry left behind by concurrent saves of the same user.
                self.tokens.remove_if(token, |_, indexed| *indexed == email);
                Ok(None)
            }
        }
    }

    async fn save(&self, user: User) -> Result<User, AuthError> {
        let previous = self.users.insert(user.email.clone(), user.clone());
        if let Some(old_token) = previous.and_then(|p| p.token)
            && user.token.as_deref() != Some(old_token.as_str())
        {
            self.tokens.remove(&old_token);
        }
        if let Some(token) = &user.token {
            self.tokens.insert(token.clone(), user.email.clone());
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, token: Option<&str>) -> User {
        User {
            email: email.to_string(),
            password: "$2b$10$hash".to_string(),
            token: token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn lookups_by_email_and_token() {
        let store = InMemoryUserStore::new();
        assert!(store.is_empty());
        store.save(user("a@x.com", Some("t1"))).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.token.as_deref(), Some("t1"));
        let by_token = store.find_by_token("t1").await.unwrap().unwrap();
        assert_eq!(by_token.email, "a@x.com");

        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_by_token("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_token_index() {
        let store = InMemoryUserStore::new();
        store.save(user("a@x.com", Some("t1"))).await.unwrap();
        store.save(user("a@x.com", Some("t2"))).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.find_by_token("t1").await.unwrap().is_none());
        assert_eq!(
            store.find_by_token("t2").await.unwrap().unwrap().email,
            "a@x.com"
        );
    }

    #[tokio::test]
    async fn stale_index_entry_does_not_resolve() {
        let store = InMemoryUserStore::new();
        store.save(user("a@x.com", Some("t2"))).await.unwrap();
        store.tokens.insert("t1".to_string(), "a@x.com".to_string());

        assert!(store.find_by_token("t1").await.unwrap().is_none());
        assert!(!store.tokens.contains_key("t1"));
        assert!(store.find_by_token("t2").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_leave_only_the_stored_token_resolvable() {
        let store = std::sync::Arc::new(InMemoryUserStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let token = format!("t{i}");
                    store.save(user("a@x.com", Some(&token))).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let current = stored.token.unwrap();
        for i in 0..16 {
            let token = format!("t{i}");
            let found = store.find_by_token(&token).await.unwrap();
            assert_eq!(found.is_some(), token == current, "{token}");
        }
    }

    #[tokio::test]
    async fn user_without_token_is_not_indexed() {
        let store = InMemoryUserStore::new();
        store.save(user("a@x.com", None)).await.unwrap();
        assert!(store.find_by_token("").await.unwrap().is_none());
    }
}
