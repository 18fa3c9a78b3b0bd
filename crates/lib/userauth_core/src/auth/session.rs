//! Request-scoped holder for the authenticated user.
//!
//! Either thread a [`Session`] through the request explicitly, or run the
//! request inside [`scope`] and use the free functions, which read a tokio
//! task-local. Neither is shared between concurrent requests.

use std::cell::RefCell;
use std::future::Future;

use super::AuthError;
use crate::models::auth::User;

/// Current-user slot for a single request.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `user` as the current user and return it.
    pub fn set_current_user(&mut self, user: User) -> &User {
        self.current.insert(user)
    }

    pub fn current_user(&self) -> Result<&User, AuthError> {
        self.current.as_ref().ok_or(AuthError::NoCurrentUser)
    }

    /// Remove the current user, returning it if one was set.
    pub fn clear_current_user(&mut self) -> Option<User> {
        self.current.take()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}

tokio::task_local! {
    static CURRENT_SESSION: RefCell<Session>;
}

/// Run `fut` with a fresh, empty session. The session is dropped when `fut` completes.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    CURRENT_SESSION
        .scope(RefCell::new(Session::new()), fut)
        .await
}

/// Set the current user of the enclosing [`scope`] and return it.
pub fn set_current_user(user: User) -> Result<User, AuthError> {
    with_session(|s| s.set_current_user(user).clone())
}

/// Current user of the enclosing [`scope`].
pub fn current_user() -> Result<User, AuthError> {
    with_session(|s| s.current_user().cloned())?
}

/// Clear the current user of the enclosing [`scope`].
pub fn clear_current_user() -> Result<Option<User>, AuthError> {
    with_session(Session::clear_current_user)
}

fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> Result<R, AuthError> {
    CURRENT_SESSION
        .try_with(|cell| f(&mut cell.borrow_mut()))
        .map_err(|_| AuthError::NoSession)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn user(email: &str) -> User {
        User::new(email, "$2b$10$hash")
    }

    #[test]
    fn explicit_session_lifecycle() {
        let mut session = Session::new();
        assert!(matches!(
            session.current_user(),
            Err(AuthError::NoCurrentUser)
        ));

        let set = session.set_current_user(user("a@x.com"));
        assert_eq!(set.email, "a@x.com");
        assert!(session.is_authenticated());
        assert_eq!(session.current_user().unwrap().email, "a@x.com");

        let cleared = session.clear_current_user().unwrap();
        assert_eq!(cleared.email, "a@x.com");
        assert!(!session.is_authenticated());
        assert!(session.clear_current_user().is_none());
    }

    #[tokio::test]
    async fn task_local_requires_scope() {
        assert!(matches!(current_user(), Err(AuthError::NoSession)));
        assert!(matches!(
            set_current_user(user("a@x.com")),
            Err(AuthError::NoSession)
        ));
    }

    #[tokio::test]
    async fn task_local_lifecycle() {
        scope(async {
            assert!(matches!(current_user(), Err(AuthError::NoCurrentUser)));
            let returned = set_current_user(user("a@x.com")).unwrap();
            assert_eq!(returned.email, "a@x.com");
            assert_eq!(current_user().unwrap().email, "a@x.com");
            assert_eq!(clear_current_user().unwrap().unwrap().email, "a@x.com");
            assert!(matches!(current_user(), Err(AuthError::NoCurrentUser)));
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_scopes_are_isolated() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                tokio::spawn(scope(async move {
                    let email = format!("user{i}@x.com");
                    set_current_user(user(&email)).unwrap();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    tokio::task::yield_now().await;
                    assert_eq!(current_user().unwrap().email, email);
                }))
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn scope_starts_empty_each_time() {
        scope(async {
            set_current_user(user("a@x.com")).unwrap();
        })
        .await;
        scope(async {
            assert!(matches!(current_user(), Err(AuthError::NoCurrentUser)));
        })
        .await;
    }
}
