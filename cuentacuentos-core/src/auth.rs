use crate::api::{ApiClient, User};
use crate::error::ClientError;
use crate::session::{Session, SessionStore};
use log::{info, warn};
use std::sync::Arc;

/// Login, registration, logout and session restore on top of an [`ApiClient`].
pub struct AuthManager {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
}

impl AuthManager {
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self
            .client
            .session()
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut session)
    }

    pub fn current_user(&self) -> Option<User> {
        self.with_session(|s| s.user().cloned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.with_session(|s| s.is_authenticated())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let token = self.client.login(username, password).await?;
        self.with_session(|s| s.set_token(token.access_token.clone()));
        self.store.save(&token.access_token)?;

        let user = self.client.me().await?;
        self.with_session(|s| s.set_user(user.clone()));
        info!("Logged in as {}", user.username);
        Ok(user)
    }

    /// Register, then log in with the same credentials.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<User, ClientError> {
        self.client.register(username, password, email).await?;
        info!("Registered {}, logging in", username);
        self.login(username, password).await
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.with_session(Session::clear);
        self.store.clear()?;
        info!("Session closed");
        Ok(())
    }

    /// Pick up a saved token. A token the server rejects with 401 is discarded.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        let Some(token) = self.store.load()? else {
            info!("No saved session");
            return Ok(None);
        };

        self.with_session(|s| s.set_token(token));
        match self.client.me().await {
            Ok(user) => {
                self.with_session(|s| s.set_user(user.clone()));
                info!("Session restored for {}", user.username);
                Ok(Some(user))
            }
            Err(e) if e.status() == Some(401) => {
                warn!("Saved session is no longer valid, clearing it: {}", e);
                self.with_session(Session::clear);
                self.store.clear()?;
                Ok(None)
            }
            // The server may just be unreachable, keep the token for the next request
            Err(e) => {
                warn!("Could not verify saved session: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::MemorySessionStore;
    use crate::test_server;

    fn manager_at(base_url: &str, store: Arc<MemorySessionStore>) -> AuthManager {
        let client = ApiClient::new(ClientConfig::new(base_url), Session::new().into_shared()).unwrap();
        AuthManager::new(client, store)
    }

    fn offline_manager(store: Arc<MemorySessionStore>) -> AuthManager {
        manager_at("http://127.0.0.1:9", store)
    }

    #[tokio::test]
    async fn test_restore_without_saved_token() {
        let manager = offline_manager(Arc::new(MemorySessionStore::new()));
        assert_eq!(manager.restore().await.unwrap(), None);
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_keeps_token_when_server_unreachable() {
        let store = Arc::new(MemorySessionStore::new());
        store.save("saved").unwrap();
        let manager = offline_manager(store.clone());

        assert_eq!(manager.restore().await.unwrap(), None);
        assert!(manager.is_authenticated());
        assert!(manager.current_user().is_none());
        assert_eq!(store.load().unwrap(), Some("saved".to_string()));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_no_session() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = offline_manager(store.clone());

        assert!(manager.login("ana", "secret").await.is_err());
        assert!(!manager.is_authenticated());
        assert!(manager.current_user().is_none());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_logout_clears_session_and_store() {
        let store = Arc::new(MemorySessionStore::new());
        store.save("tok").unwrap();
        let manager = offline_manager(store.clone());
        manager.with_session(|s| s.set_token("tok"));

        manager.logout().unwrap();
        assert!(!manager.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_discards_rejected_token() {
        let (base_url, _) = test_server::serve(401, r#"{"detail":"Token expired"}"#).await;
        let store = Arc::new(MemorySessionStore::new());
        store.save("expired").unwrap();
        let manager = manager_at(&base_url, store.clone());

        assert_eq!(manager.restore().await.unwrap(), None);
        assert!(!manager.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_accepted_token() {
        let (base_url, requests) =
            test_server::serve(200, r#"{"id":7,"username":"ana","email":"ana@example.com"}"#).await;
        let store = Arc::new(MemorySessionStore::new());
        store.save("valid").unwrap();
        let manager = manager_at(&base_url, store.clone());

        let user = manager.restore().await.unwrap().unwrap();
        assert_eq!(user.username, "ana");
        assert_eq!(manager.current_user(), Some(user));
        assert!(manager.is_authenticated());
        assert_eq!(store.load().unwrap(), Some("valid".to_string()));
        assert!(requests.lock().unwrap()[0].starts_with("GET /users/me "));
    }
}
