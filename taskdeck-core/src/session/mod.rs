//! Login session: who is signed in and with which bearer token.

pub mod storage;

pub use storage::{
    storage_for, FileSessionStorage, KeyringSessionStorage, MemorySessionStorage, SessionStorage,
    StoredSession,
};

use shared_types::{LoginResponse, User};

use crate::error::{ClientError, Result, SessionError};
use crate::remote::RemoteProjectStore;
use crate::validation::LoginForm;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type AuthObserver = Box<dyn Fn(&AuthState) + Send + Sync>;

/// Current session plus the observers interested in its changes.
pub struct AuthStore {
    state: AuthState,
    storage: Box<dyn SessionStorage>,
    observers: Vec<(SubscriptionId, AuthObserver)>,
    next_subscription: u64,
}

impl AuthStore {
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            state: AuthState::default(),
            storage,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Restore a persisted session. Returns whether one was found.
    pub fn load_from_storage(&mut self) -> std::result::Result<bool, SessionError> {
        match self.storage.load()? {
            Some(session) => {
                tracing::debug!("Restored session for {}", session.user.email);
                self.state = AuthState {
                    user: Some(session.user),
                    token: Some(session.access_token),
                };
                self.notify();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn login(&mut self, user: User, token: String) -> std::result::Result<(), SessionError> {
        self.storage.save(&StoredSession {
            access_token: token.clone(),
            user: user.clone(),
        })?;
        tracing::info!("Logged in as {}", user.email);
        self.state = AuthState {
            user: Some(user),
            token: Some(token),
        };
        self.notify();
        Ok(())
    }

    pub fn logout(&mut self) -> std::result::Result<(), SessionError> {
        self.storage.clear()?;
        self.state = AuthState::default();
        tracing::info!("Logged out");
        self.notify();
        Ok(())
    }

    pub fn on_auth_change(&mut self, observer: impl Fn(&AuthState) + Send + Sync + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.state);
        }
    }
}

/// Validate the login form, exchange it for a token and start the session.
pub async fn sign_in(
    remote: &dyn RemoteProjectStore,
    auth: &mut AuthStore,
    form: &LoginForm,
) -> Result<User> {
    let credentials = form.validate()?;
    let LoginResponse { access_token, user } =
        remote.login(&credentials).await.map_err(|e| {
            tracing::warn!("Login failed for {}: {}", credentials.email, e);
            ClientError::Login(e)
        })?;
    auth.login(user.clone(), access_token)?;
    Ok(user)
}
