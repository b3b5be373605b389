use shared_types::User;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::fetch::Fetcher;
use crate::mutation::Coordinator;
use crate::notify::Notifier;
use crate::remote::{HttpProjectStore, RemoteProjectStore};
use crate::session::{self, storage_for, AuthStore};
use crate::state::{DashboardState, SharedState};
use crate::validation::LoginForm;

/// Everything a dashboard front end needs, wired from one config.
pub struct Dashboard {
    http: Arc<HttpProjectStore>,
    state: SharedState,
    fetcher: Fetcher,
    coordinator: Coordinator,
    auth: AuthStore,
}

impl Dashboard {
    /// Build the client and restore any persisted session.
    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let dashboard = config.dashboard();
        let http = Arc::new(HttpProjectStore::new(&config.api()).map_err(ClientError::Fetch)?);
        let remote: Arc<dyn RemoteProjectStore> = http.clone();

        let state = SharedState::new(DashboardState::new(chrono::Duration::seconds(
            dashboard.stale_after_secs,
        )));
        let fetcher = Fetcher::new(remote.clone(), state.clone(), dashboard.page_size);
        let coordinator = Coordinator::new(remote, state.clone(), notifier);

        let mut auth = AuthStore::new(storage_for(&config.session()));
        if auth.load_from_storage()? {
            http.set_token(auth.token().map(str::to_string));
        }

        Ok(Self {
            http,
            state,
            fetcher,
            coordinator,
            auth,
        })
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// The signed-in user, or `NotAuthenticated`.
    pub fn require_session(&self) -> Result<&User> {
        match (self.auth.user(), self.auth.is_authenticated()) {
            (Some(user), true) => Ok(user),
            _ => Err(ClientError::NotAuthenticated),
        }
    }

    pub async fn sign_in(&mut self, form: &LoginForm) -> Result<User> {
        let user = session::sign_in(self.http.as_ref(), &mut self.auth, form).await?;
        self.http.set_token(self.auth.token().map(str::to_string));
        Ok(user)
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.auth.logout()?;
        self.http.set_token(None);
        Ok(())
    }
}
