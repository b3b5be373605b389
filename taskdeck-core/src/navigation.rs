//! Which screen a user may see, given whether they are signed in.

use std::fmt;
use std::sync::Arc;

use crate::session::{AuthStore, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Auth,
    Dashboard,
    ProjectDetail(i64),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Auth => "/auth".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::ProjectDetail(id) => format!("/dashboard/projects/{}", id),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Root),
            "/auth" => Some(Route::Auth),
            "/dashboard" => Some(Route::Dashboard),
            _ => trimmed
                .strip_prefix("/dashboard/projects/")
                .and_then(|id| id.parse().ok())
                .map(Route::ProjectDetail),
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Dashboard | Route::ProjectDetail(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Where to send the user instead of `route`, if anywhere.
pub fn redirect_for(route: Route, authenticated: bool) -> Option<Route> {
    match (route, authenticated) {
        (Route::Root, true) | (Route::Auth, true) => Some(Route::Dashboard),
        (Route::Root, false) => Some(Route::Auth),
        (route, false) if route.requires_auth() => Some(Route::Auth),
        _ => None,
    }
}

pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, to: Route);
}

/// Re-checks the current route whenever the session changes.
pub struct RouteGuard {
    subscription: SubscriptionId,
}

impl RouteGuard {
    /// Subscribe to `auth` and apply the redirect policy right away.
    pub fn install(auth: &mut AuthStore, navigator: Arc<dyn Navigator>) -> Self {
        enforce(navigator.as_ref(), auth.is_authenticated());

        let subscription = auth.on_auth_change(move |state| {
            enforce(navigator.as_ref(), state.is_authenticated());
        });
        Self { subscription }
    }

    pub fn uninstall(self, auth: &mut AuthStore) {
        auth.unsubscribe(self.subscription);
    }
}

fn enforce(navigator: &dyn Navigator, authenticated: bool) {
    let current = navigator.current();
    if let Some(target) = redirect_for(current, authenticated) {
        tracing::debug!("Redirecting from {} to {}", current, target);
        navigator.navigate(target);
    }
}
