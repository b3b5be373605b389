pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod mutation;
pub mod navigation;
pub mod notify;
pub mod remote;
pub mod session;
pub mod state;
pub mod stats;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testing;

pub use cache::{CacheKey, QueryCache};
pub use config::ClientConfig;
pub use dashboard::Dashboard;
pub use error::{ClientError, RemoteError, Result, SessionError};
pub use fetch::{Fetcher, PageOutcome};
pub use mutation::{Coordinator, MutationOutcome, Phase};
pub use notify::{Notice, Notifier, TracingNotifier};
pub use remote::{HttpProjectStore, RemoteProjectStore};
pub use session::{AuthState, AuthStore};
pub use state::{DashboardState, SharedState};
pub use stats::ProjectStats;
pub use store::ProjectListState;
pub use validation::{LoginForm, ProjectForm, TaskForm, ValidationErrors};
