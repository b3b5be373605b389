use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared_types::{
    ErrorResponse, LoginRequest, LoginResponse, NewTask, Project, ProjectsPageResponse, Task,
};
use std::sync::RwLock;
use std::time::Duration;

use super::RemoteProjectStore;
use crate::config::ApiConfig;
use crate::error::RemoteError;

/// `RemoteProjectStore` over HTTP with reqwest.
pub struct HttpProjectStore {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpProjectStore {
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Attach (or drop) the bearer token sent with every request.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().unwrap_or_else(|e| e.into_inner());
        match token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = self.authorize(request).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl RemoteProjectStore for HttpProjectStore {
    async fn list_projects(&self, page: u32, page_size: u32) -> Result<ProjectsPageResponse, RemoteError> {
        tracing::debug!("GET /projects page={} per_page={}", page, page_size);
        let request = self
            .client
            .get(self.url("projects"))
            .query(&[("_page", page), ("_per_page", page_size)]);
        self.send(request).await
    }

    async fn list_all_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.send(self.client.get(self.url("projects"))).await
    }

    async fn get_project(&self, id: i64) -> Result<Project, RemoteError> {
        self.send(self.client.get(self.url(&format!("projects/{}", id))))
            .await
    }

    async fn update_project(&self, id: i64, project: &Project) -> Result<Project, RemoteError> {
        tracing::debug!("PUT /projects/{}", id);
        let request = self
            .client
            .put(self.url(&format!("projects/{}", id)))
            .json(project);
        self.send(request).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        self.send(self.client.get(self.url("tasks"))).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, RemoteError> {
        tracing::debug!("POST /tasks for project {}", task.project_id);
        self.send(self.client.post(self.url("tasks")).json(task))
            .await
    }

    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, RemoteError> {
        let response = self
            .client
            .post(self.url("login"))
            .json(credentials)
            .send()
            .await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base_url: &str) -> HttpProjectStore {
        HttpProjectStore::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_url_joining() {
        let store = store("http://localhost:8000/");
        assert_eq!(store.url("projects"), "http://localhost:8000/projects");
        assert_eq!(store.url("/tasks"), "http://localhost:8000/tasks");
    }

    #[test]
    fn test_bearer_token_is_attached() {
        let store = store("http://localhost:8000");
        store.set_token(Some("abc123".to_string()));

        let request = store
            .authorize(store.client.get(store.url("projects")))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );

        store.set_token(None);
        let request = store
            .authorize(store.client.get(store.url("projects")))
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_page_query_parameters() {
        let store = store("http://localhost:8000");
        let request = store
            .client
            .get(store.url("projects"))
            .query(&[("_page", 2u32), ("_per_page", 10u32)])
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("_page=2&_per_page=10"));
    }
}
