//! HTTP client for the task/user REST API.

use std::time::Duration;

use reqwest::{Client, Response};
use taskboard_proto::api::{ErrorBody, TASKS_PATH, USERS_PATH, task_path};
use taskboard_proto::codec;
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::User;
use url::Url;

use super::{ApiError, TaskApi};

/// [`TaskApi`] over HTTP/JSON using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    /// Creates a client for the backend at `base_url` (e.g. `http://127.0.0.1:4200`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Url`] if `base_url` does not parse, or
    /// [`ApiError::Request`] if the underlying client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Returns the backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }
}

/// Turns a non-success response into [`ApiError::Status`].
async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body).map_or(body, |b| b.error);
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

impl TaskApi for HttpApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let resp = self.client.get(self.url(TASKS_PATH)?).send().await?;
        let body = check(resp).await?.bytes().await?;
        Ok(codec::decode_tasks(&body)?)
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let resp = self.client.get(self.url(USERS_PATH)?).send().await?;
        let body = check(resp).await?.bytes().await?;
        Ok(codec::decode_users(&body)?)
    }

    async fn create_task(&self, task: &Task) -> Result<Task, ApiError> {
        let resp = self
            .client
            .post(self.url(TASKS_PATH)?)
            .json(task)
            .send()
            .await?;
        let body = check(resp).await?.bytes().await?;
        Ok(codec::decode(&body)?)
    }

    async fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
        let resp = self
            .client
            .put(self.url(TASKS_PATH)?)
            .json(task)
            .send()
            .await?;
        let body = check(resp).await?.bytes().await?;
        Ok(codec::decode(&body)?)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&task_path(id))?)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
