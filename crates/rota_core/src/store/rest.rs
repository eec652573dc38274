use crate::config::StoreCredentials;
use crate::error::AppError;
use crate::model::{NewTask, Task, TaskPatch};
use crate::store::{Column, Filter, TaskQuery, TaskStore, validate_rows};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

/// Table access over the PostgREST interface of a hosted database.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: String,
    key: String,
}

impl RestStore {
    pub fn new(
        credentials: &StoreCredentials,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(AppError::invalid_data("table name is required"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                AppError::store_unavailable(format!("failed to create HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                credentials.url.trim_end_matches('/'),
                table
            ),
            key: credentials.key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method, params: &[(String, String)]) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .query(params)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
    }

    fn rows(&self, action: &str, response: Response) -> Result<Vec<Task>, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AppError::store_unavailable(format!(
                "{action} returned status {status}: {}",
                body.trim()
            )));
        }

        let rows: Vec<Task> = response.json().map_err(|err| {
            AppError::store_unavailable(format!("{action} returned unreadable rows: {err}"))
        })?;
        debug!(action, rows = rows.len(), "store call finished");
        Ok(rows)
    }

    fn send(&self, action: &str, builder: RequestBuilder) -> Result<Vec<Task>, AppError> {
        let response = builder.send().map_err(|err| {
            AppError::store_unavailable(format!("{action} failed: {err}"))
        })?;
        self.rows(action, response)
    }
}

fn id_params(id: i64, guards: &[Filter]) -> Vec<(String, String)> {
    let mut params = vec![Filter::eq(Column::Id, id.to_string()).to_param()];
    params.extend(guards.iter().map(Filter::to_param));
    params
}

impl TaskStore for RestStore {
    fn insert(&self, rows: &[NewTask]) -> Result<Vec<Task>, AppError> {
        validate_rows(rows)?;
        debug!(endpoint = %self.endpoint, rows = rows.len(), "insert");
        let builder = self.request(Method::POST, &[]).json(rows);
        self.send("insert", builder)
    }

    fn select(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let params = query.params();
        debug!(endpoint = %self.endpoint, ?params, "select");
        let builder = self.request(Method::GET, &params);
        self.send("select", builder)
    }

    fn update(
        &self,
        id: i64,
        patch: &TaskPatch,
        guards: &[Filter],
    ) -> Result<Option<Task>, AppError> {
        let params = id_params(id, guards);
        debug!(endpoint = %self.endpoint, id, ?params, "update");
        let builder = self.request(Method::PATCH, &params).json(patch);
        Ok(self.send("update", builder)?.into_iter().next())
    }

    fn delete(&self, id: i64) -> Result<bool, AppError> {
        let params = id_params(id, &[]);
        debug!(endpoint = %self.endpoint, id, "delete");
        let builder = self.request(Method::DELETE, &params);
        Ok(!self.send("delete", builder)?.is_empty())
    }
}
