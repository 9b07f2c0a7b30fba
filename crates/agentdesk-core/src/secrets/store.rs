//! Secret store client — typed HTTP access to the MyVault service.
//!
//! ```text
//! GET /api/secrets/{project}/{key}     -> { "value": "..." }
//! GET /api/secrets?project={project}   -> [ { "key": "...", "value": "..." }, ... ]
//! GET /projects/default                -> { "name": "..." }
//! ```
//!
//! Every request carries `X-Service` / `X-Token` identity headers and a fixed
//! 5 second timeout. There are no retries.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::error::SecretError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend the secrets manager reads from.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, project: &str, key: &str) -> Result<String, SecretError>;

    async fn get_secrets(&self, project: &str) -> Result<BTreeMap<String, String>, SecretError>;

    async fn get_default_project(&self) -> Result<String, SecretError>;
}

#[derive(Debug, Deserialize)]
struct SecretValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SecretItem {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ProjectName {
    name: String,
}

/// HTTP client for the MyVault API.
pub struct VaultClient {
    base_url: Url,
    client: reqwest::Client,
}

impl VaultClient {
    pub fn new(base_url: &str, service_name: &str, token: &str) -> Result<Self, SecretError> {
        let base_url = Url::parse(base_url).map_err(|e| SecretError::StoreUnreachable {
            message: format!("Invalid MyVault base URL '{}': {}", base_url, e),
            status: None,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("X-Service", header_value("X-Service", service_name)?);
        headers.insert("X-Token", header_value("X-Token", token)?);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| SecretError::StoreUnreachable {
                message: format!("Failed to build MyVault HTTP client: {}", e),
                status: None,
            })?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, (Option<StatusCode>, String)> {
        let response = request
            .send()
            .await
            .map_err(|e| (None, format!("{}: {}", context, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err((Some(status), format!("{}: HTTP {}", context, status.as_u16())));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| (Some(status), format!("{}: {}", context, e)))
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, SecretError> {
    HeaderValue::from_str(value).map_err(|_| SecretError::StoreUnreachable {
        message: format!("Invalid value for header {}", name),
        status: None,
    })
}

fn unreachable_error((status, message): (Option<StatusCode>, String)) -> SecretError {
    SecretError::StoreUnreachable {
        message,
        status: status.map(|s| s.as_u16()),
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn get_secret(&self, project: &str, key: &str) -> Result<String, SecretError> {
        let url = self.endpoint(&["api", "secrets", project, key]);
        let context = format!("Failed to get secret '{}'", key);

        match self.get_json::<SecretValue>(self.client.get(url), &context).await {
            Ok(body) => Ok(body.value),
            Err((Some(StatusCode::NOT_FOUND), _)) => Err(SecretError::MissingInStore {
                project: project.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(unreachable_error(e)),
        }
    }

    async fn get_secrets(&self, project: &str) -> Result<BTreeMap<String, String>, SecretError> {
        let url = self.endpoint(&["api", "secrets"]);
        let request = self.client.get(url).query(&[("project", project)]);

        let items = self
            .get_json::<Vec<SecretItem>>(request, "Failed to get secrets")
            .await
            .map_err(unreachable_error)?;

        Ok(items.into_iter().map(|item| (item.key, item.value)).collect())
    }

    async fn get_default_project(&self) -> Result<String, SecretError> {
        let url = self.endpoint(&["projects", "default"]);
        self.get_json::<ProjectName>(self.client.get(url), "Failed to get default project")
            .await
            .map(|p| p.name)
            .map_err(unreachable_error)
    }
}
