use std::time::Duration;

use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;

/// The account/org/project triple every pipeline endpoint is scoped to.
#[derive(Debug, Clone)]
pub struct ApiScope {
    pub account: String,
    pub org: String,
    pub project: String,
}

/// Shared HTTP plumbing for the pipeline REST API.
///
/// Built once at startup from the application config and passed to client
/// constructors; there is no global session object.
#[derive(Clone)]
pub struct ApiContext {
    http: Client,
    base_url: Url,
    scope: ApiScope,
}

impl std::fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiContext")
            .field("http", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("scope", &self.scope)
            .finish()
    }
}

impl ApiContext {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new context authenticated with the service API key.
    pub fn new(base_url: Url, api_key: &str, scope: ApiScope) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|_| ApiError::Config("API key contains invalid header characters".into()))?;
        key_value.set_sensitive(true);
        headers.insert("x-api-key", key_value);

        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("pipedeck/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .expect("failed to build HTTP client");

        Ok(Self {
            http,
            base_url,
            scope,
        })
    }

    pub fn scope(&self) -> &ApiScope {
        &self.scope
    }

    /// Query parameters identifying the account scope, present on every call.
    pub(crate) fn scope_params(&self) -> [(&'static str, &str); 3] {
        [
            ("accountIdentifier", self.scope.account.as_str()),
            ("orgIdentifier", self.scope.org.as_str()),
            ("projectIdentifier", self.scope.project.as_str()),
        ]
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "GET");
        let response = self.http.get(url).query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "POST");
        let response = self.http.post(url).query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Map a non-2xx response to [`ApiError::Status`], keeping the body for
/// diagnostics.
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}
