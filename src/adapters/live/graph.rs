//! Live adapter for the `Directory` port using a Microsoft Graph style user lookup.

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::ports::directory::{Directory, DirectoryError, DirectoryFuture};

/// Default Graph endpoint.
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Resolves corporate ids with `GET {base}/users/{username}?$select=id`.
pub struct GraphDirectory {
    client: Client,
    base_url: Url,
    token: String,
}

/// Body of a successful user lookup.
#[derive(Deserialize)]
struct GraphUser {
    #[serde(default)]
    id: Option<String>,
}

/// OData error envelope returned by Graph on failures.
#[derive(Deserialize)]
struct ODataError {
    error: ODataErrorDetail,
}

/// Detail inside an OData error envelope.
#[derive(Deserialize)]
struct ODataErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl GraphDirectory {
    /// Creates a directory client for `base_url` authenticating with a bearer `token`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] if `base_url` is not a usable URL.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DirectoryError::Unavailable(format!("invalid graph url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::Unavailable(format!("invalid graph url {base_url}")));
        }
        Ok(Self { client: Client::new(), base_url, token: token.into() })
    }

    fn user_url(&self, username: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users").push(username);
        }
        url.set_query(Some("$select=id"));
        url
    }
}

impl Directory for GraphDirectory {
    fn resolve_corporate_id<'a>(&'a self, username: &'a str) -> DirectoryFuture<'a> {
        Box::pin(async move {
            let url = self.user_url(username);
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| DirectoryError::Unavailable(format!("graph request failed: {e}")))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(username, "user not found in directory");
                return Ok(None);
            }

            let body = response.text().await.map_err(|e| {
                DirectoryError::Unavailable(format!("failed to read graph response: {e}"))
            })?;

            if !status.is_success() {
                let msg = serde_json::from_str::<ODataError>(&body)
                    .map(|e| format!("{}: {}", e.error.code, e.error.message))
                    .unwrap_or(body);
                return Err(DirectoryError::Unavailable(format!(
                    "graph error ({}): {msg}",
                    status.as_u16()
                )));
            }

            let user: GraphUser = serde_json::from_str(&body).map_err(|e| {
                DirectoryError::Unavailable(format!("failed to parse graph response: {e}"))
            })?;
            match user.id.filter(|id| !id.trim().is_empty()) {
                Some(id) => Ok(Some(id)),
                None => Err(DirectoryError::Unavailable(
                    "graph response is missing the user id".to_string(),
                )),
            }
        })
    }
}
