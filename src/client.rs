use anyhow::{bail, Context, Result};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::model::story::Story;

pub const DEFAULT_BASE_API_URL: &str = "https://www.pivotaltracker.com/services/v5/";

/// HTTP wrapper around the tracking service's project-scoped story API.
///
/// Holds the project id, the API token (sent as the `X-TrackerToken`
/// header on every request), and a reused `reqwest::Client`. All calls are
/// single-shot request/response; there is no retry or pagination handling.
pub struct TrackerClient {
    project_id: u64,
    token: String,
    base_api_url: String,
    client: reqwest::Client,
}

impl TrackerClient {
    pub fn new(project_id: u64, token: impl Into<String>) -> Self {
        Self::with_base_url(project_id, token, DEFAULT_BASE_API_URL)
    }

    /// Use a non-default API root, e.g. a staging host. The URL must end
    /// with a trailing slash.
    pub fn with_base_url(
        project_id: u64,
        token: impl Into<String>,
        base_api_url: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            token: token.into(),
            base_api_url: base_api_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        match &config.base_api_url {
            Some(url) => Self::with_base_url(config.project_id, &config.token, url),
            None => Self::new(config.project_id, &config.token),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}projects/{}/{}", self.base_api_url, self.project_id, path)
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<String> {
        let url = self.url_for(path);
        debug!(%method, %url, "tracker api request");

        let mut request = self
            .client
            .request(method, &url)
            .header("X-TrackerToken", &self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("reading response from {url} failed"))?;

        if !status.is_success() {
            warn!(%status, %url, "tracker api error");
            bail!("HTTP status {status} from {url}: {text}");
        }

        Ok(text)
    }

    async fn request_story(&self, method: Method, path: &str, body: Option<Value>) -> Result<Story> {
        let text = self.request(method, path, body).await?;
        let value: Value =
            serde_json::from_str(&text).context("story response was not valid JSON")?;
        Ok(Story::from_wire(&value)?)
    }

    /// Fetch all stories that satisfy the given search filter, or every
    /// story in the project when no filter is given.
    pub async fn get_stories(&self, filter: Option<&str>) -> Result<Vec<Story>> {
        let path = match filter {
            Some(filter) => format!("stories?filter={}", urlencoding::encode(filter)),
            None => "stories".to_string(),
        };
        let text = self.request(Method::GET, &path, None).await?;
        let values: Vec<Value> =
            serde_json::from_str(&text).context("story query response was not a JSON array")?;
        values
            .iter()
            .map(|value| Ok(Story::from_wire(value)?))
            .collect()
    }

    /// Fetch all release-type stories in the project.
    pub async fn get_release_stories(&self) -> Result<Vec<Story>> {
        self.get_stories(Some("type:release")).await
    }

    pub async fn get_story(&self, story_id: u64) -> Result<Story> {
        self.request_story(Method::GET, &format!("stories/{story_id}"), None)
            .await
    }

    /// Persist a new story and return the server's materialized copy.
    pub async fn create_story(&self, story: &Story) -> Result<Story> {
        let body = story.to_wire()?.to_json();
        self.request_story(Method::POST, "stories", Some(body)).await
    }

    /// Persist changes to an existing story, addressed by the record's own
    /// id. Use this with a record produced by one of the query methods; a
    /// record with no id is an immediate error.
    pub async fn update_story(&self, story: &Story) -> Result<Story> {
        let id = story
            .id()
            .value()
            .copied()
            .context("story has no id; fetch it first or use update_story_by_id")?;
        self.update_story_by_id(id, story).await
    }

    /// Persist changes to an existing story without fetching it first.
    pub async fn update_story_by_id(&self, story_id: u64, story: &Story) -> Result<Story> {
        let body = story.to_wire()?.to_json();
        self.request_story(Method::PUT, &format!("stories/{story_id}"), Some(body))
            .await
    }

    pub async fn delete_story(&self, story_id: u64) -> Result<()> {
        self.request(Method::DELETE, &format!("stories/{story_id}"), None)
            .await?;
        Ok(())
    }

    /// Attach a comment to a story. The comment resource is write-only
    /// here; it has no model type of its own.
    pub async fn add_comment(&self, story_id: u64, text: &str) -> Result<()> {
        let body = serde_json::json!({ "text": text });
        self.request(
            Method::POST,
            &format!("stories/{story_id}/comments"),
            Some(body),
        )
        .await?;
        Ok(())
    }
}
