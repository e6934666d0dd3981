use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header};
use serde::Deserialize;

use super::{RepoRef, RepositoryClient, paths_under};
use crate::{config::GitHubConfig, errors::FetchError};

const RAW_CONTENT_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Response body of `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`
#[derive(Deserialize, Debug, Clone)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize, Debug, Clone)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// [`RepositoryClient`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FetchError::ClientSetup)?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// `{api_url}/repos/{owner}/{repo}/{segments...}` with each segment escaped.
    fn endpoint<'a, I>(&self, owner: &str, repo: &str, segments: I) -> Result<Url, FetchError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url =
            Url::parse(&self.api_url).map_err(|_| FetchError::InvalidEndpoint(self.api_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidEndpoint(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["repos", owner, repo])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, url: Url, accept: &str) -> Result<reqwest::Response, FetchError> {
        tracing::debug!("GET {}", url);

        let mut request_builder = self.http.get(url.clone()).header(header::ACCEPT, accept);

        // Add authorization header if a token is present
        if let Some(token) = &self.token {
            request_builder = request_builder.bearer_auth(token);
        }

        let response = request_builder.send().await.map_err(|e| {
            tracing::error!("GitHub request to {} failed during send: {}", url, e);
            FetchError::RequestFailed {
                url: url.to_string(),
                source: e,
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body from GitHub response".to_string());
            tracing::error!("GitHub API request failed with status {}: {}", status, body);
            return Err(FetchError::ApiResponseError {
                status,
                url: url.to_string(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    async fn list_files_recursive(&self, repo: &RepoRef) -> Result<Vec<String>, FetchError> {
        let mut url = self.endpoint(&repo.owner, &repo.repo, ["git", "trees", repo.git_ref.as_str()])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let response = self.send(url.clone(), JSON_MEDIA_TYPE).await?;
        let listing = response
            .json::<TreeResponse>()
            .await
            .map_err(|e| FetchError::ResponseParseFailed {
                url: url.to_string(),
                source: e,
            })?;

        if listing.truncated {
            tracing::warn!(
                "GitHub truncated the tree listing for {}/{}@{}; analyzing a partial file set",
                repo.owner,
                repo.repo,
                repo.git_ref
            );
        }

        let blobs = listing
            .tree
            .iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path.as_str());
        let paths = paths_under(blobs, &repo.path);
        tracing::debug!(
            "Listed {} files beneath '{}' in {}/{}",
            paths.len(),
            repo.path,
            repo.owner,
            repo.repo
        );
        Ok(paths)
    }

    async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<String, FetchError> {
        let mut url = self.endpoint(owner, repo, std::iter::once("contents").chain(path.split('/')))?;
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = self.send(url.clone(), RAW_CONTENT_MEDIA_TYPE).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::ResponseParseFailed {
                url: url.to_string(),
                source: e,
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
