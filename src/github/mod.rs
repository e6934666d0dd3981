//! Remote repository access.
//!
//! The analysis pipeline only talks to a [`RepositoryClient`]; the
//! [`GitHubClient`] implementation speaks the GitHub REST API.

mod client;

pub use client::GitHubClient;

use crate::errors::{FetchError, PipelineError};
use async_trait::async_trait;

/// Ref used when a URL names a repository without `/tree/<ref>`.
pub const DEFAULT_REF: &str = "HEAD";

/// A parsed GitHub folder (or file) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    /// Folder (or file) path inside the repository, empty for the root.
    pub path: String,
    /// True when the URL points at a single file (`/blob/`).
    pub is_blob: bool,
}

/// Operations the analysis pipeline needs from a repository host.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    fn parse_url(&self, text: &str) -> Result<RepoRef, PipelineError> {
        parse_url(text)
    }

    /// Every file path beneath `repo.path`, repository-root relative and
    /// forward-slash separated.
    async fn list_files_recursive(&self, repo: &RepoRef) -> Result<Vec<String>, FetchError>;

    /// Raw text of one file.
    async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<String, FetchError>;
}

/// Parses `github.com/<owner>/<repo>[/(tree|blob)/<ref>[/<path>]]`.
///
/// The scheme is optional and the host is matched case-insensitively.
/// A ref containing `/` cannot be told apart from the path; the first
/// segment after `tree`/`blob` is taken as the ref.
pub fn parse_url(text: &str) -> Result<RepoRef, PipelineError> {
    let invalid = |reason: &str| PipelineError::InvalidUrl(format!("{} ({})", reason, text));

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidUrl("URL is blank.".to_string()));
    }

    let without_scheme = strip_scheme(trimmed);
    let without_query = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    let mut segments = without_query.split('/').filter(|s| !s.is_empty());

    let host = segments.next().unwrap_or_default();
    if !host.eq_ignore_ascii_case("github.com") && !host.eq_ignore_ascii_case("www.github.com") {
        return Err(invalid("host must be github.com"));
    }

    let owner = segments
        .next()
        .ok_or_else(|| invalid("missing repository owner"))?;
    let repo = segments
        .next()
        .map(|r| r.trim_end_matches(".git"))
        .filter(|r| !r.is_empty())
        .ok_or_else(|| invalid("missing repository name"))?;

    let (git_ref, is_blob) = match segments.next() {
        None => (DEFAULT_REF.to_string(), false),
        Some(kind) => {
            let is_blob = match kind {
                "tree" => false,
                "blob" => true,
                _ => return Err(invalid("expected /tree/ or /blob/ after the repository")),
            };
            let git_ref = segments.next().ok_or_else(|| invalid("missing ref"))?;
            (git_ref.to_string(), is_blob)
        }
    };

    let path = segments.collect::<Vec<_>>().join("/");
    if is_blob && path.is_empty() {
        return Err(invalid("missing file path"));
    }

    Ok(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        git_ref,
        path,
        is_blob,
    })
}

fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if url
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
        {
            return &url[scheme.len()..];
        }
    }
    url
}

/// Keeps the paths strictly beneath `folder` (all of them for the root).
pub fn paths_under<'a, I>(paths: I, folder: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        return paths.into_iter().map(str::to_string).collect();
    }
    let prefix = format!("{}/", folder);
    paths
        .into_iter()
        .filter(|p| p.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}
