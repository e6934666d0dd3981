use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use crate::errors::PipelineError;
use crate::github::{RepoRef, RepositoryClient};
use crate::types::SourceFile;

/// Paths ending with `extension`, first occurrence kept, listing order preserved.
pub fn filter_analyzable<'a>(paths: &'a [String], extension: &str) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .map(String::as_str)
        .filter(|path| path.ends_with(extension))
        .filter(|path| seen.insert(*path))
        .collect()
}

/// Downloads analyzable files through a [`RepositoryClient`].
pub struct SourceScanner<'a> {
    client: &'a dyn RepositoryClient,
    extension: &'a str,
}

impl<'a> SourceScanner<'a> {
    pub fn new(client: &'a dyn RepositoryClient, extension: &'a str) -> Self {
        Self { client, extension }
    }

    /// Fetches every analyzable path of `paths`, one at a time.
    ///
    /// Cancellation is honoured between fetches and aborts a fetch in
    /// flight. Any fetch failure fails the whole scan.
    pub async fn scan(
        &self,
        repo: &RepoRef,
        paths: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<SourceFile>, PipelineError> {
        let selected = filter_analyzable(paths, self.extension);
        tracing::info!(
            "{} of {} listed paths end with {}",
            selected.len(),
            paths.len(),
            self.extension
        );

        let mut files = Vec::with_capacity(selected.len());
        for path in selected {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let content = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                content = self.client.get_content(&repo.owner, &repo.repo, path, &repo.git_ref) => content?,
            };
            tracing::debug!("Fetched {} ({} bytes)", path, content.len());

            match SourceFile::new(path, content) {
                Some(file) => files.push(file),
                None => tracing::warn!("Skipping {}: no class name can be derived", path),
            }
        }
        Ok(files)
    }
}
