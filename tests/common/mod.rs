#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedReceiver;

use repolens::config::AnalysisConfig;
use repolens::errors::FetchError;
use repolens::github::{RepoRef, RepositoryClient, paths_under};
use repolens::pipeline::{ChannelStatusSink, Pipeline, ResultStore, StatusEvent};

/// Repository served from memory. Listing order is insertion order.
#[derive(Default)]
pub struct MemoryRepo {
    files: Vec<(String, String)>,
    failing: Vec<String>,
    stalled: Vec<String>,
    release: Arc<Notify>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.to_string()));
        self
    }

    /// Fetching `path` fails with `NotFound`.
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.push(path.to_string());
        self
    }

    /// Fetching `path` hangs until released.
    pub fn stalled(mut self, path: &str) -> Self {
        self.stalled.push(path.to_string());
        self
    }

    pub fn release_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl RepositoryClient for MemoryRepo {
    async fn list_files_recursive(&self, repo: &RepoRef) -> Result<Vec<String>, FetchError> {
        Ok(paths_under(
            self.files.iter().map(|(path, _)| path.as_str()),
            &repo.path,
        ))
    }

    async fn get_content(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> Result<String, FetchError> {
        if self.failing.iter().any(|p| p == path) {
            return Err(FetchError::NotFound(path.to_string()));
        }
        if self.stalled.iter().any(|p| p == path) {
            self.release.notified().await;
        }
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<ResultStore>,
    pub status: UnboundedReceiver<StatusEvent>,
}

impl Harness {
    pub fn new(repo: MemoryRepo) -> Self {
        let (sink, status) = ChannelStatusSink::new();
        let store = Arc::new(ResultStore::new());
        let pipeline = Pipeline::new(
            Arc::new(repo),
            Arc::new(sink),
            store.clone(),
            &AnalysisConfig::default(),
        );
        Self {
            pipeline,
            store,
            status,
        }
    }

    /// Status messages pushed so far.
    pub fn drain_status(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(event) = self.status.try_recv() {
            messages.push(event.message);
        }
        messages
    }

    /// Waits until `message` is pushed.
    pub async fn wait_for_status(&mut self, message: &str) {
        while let Some(event) = self.status.recv().await {
            if event.message == message {
                return;
            }
        }
        panic!("status channel closed before {:?}", message);
    }
}

pub const ROOT_URL: &str = "https://github.com/acme/shop";

pub fn folder_url(folder: &str) -> String {
    format!("https://github.com/acme/shop/tree/main/{}", folder)
}
