use std::sync::Arc;

use crate::pipeline::{Pipeline, RunHandle, StatusSink};

pub const MSG_PROVIDE_URL: &str = "Please provide a URL.";
pub const MSG_NOTHING_TO_RELOAD: &str = "Nothing to reload.";
pub const MSG_CLEARED: &str = "Cleared.";
pub const MSG_FETCHING: &str = "Fetching...";

/// User-facing actions over one [`Pipeline`]: analyze a URL, reload the
/// last one, clear the result.
pub struct Session {
    pipeline: Pipeline,
    status: Arc<dyn StatusSink>,
    last_url: Option<String>,
}

impl Session {
    pub fn new(pipeline: Pipeline, status: Arc<dyn StatusSink>) -> Self {
        Self {
            pipeline,
            status,
            last_url: None,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    /// Starts a run for `url`. A blank URL only produces a status message.
    pub fn analyze(&mut self, url: &str) -> Option<RunHandle> {
        let url = url.trim();
        if url.is_empty() {
            self.status.push(MSG_PROVIDE_URL);
            return None;
        }
        self.last_url = Some(url.to_string());
        self.status.push(MSG_FETCHING);
        Some(self.pipeline.start(url))
    }

    /// Re-runs the last analyzed URL.
    pub fn reload(&mut self) -> Option<RunHandle> {
        match self.last_url.clone() {
            Some(url) => self.analyze(&url),
            None => {
                self.status.push(MSG_NOTHING_TO_RELOAD);
                None
            }
        }
    }

    /// Drops the published result. The last URL is kept for `reload`.
    pub fn clear(&mut self) {
        self.pipeline.clear();
        self.status.push(MSG_CLEARED);
    }
}
