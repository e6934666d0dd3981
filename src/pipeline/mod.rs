//! Analysis orchestrator.
//!
//! A [`Pipeline`] runs `parse_url -> list -> fetch -> grid -> parse ->
//! graph -> dia -> uml -> publish` on a background task. Starting a new
//! run supersedes the one in flight: the older run is cancelled and can
//! no longer publish.

pub mod sink;

pub use sink::{
    ChannelStatusSink, LogStatusSink, ResultSink, ResultStore, StatusEvent, StatusSink,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analyzer::{analyze_grid, build_graph, build_uml, calculate_dia, parse_classes};
use crate::config::AnalysisConfig;
use crate::errors::PipelineError;
use crate::github::RepositoryClient;
use crate::report;
use crate::scanner::SourceScanner;
use crate::types::AnalysisResult;

pub const STATUS_FETCHING_LIST: &str = "Fetching file list...";
pub const STATUS_DOWNLOADING: &str = "Downloading sources...";
pub const STATUS_CALCULATING_DIA: &str = "Calculating DIA metrics...";
pub const STATUS_BUILDING_UML: &str = "Building UML...";

/// Outcome of one run.
pub type RunOutcome = Result<Arc<AnalysisResult>, PipelineError>;

/// Checks the input preconditions on a repository URL: not blank, no
/// whitespace, and pointing at `github.com`.
pub fn validate_url(url: &str) -> Result<(), PipelineError> {
    if url.trim().is_empty() {
        return Err(PipelineError::InvalidUrl("URL is blank.".to_string()));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(PipelineError::InvalidUrl(
            "URL must not contain whitespace.".to_string(),
        ));
    }
    if !url.to_ascii_lowercase().contains("github.com") {
        return Err(PipelineError::InvalidUrl(
            "URL must point to github.com.".to_string(),
        ));
    }
    Ok(())
}

struct RunState {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    client: Arc<dyn RepositoryClient>,
    status: Arc<dyn StatusSink>,
    results: Arc<dyn ResultSink>,
    extension: String,
    state: Mutex<RunState>,
}

/// Handle on a started run.
#[derive(Debug)]
pub struct RunHandle {
    generation: u64,
    join: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the run to finish.
    pub async fn wait(self) -> RunOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => Err(PipelineError::Internal(format!(
                "analysis task failed: {}",
                e
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn RepositoryClient>,
        status: Arc<dyn StatusSink>,
        results: Arc<dyn ResultSink>,
        analysis: &AnalysisConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                status,
                results,
                extension: analysis.extension.clone(),
                state: Mutex::new(RunState {
                    generation: 0,
                    cancel: CancellationToken::new(),
                }),
            }),
        }
    }

    /// Generation of the most recently started run; 0 before any run.
    pub fn generation(&self) -> u64 {
        self.inner.lock_state().generation
    }

    /// Starts a run for `url` on a background task, superseding any run
    /// still in flight. Must be called from within a tokio runtime.
    pub fn start(&self, url: &str) -> RunHandle {
        let (generation, cancel) = {
            let mut state = self.inner.lock_state();
            state.cancel.cancel();
            state.generation += 1;
            state.cancel = CancellationToken::new();
            (state.generation, state.cancel.clone())
        };
        tracing::info!(generation, "Starting analysis of {}", url);

        let inner = Arc::clone(&self.inner);
        let url = url.to_string();
        let join = tokio::spawn(async move { inner.run(generation, &url, cancel).await });
        RunHandle { generation, join }
    }

    /// Starts a run and waits for it.
    pub async fn run(&self, url: &str) -> RunOutcome {
        self.start(url).wait().await
    }

    /// Cancels the run in flight, if any. Nothing is published by it
    /// afterwards.
    pub fn cancel(&self) {
        self.inner.lock_state().cancel.cancel();
    }

    /// Cancels the run in flight and wipes the published result.
    pub fn clear(&self) {
        let state = self.inner.lock_state();
        state.cancel.cancel();
        self.inner.results.clear();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock_state().generation == generation
    }

    fn interruption(&self, generation: u64) -> PipelineError {
        if self.is_current(generation) {
            PipelineError::Cancelled
        } else {
            PipelineError::Superseded
        }
    }

    fn checkpoint(&self, generation: u64, cancel: &CancellationToken) -> Result<(), PipelineError> {
        if cancel.is_cancelled() || !self.is_current(generation) {
            return Err(self.interruption(generation));
        }
        Ok(())
    }

    async fn run(&self, generation: u64, url: &str, cancel: CancellationToken) -> RunOutcome {
        let outcome = match self.execute(generation, url, &cancel).await {
            Err(e) if e.is_interruption() => Err(self.interruption(generation)),
            Err(_) if !self.is_current(generation) => Err(PipelineError::Superseded),
            other => other,
        };

        match &outcome {
            Ok(result) => {
                tracing::info!(generation, "Analysis finished: {} files", result.file_count());
                self.status
                    .push(&report::summary_line(result, &self.extension));
            }
            Err(e) if e.is_interruption() => {
                tracing::info!(generation, "Analysis stopped: {}", e);
            }
            Err(e) => {
                tracing::error!(generation, "Analysis failed: {}", e);
                self.status.push(&format!("Error: {}", e));
            }
        }
        outcome
    }

    async fn execute(
        &self,
        generation: u64,
        url: &str,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        self.status.push(STATUS_FETCHING_LIST);
        validate_url(url)?;
        let repo = self.client.parse_url(url)?;
        if repo.is_blob {
            return Err(PipelineError::InvalidUrl(
                "URL must point to a folder.".to_string(),
            ));
        }
        self.checkpoint(generation, cancel)?;

        let paths = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            listed = self.client.list_files_recursive(&repo) => listed?,
        };
        tracing::info!(
            generation,
            "Listed {} files under {}/{}/{}",
            paths.len(),
            repo.owner,
            repo.repo,
            repo.path
        );
        self.checkpoint(generation, cancel)?;

        self.status.push(STATUS_DOWNLOADING);
        let files = SourceScanner::new(self.client.as_ref(), &self.extension)
            .scan(&repo, &paths, cancel)
            .await?;
        tracing::info!(generation, "Downloaded {} source files", files.len());
        self.checkpoint(generation, cancel)?;

        let grid = analyze_grid(&files);
        self.checkpoint(generation, cancel)?;

        self.status.push(STATUS_CALCULATING_DIA);
        let graph = build_graph(parse_classes(&files)?)?;
        let dia = calculate_dia(&graph);
        self.checkpoint(generation, cancel)?;

        self.status.push(STATUS_BUILDING_UML);
        let uml = build_uml(&graph);

        let result = Arc::new(AnalysisResult { grid, dia, uml });
        self.publish(generation, cancel, Arc::clone(&result))?;
        Ok(result)
    }

    /// Publishes only while `generation` is current and not cancelled.
    /// The check and the publish happen under the same lock as `start`.
    fn publish(
        &self,
        generation: u64,
        cancel: &CancellationToken,
        result: Arc<AnalysisResult>,
    ) -> Result<(), PipelineError> {
        let state = self.lock_state();
        if state.generation != generation {
            return Err(PipelineError::Superseded);
        }
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.results.publish(result);
        Ok(())
    }
}
