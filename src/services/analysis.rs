//! Analysis Orchestrator
//!
//! Drives one analysis run in two phases: the structured summary, then the
//! streamed narrative layered on top of it. Only the most recent run is
//! active. Starting a run cancels the previous one's stream, and every
//! narrative increment is checked against the active run key before it is
//! applied, so a superseded run can never write into a newer run's result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::StreamExt;
use suluk_api::endpoints;
use suluk_api::types::{AnalysisSummary, ModelList};
use suluk_api::{decode_text_stream, ApiError, ApiResult, RequestDispatcher};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::analysis::{AnalysisRequest, AnalysisResult, AnalysisView, RunKey, StreamOutcome};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The structured phase failed. Nothing was published.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Analysis was superseded by a newer request")]
    Superseded,
}

/// A run whose structured phase succeeded.
#[derive(Debug)]
pub struct AnalysisRun {
    pub key: RunKey,
    /// Structured figures with an empty narrative.
    pub result: AnalysisResult,
    /// Narrative increments not yet taken by `next_update`.
    increments: mpsc::UnboundedReceiver<String>,
    /// What `next_update` returned last; `None` before the first call.
    latest: Option<AnalysisResult>,
    pub stream_task: JoinHandle<StreamOutcome>,
}

impl AnalysisRun {
    /// The next published snapshot of this run: the structured one first,
    /// then one per narrative increment. `None` once the narrative ends.
    pub async fn next_update(&mut self) -> Option<AnalysisResult> {
        match self.latest.as_mut() {
            None => self.latest = Some(self.result.clone()),
            Some(latest) => {
                let increment = self.increments.recv().await?;
                latest.narrative.push_str(&increment);
            }
        }
        self.latest.clone()
    }

    /// Wait for the narrative phase to end. Increments nobody read are
    /// dropped; the final text is in the orchestrator's view.
    pub async fn finish(self) -> StreamOutcome {
        let AnalysisRun {
            increments,
            stream_task,
            ..
        } = self;
        drop(increments);
        match stream_task.await {
            Ok(outcome) => outcome,
            Err(e) => StreamOutcome::Failed(format!("narrative task aborted: {}", e)),
        }
    }
}

struct ActiveRun {
    key: RunKey,
    cancel: CancellationToken,
}

/// State shared between the orchestrator and its streaming tasks.
struct RunBoard {
    active: Mutex<Option<ActiveRun>>,
    view_tx: watch::Sender<Option<AnalysisView>>,
}

impl RunBoard {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn is_active(active: &Option<ActiveRun>, key: &RunKey) -> bool {
        active.as_ref().is_some_and(|run| run.key == *key)
    }

    /// Publish `result` for `key` if it is still the active run.
    fn publish(&self, key: &RunKey, result: &AnalysisResult, outcome: Option<StreamOutcome>) -> bool {
        let active = self.lock();
        if !Self::is_active(&active, key) {
            return false;
        }
        self.view_tx.send_replace(Some(AnalysisView {
            key: key.clone(),
            result: result.clone(),
            outcome,
        }));
        true
    }

    fn release(&self, key: &RunKey) {
        let mut active = self.lock();
        if Self::is_active(&active, key) {
            *active = None;
        }
    }
}

pub struct AnalysisOrchestrator {
    dispatcher: Arc<RequestDispatcher>,
    board: Arc<RunBoard>,
    next_run_id: AtomicU64,
}

impl AnalysisOrchestrator {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        let (view_tx, _) = watch::channel(None);
        Self {
            dispatcher,
            board: Arc::new(RunBoard {
                active: Mutex::new(None),
                view_tx,
            }),
            next_run_id: AtomicU64::new(0),
        }
    }

    /// Start a run, superseding any run in flight.
    ///
    /// Returns once the structured phase succeeded; the narrative keeps
    /// streaming in a background task. A structured-phase failure is
    /// returned and leaves the view empty.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisRun, AnalysisError> {
        let key = RunKey {
            run_id: self.next_run_id.fetch_add(1, Ordering::SeqCst) + 1,
            request,
        };
        let cancel = CancellationToken::new();

        {
            let mut active = self.board.lock();
            if let Some(previous) = active.replace(ActiveRun {
                key: key.clone(),
                cancel: cancel.clone(),
            }) {
                tracing::info!(run_id = previous.key.run_id, "superseding analysis run");
                previous.cancel.cancel();
            }
            self.board.view_tx.send_replace(None);
        }

        tracing::info!(
            run_id = key.run_id,
            subject_id = key.request.subject_id,
            language = %key.request.language,
            "starting analysis run"
        );

        let path = endpoints::analysis(key.request.subject_id);
        let query = [("lang", key.request.language.as_str())];
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Superseded),
            fetched = self.dispatcher.get_json::<AnalysisSummary>(&path, &query) => fetched,
        };

        let summary = match fetched {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(run_id = key.run_id, error = %e, "structured analysis failed");
                self.board.release(&key);
                return Err(AnalysisError::Api(e));
            }
        };

        let result = AnalysisResult::from(summary);
        if !self.board.publish(&key, &result, None) {
            return Err(AnalysisError::Superseded);
        }

        let (increments_tx, increments) = mpsc::unbounded_channel();
        let stream_task = tokio::spawn(stream_narrative(
            self.dispatcher.clone(),
            self.board.clone(),
            key.clone(),
            cancel,
            result.clone(),
            increments_tx,
        ));

        Ok(AnalysisRun {
            key,
            result,
            increments,
            latest: None,
            stream_task,
        })
    }

    /// Abandon the active run and clear the view.
    pub fn cancel(&self) {
        let mut active = self.board.lock();
        if let Some(run) = active.take() {
            tracing::info!(run_id = run.key.run_id, "cancelling analysis run");
            run.cancel.cancel();
        }
        self.board.view_tx.send_replace(None);
    }

    /// Key of the run currently allowed to publish.
    pub fn active_key(&self) -> Option<RunKey> {
        self.board.lock().as_ref().map(|run| run.key.clone())
    }

    pub fn current(&self) -> Option<AnalysisView> {
        self.board.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AnalysisView>> {
        self.board.view_tx.subscribe()
    }

    /// Narrative models the server offers.
    pub async fn list_models(&self) -> ApiResult<Vec<String>> {
        let list: ModelList = self
            .dispatcher
            .get_json(endpoints::ANALYSIS_MODELS, &[])
            .await?;
        Ok(list.models)
    }

    /// The first listed model.
    pub async fn default_model(&self) -> ApiResult<Option<String>> {
        Ok(self.list_models().await?.into_iter().next())
    }
}

async fn stream_narrative(
    dispatcher: Arc<RequestDispatcher>,
    board: Arc<RunBoard>,
    key: RunKey,
    cancel: CancellationToken,
    mut result: AnalysisResult,
    increments: mpsc::UnboundedSender<String>,
) -> StreamOutcome {
    let path = endpoints::analysis_stream(key.request.subject_id);
    let query = [
        ("lang", key.request.language.as_str()),
        ("model", key.request.model_id.as_str()),
    ];

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StreamOutcome::Superseded,
        opened = dispatcher.open_stream(&path, &query) => opened,
    };

    let outcome = match opened {
        Ok(bytes) => {
            let mut text = decode_text_stream(bytes);
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break StreamOutcome::Superseded,
                    next = text.next() => next,
                };

                match next {
                    Some(Ok(increment)) => {
                        result.narrative.push_str(&increment);
                        if !board.publish(&key, &result, None) {
                            break StreamOutcome::Superseded;
                        }
                        let _ = increments.send(increment);
                    }
                    Some(Err(e)) => break StreamOutcome::Failed(e.to_string()),
                    None => break StreamOutcome::Completed,
                }
            }
        }
        Err(e) => StreamOutcome::Failed(e.to_string()),
    };

    match &outcome {
        StreamOutcome::Completed => {
            tracing::info!(run_id = key.run_id, chars = result.narrative.chars().count(), "narrative complete");
        }
        StreamOutcome::Failed(message) => {
            tracing::warn!(run_id = key.run_id, error = %message, "narrative stream failed, keeping structured result");
        }
        StreamOutcome::Superseded => {
            tracing::debug!(run_id = key.run_id, "narrative abandoned");
        }
    }

    if outcome != StreamOutcome::Superseded {
        board.publish(&key, &result, Some(outcome.clone()));
        board.release(&key);
    }
    outcome
}
