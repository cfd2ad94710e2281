//! Analysis Commands

use crate::models::analysis::AnalysisRequest;
use crate::services::analysis::AnalysisRun;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

pub async fn list_models(state: &AppState) -> AppResult<Vec<String>> {
    state.require_session().await?;
    Ok(state.orchestrator().list_models().await?)
}

/// Start an analysis of `client_id`.
///
/// `language` defaults to the configured one. `model` falls back to the
/// configured default, then to the first model the server lists.
pub async fn start_analysis(
    state: &AppState,
    client_id: i64,
    language: Option<String>,
    model: Option<String>,
) -> AppResult<AnalysisRun> {
    state.require_session().await?;

    let language = language.unwrap_or_else(|| state.config().language.clone());
    let model = match model.or_else(|| state.config().default_model.clone()) {
        Some(model) => model,
        None => state
            .orchestrator()
            .default_model()
            .await?
            .ok_or_else(|| AppError::config("The server offers no analysis models"))?,
    };

    let run = state
        .orchestrator()
        .analyze(AnalysisRequest::new(client_id, language, model))
        .await?;
    Ok(run)
}
