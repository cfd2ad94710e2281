//! Records Commands

use suluk_api::types::ClientRecord;

use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn list_clients(state: &AppState) -> AppResult<Vec<ClientRecord>> {
    state.require_session().await?;
    Ok(state.records().list_clients().await?)
}
