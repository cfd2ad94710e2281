//! Records Service
//!
//! Read access to the tenant's client records, used to pick an analysis
//! subject.

use std::sync::Arc;

use suluk_api::endpoints;
use suluk_api::types::ClientRecord;
use suluk_api::{ApiResult, RequestDispatcher};

pub struct RecordsService {
    dispatcher: Arc<RequestDispatcher>,
}

impl RecordsService {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn list_clients(&self) -> ApiResult<Vec<ClientRecord>> {
        self.dispatcher.get_json(endpoints::CLIENTS, &[]).await
    }
}
