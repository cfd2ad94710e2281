//! Suluk Client - Rust Client Library
//!
//! Client for the Suluk multi-tenant records service. It includes:
//! - Session lifecycle: credential storage, identity resolution, route guard
//! - Two-phase customer analysis: structured summary plus streamed narrative
//! - Configuration and storage under ~/.suluk
//! - Command handlers for the `suluk` binary

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::analysis::{AnalysisRequest, AnalysisResult, AnalysisView, RunKey, StreamOutcome};
pub use models::response::CommandResponse;
pub use models::session::SessionState;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::{
    route_decision, AnalysisError, AnalysisOrchestrator, AnalysisRun, AuthError, AuthService,
    RecordsService, RouteDecision, RouteGuard, SessionManager,
};
pub use state::{AppState, StateOptions};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use utils::error::{AppError, AppResult};
