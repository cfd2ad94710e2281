//! Services
//!
//! Business logic of the client. Services are wired together by
//! [`crate::state::AppState`] and called by commands.

pub mod analysis;
pub mod auth;
pub mod records;
pub mod route_guard;
pub mod session;

pub use analysis::{AnalysisError, AnalysisOrchestrator, AnalysisRun};
pub use auth::{AuthError, AuthService};
pub use records::RecordsService;
pub use route_guard::{route_decision, RouteDecision, RouteGuard};
pub use session::SessionManager;
