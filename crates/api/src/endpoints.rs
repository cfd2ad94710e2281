//! Paths of the records service.

/// `POST` form-encoded credentials, returns `{access_token}`.
pub const TOKEN: &str = "/token";
/// `POST` JSON `{username, password}`.
pub const REGISTER: &str = "/register";
/// `GET` identity behind the current bearer token.
pub const CURRENT_USER: &str = "/users/me";
/// `GET` available narrative models.
pub const ANALYSIS_MODELS: &str = "/analysis/models";
pub const CLIENTS: &str = "/clients/";

/// Structured analysis for one client. Query: `lang`.
pub fn analysis(subject_id: i64) -> String {
    format!("/analysis/{}", subject_id)
}

/// Streamed narrative for one client. Query: `lang`, `model`.
pub fn analysis_stream(subject_id: i64) -> String {
    format!("/analysis/{}/stream", subject_id)
}
