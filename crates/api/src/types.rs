//! Wire types of the records service.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Auth
// ============================================================================

/// Body of a successful `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// The account behind a bearer token, as returned by `GET /users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    /// Server timestamp, kept verbatim.
    pub created_at: String,
}

impl Identity {
    /// `created_at` as UTC. The backend emits naive UTC timestamps
    /// (`2024-05-01T10:00:00.123456`); RFC 3339 is accepted too.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// One point of the spending history, in date order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub date: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopItem {
    pub name: String,
    pub value: f64,
}

/// Body of the structured analysis phase, `GET /analysis/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub client_name: String,
    pub total_spent: f64,
    pub purchase_count: u64,
    #[serde(default)]
    pub chart_data: Vec<ChartPoint>,
    #[serde(default)]
    pub top_items: Vec<TopItem>,
}

/// Body of `GET /analysis/models`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<String>,
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}
