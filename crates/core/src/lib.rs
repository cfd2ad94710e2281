//! Suluk Core
//!
//! Foundational types shared by the Suluk client workspace. This crate has no
//! knowledge of HTTP, storage or sessions; it only carries the pieces the other
//! crates agree on.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `proxy` - Proxy configuration data types used when building HTTP clients
//! - `streaming` - Incremental UTF-8 decoding of chunked byte payloads

pub mod error;
pub mod proxy;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{DecodeError, Utf8StreamDecoder};
