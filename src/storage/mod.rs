//! Storage Layer
//!
//! Client-side persistence: the bearer credential and the JSON config.

pub mod config;
pub mod credentials;

pub use config::*;
pub use credentials::*;
