//! Commands
//!
//! Entry points of the command-line front end. Each command takes the wired
//! [`crate::state::AppState`] and returns serializable data; rendering is
//! left to the binary.

pub mod analysis;
pub mod auth;
pub mod records;
pub mod settings;

pub use analysis::*;
pub use auth::*;
pub use records::*;
pub use settings::*;
