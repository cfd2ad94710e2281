//! Data Models
//!
//! Data structures shared by the services, the state container and the
//! command front end.

pub mod analysis;
pub mod response;
pub mod session;
pub mod settings;

pub use analysis::*;
pub use response::*;
pub use session::*;
pub use settings::*;
