//! Integration Tests Module
//!
//! End-to-end tests of the wired `AppState` against the scripted in-process
//! transport: session lifecycle across restarts and the two-phase analysis
//! flow, including superseded runs and logout during a stream.

// Login, restart, logout and stale-token recovery
mod session_flow_test;

// Structured phase plus streamed narrative
mod analysis_flow_test;
