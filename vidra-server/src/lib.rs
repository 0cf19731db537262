//! HTTP surface for the Vidra streaming platform.
//!
//! The server wires the core services (resume resolution, family-plan
//! lifecycle) behind an axum router. Authentication happens upstream; the
//! auth-context middleware resolves the forwarded user id into a full
//! account row for every protected route.

pub mod handlers;
pub mod infra;
pub mod jobs;
pub mod routes;

pub use infra::app_state::AppState;
