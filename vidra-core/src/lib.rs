//! Core library for the Vidra streaming platform.
//!
//! Vidra's backend core covers the two stateful subsystems of the product:
//!
//! - **Resume resolution**: turning a user's sparse per-episode watch
//!   records (plus season metadata when needed) into the single episode the
//!   player should continue with ([`resume`]).
//! - **Family-plan accounting**: slot capacity math and the invite/member
//!   lifecycle, including trial expiry ([`family`]).
//!
//! Persistence follows a ports-and-adapters split: repository traits live
//! in [`database::ports`], the Postgres implementations in
//! [`database::infrastructure`], and [`application::unit_of_work`] composes
//! them for consumers.

pub mod api;
pub mod application;
pub mod database;
pub mod error;
pub mod family;
pub mod providers;
pub mod resume;

pub use error::{CoreError, Result};
