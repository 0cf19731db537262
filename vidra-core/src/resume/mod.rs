//! Continue-watching and resume-point resolution.
//!
//! [`resolver`] holds the pure forward-search algorithm over a user's watch
//! records; [`service::ResumeService`] orchestrates the record fetch and the
//! conditional season-metadata fetch around it.

pub mod resolver;
pub mod service;

#[cfg(test)]
mod tests;

pub use resolver::{COMPLETION_THRESHOLD, MINIMUM_PROGRESS_THRESHOLD, resolve};
pub use service::{ContinueWatchingEntry, ResumeService};
