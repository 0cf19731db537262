//! Shared data models for the Vidra streaming platform.
//!
//! This crate holds the plain domain types exchanged between the core
//! services and the HTTP surface: watch records and resume points, season
//! metadata, family/member/invite rows, and the user account shape. It
//! carries no I/O and no business logic.

pub mod family;
pub mod user;
pub mod watch;

pub use family::{
    Family, FamilyInvite, FamilyMember, FamilyRole, FamilySummary, InviteStatus,
};
pub use user::User;
pub use watch::{MediaKind, ProgressUpdate, ResumePoint, SeasonInfo, WatchRecord};
