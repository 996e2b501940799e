//! Core domain types for ProjectForge.
//!
//! This module contains the fundamental types used throughout the crate:
//! - The role registry and its short keys
//! - Per-stage outcomes and execution records

mod outcome;
mod role;

pub use outcome::{StageOutcome, StageStatus, TaskRecord};
pub use role::{RoleKey, ROLE_REGISTRY};
