//! Domain model for tasks, priorities and visual themes.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` that is never reused.
//! - Tasks are immutable once created; deletion is permanent (no tombstones).
//! - Themes are a fixed, process-wide table.

pub mod color;
pub mod task;
pub mod theme;
