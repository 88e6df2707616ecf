//! Stores exposed to display layers.
//!
//! # Responsibility
//! - Orchestrate repository calls into validated, observable operations.
//! - Keep display layers decoupled from storage details.

pub mod error;
pub mod icon;
pub mod preference_store;
pub mod task_store;
