//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define storage contracts consumed by the task and preference stores.
//! - Keep SQL details out of store orchestration.
//!
//! # Invariants
//! - Task writes call `Task::validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidData`) in
//!   addition to DB transport errors.

pub mod preference_repo;
pub mod task_repo;
