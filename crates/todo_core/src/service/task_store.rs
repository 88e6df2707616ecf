//! Task store: the single owner of task records.
//!
//! # Responsibility
//! - Validate and persist new tasks.
//! - Delete tasks by their position in the sorted display view.
//! - Notify subscribers after every successful mutation.
//!
//! # Invariants
//! - No in-memory copy of the collection is kept; every read goes to the
//!   repository, so readers can never see a record that was not committed.
//! - Positions are resolved against a sorted view computed under the same
//!   lock the deletes run under.
//! - Notifications are delivered after the repository lock is released, so
//!   handlers may read from the store. Writes from a handler are rejected.

use crate::model::task::{Priority, Task, TaskId};
use crate::observer::{ObserverRegistry, SubscriptionId};
use crate::repo::task_repo::TaskRepository;
use crate::service::error::{StoreError, StoreResult, ValidationError};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Change published by `TaskStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Created(Task),
    /// Tasks removed by one delete call, in view order.
    Deleted(Vec<Task>),
}

pub struct TaskStore<R: TaskRepository> {
    repo: Mutex<R>,
    observers: ObserverRegistry<TaskEvent>,
}

impl<R: TaskRepository> TaskStore<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo: Mutex::new(repo),
            observers: ObserverRegistry::new("tasks"),
        }
    }

    /// Creates and persists a task.
    ///
    /// # Errors
    /// - `ValidationError::EmptyTaskName` when `name` is blank after trimming.
    /// - `StoreError::Persistence` when the insert fails; the task is not stored.
    /// - `StoreError::ReentrantWrite` when called from a task change handler.
    pub fn create_task(&self, name: &str, priority: Priority) -> StoreResult<Task> {
        self.reject_reentrant_write("create")?;
        let task = Task::new(name, priority, now_epoch_ms()).map_err(ValidationError::from)?;

        {
            let repo = self.lock_repo();
            if let Err(err) = repo.insert_task(&task) {
                error!(
                    "event=task_create module=task_store status=error task_id={} error={err}",
                    task.id
                );
                return Err(err.into());
            }
        }

        info!(
            "event=task_create module=task_store status=ok task_id={} priority={}",
            task.id, task.priority
        );
        self.observers.notify(&TaskEvent::Created(task.clone()));
        Ok(task)
    }

    /// Deletes the tasks at `positions` of the current sorted view.
    ///
    /// Every position is range-checked before anything is removed. Each
    /// removal commits on its own; on a mid-batch failure earlier removals
    /// stand and the rest are reported in `StoreError::PartialDelete`.
    pub fn delete_tasks(
        &self,
        positions: impl IntoIterator<Item = usize>,
    ) -> StoreResult<Vec<Task>> {
        self.delete_positions(positions.into_iter().collect(), None)
    }

    /// Like `delete_tasks`, but `view` is the list the caller displayed.
    ///
    /// Fails with `ValidationError::StaleView` when the stored view has
    /// changed since, instead of deleting whatever now sits at a position.
    pub fn delete_tasks_in_view(
        &self,
        positions: impl IntoIterator<Item = usize>,
        view: &[Task],
    ) -> StoreResult<Vec<Task>> {
        self.delete_positions(positions.into_iter().collect(), Some(view))
    }

    /// Tasks sorted by name ascending (case-sensitive byte order), ties in
    /// insertion order. Recomputed on every call.
    pub fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(self.lock_repo().list_sorted()?)
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.lock_repo().count_tasks()?)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&TaskEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn delete_positions(
        &self,
        positions: BTreeSet<usize>,
        expected_view: Option<&[Task]>,
    ) -> StoreResult<Vec<Task>> {
        self.reject_reentrant_write("delete")?;
        if positions.is_empty() {
            return Ok(Vec::new());
        }

        let mut removed = Vec::with_capacity(positions.len());
        let failure = {
            let repo = self.lock_repo();
            let view = repo.list_sorted()?;

            if let Some(expected) = expected_view {
                if !same_ids(expected, &view) {
                    warn!(
                        "event=task_delete module=task_store status=rejected reason=stale_view expected_len={} actual_len={}",
                        expected.len(),
                        view.len()
                    );
                    return Err(ValidationError::StaleView.into());
                }
            }
            if let Some(&position) = positions.iter().find(|&&position| position >= view.len()) {
                return Err(ValidationError::PositionOutOfRange {
                    position,
                    len: view.len(),
                }
                .into());
            }

            let mut failure = None;
            let ordered: Vec<usize> = positions.into_iter().collect();
            for (index, &position) in ordered.iter().enumerate() {
                let task = &view[position];
                match repo.delete_task(task.id) {
                    Ok(()) => removed.push(task.clone()),
                    Err(err) => {
                        error!(
                            "event=task_delete module=task_store status=error task_id={} position={position} error={err}",
                            task.id
                        );
                        failure = Some((err, ordered[index..].to_vec()));
                        break;
                    }
                }
            }
            failure
        };

        info!(
            "event=task_delete module=task_store status={} removed={}",
            if failure.is_none() { "ok" } else { "partial" },
            removed.len()
        );
        if !removed.is_empty() {
            self.observers.notify(&TaskEvent::Deleted(removed.clone()));
        }

        match failure {
            None => Ok(removed),
            Some((err, remaining)) => Err(StoreError::PartialDelete {
                removed: removed.iter().map(|task| task.id).collect::<Vec<TaskId>>(),
                remaining,
                source: Box::new(err.into()),
            }),
        }
    }

    fn reject_reentrant_write(&self, operation: &'static str) -> StoreResult<()> {
        if self.observers.is_dispatching_on_current_thread() {
            warn!(
                "event=task_{operation} module=task_store status=rejected reason=reentrant_write"
            );
            return Err(StoreError::ReentrantWrite);
        }
        Ok(())
    }

    fn lock_repo(&self) -> MutexGuard<'_, R> {
        // Durable state is the only state; a poisoned guard hides nothing stale.
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn same_ids(left: &[Task], right: &[Task]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.id == b.id)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
