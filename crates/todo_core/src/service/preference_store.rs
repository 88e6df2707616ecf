//! Preference store: selected theme and app icon.
//!
//! # Responsibility
//! - Load persisted selections once at construction.
//! - Validate, persist and publish new selections.
//! - Forward icon selections to the platform `IconProvider`.
//!
//! # Invariants
//! - Reads are lock-free and never observe a value that was not persisted.
//! - Writes are serialized; each one persists, publishes, notifies and (for
//!   icons) applies before returning, so notifications and platform icon
//!   switches follow write order.
//! - A corrupted stored value never fails a read: the theme falls back to
//!   the default theme and the icon falls back to "no custom icon".

use crate::model::theme::{default_theme, find_theme, Theme};
use crate::observer::{ObserverRegistry, SubscriptionId};
use crate::repo::preference_repo::{PreferenceRepository, SELECTED_ICON_KEY, SELECTED_THEME_KEY};
use crate::service::error::{StoreError, StoreResult, ValidationError};
use crate::service::icon::{IconApplyOutcome, IconProvider};
use log::{error, info, warn};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const NO_ICON: i64 = -1;

/// Change published by `PreferenceStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceEvent {
    ThemeChanged(Theme),
    IconChanged {
        index: Option<usize>,
        name: Option<String>,
    },
}

pub struct PreferenceStore<R: PreferenceRepository, P: IconProvider> {
    repo: Mutex<R>,
    icons: P,
    icon_names: Vec<String>,
    theme_id: AtomicI64,
    icon_index: AtomicI64,
    observers: ObserverRegistry<PreferenceEvent>,
}

impl<R: PreferenceRepository, P: IconProvider> PreferenceStore<R, P> {
    /// Reads persisted selections and snapshots the icon catalogue.
    ///
    /// # Errors
    /// - `StoreError::Persistence` when the preference rows cannot be read.
    pub fn load(repo: R, icons: P) -> StoreResult<Self> {
        let icon_names = icons.icon_names();
        let stored_theme = repo.read_int(SELECTED_THEME_KEY)?;
        let stored_icon = repo.read_int(SELECTED_ICON_KEY)?;

        let theme_id = stored_theme.unwrap_or_else(|| i64::from(default_theme().id));
        if find_theme(theme_id).is_none() {
            warn!(
                "event=preferences_load module=preference_store status=fallback key={SELECTED_THEME_KEY} stored={theme_id}"
            );
        }

        let icon_index = match stored_icon {
            None => NO_ICON,
            Some(index) if icon_index_in_range(index, icon_names.len()) => index,
            Some(index) => {
                warn!(
                    "event=preferences_load module=preference_store status=fallback key={SELECTED_ICON_KEY} stored={index} icon_count={}",
                    icon_names.len()
                );
                NO_ICON
            }
        };

        info!(
            "event=preferences_load module=preference_store status=ok theme={theme_id} icon={icon_index}"
        );

        Ok(Self {
            repo: Mutex::new(repo),
            icons,
            icon_names,
            theme_id: AtomicI64::new(theme_id),
            icon_index: AtomicI64::new(icon_index),
            observers: ObserverRegistry::new("preferences"),
        })
    }

    /// Currently selected theme, or the default theme when the stored id is unknown.
    pub fn selected_theme(&self) -> Theme {
        let id = self.theme_id.load(Ordering::Acquire);
        *find_theme(id).unwrap_or_else(default_theme)
    }

    /// Selects and persists a theme.
    ///
    /// # Errors
    /// - `ValidationError::UnknownTheme` when `id` is not registered; nothing changes.
    /// - `StoreError::Persistence` when the write fails; the old theme stays selected.
    pub fn set_selected_theme(&self, id: u32) -> StoreResult<Theme> {
        self.reject_reentrant_write()?;
        let theme = *find_theme(i64::from(id))
            .ok_or(ValidationError::UnknownTheme(i64::from(id)))?;

        let repo = self.lock_repo();
        if self.theme_id.load(Ordering::Acquire) == i64::from(id) {
            return Ok(theme);
        }

        if let Err(err) = repo.write_int(SELECTED_THEME_KEY, Some(i64::from(id))) {
            error!(
                "event=preference_write module=preference_store status=error key={SELECTED_THEME_KEY} error={err}"
            );
            return Err(err.into());
        }
        self.theme_id.store(i64::from(id), Ordering::Release);
        info!(
            "event=preference_write module=preference_store status=ok key={SELECTED_THEME_KEY} value={id}"
        );

        self.observers.notify(&PreferenceEvent::ThemeChanged(theme));
        drop(repo);
        Ok(theme)
    }

    /// Ordered icon identifiers supplied by the provider.
    pub fn icon_names(&self) -> &[String] {
        &self.icon_names
    }

    /// Index of the selected custom icon; `None` means the default icon.
    pub fn selected_icon(&self) -> Option<usize> {
        let index = self.icon_index.load(Ordering::Acquire);
        usize::try_from(index).ok()
    }

    pub fn selected_icon_name(&self) -> Option<&str> {
        self.selected_icon()
            .and_then(|index| self.icon_names.get(index))
            .map(String::as_str)
    }

    /// Selects and persists an icon, then asks the platform to show it.
    ///
    /// The selection is kept even if the platform refuses it; that case is
    /// reported as `IconApplyOutcome::Failed`.
    pub fn set_selected_icon(&self, index: usize) -> StoreResult<IconApplyOutcome> {
        self.reject_reentrant_write()?;
        let count = self.icon_names.len();
        let stored = i64::try_from(index)
            .ok()
            .filter(|value| icon_index_in_range(*value, count))
            .ok_or(ValidationError::IconOutOfRange { index, count })?;

        self.write_icon(stored)
    }

    /// Returns to the platform's default icon.
    pub fn clear_selected_icon(&self) -> StoreResult<IconApplyOutcome> {
        self.reject_reentrant_write()?;
        self.write_icon(NO_ICON)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&PreferenceEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn write_icon(&self, stored: i64) -> StoreResult<IconApplyOutcome> {
        let index = usize::try_from(stored).ok();
        let name = index.and_then(|index| self.icon_names.get(index)).cloned();

        let repo = self.lock_repo();
        if self.icon_index.load(Ordering::Acquire) != stored {
            let value = (stored != NO_ICON).then_some(stored);
            if let Err(err) = repo.write_int(SELECTED_ICON_KEY, value) {
                error!(
                    "event=preference_write module=preference_store status=error key={SELECTED_ICON_KEY} error={err}"
                );
                return Err(err.into());
            }
            self.icon_index.store(stored, Ordering::Release);
            info!(
                "event=preference_write module=preference_store status=ok key={SELECTED_ICON_KEY} value={stored}"
            );
            self.observers.notify(&PreferenceEvent::IconChanged {
                index,
                name: name.clone(),
            });
        }
        // Apply under the write lock so the platform ends up on the stored icon.
        let outcome = self.apply_icon(name.as_deref());
        drop(repo);
        Ok(outcome)
    }

    fn apply_icon(&self, name: Option<&str>) -> IconApplyOutcome {
        if self.icons.active_icon().as_deref() == name {
            return IconApplyOutcome::AlreadyActive;
        }
        match self.icons.apply_icon(name) {
            Ok(()) => IconApplyOutcome::Applied,
            Err(err) => {
                warn!(
                    "event=icon_apply module=preference_store status=error error={err}"
                );
                IconApplyOutcome::Failed(err)
            }
        }
    }

    fn reject_reentrant_write(&self) -> StoreResult<()> {
        if self.observers.is_dispatching_on_current_thread() {
            warn!(
                "event=preference_write module=preference_store status=rejected reason=reentrant_write"
            );
            return Err(StoreError::ReentrantWrite);
        }
        Ok(())
    }

    fn lock_repo(&self) -> MutexGuard<'_, R> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn icon_index_in_range(index: i64, count: usize) -> bool {
    usize::try_from(index).is_ok_and(|index| index < count)
}
