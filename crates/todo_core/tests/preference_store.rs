use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use todo_core::db::{open_db, open_db_in_memory, DbError, DbResult};
use todo_core::repo::preference_repo::{SELECTED_ICON_KEY, SELECTED_THEME_KEY};
use todo_core::{
    list_themes, AccentColor, IconApplyError, IconApplyOutcome, IconProvider, PreferenceEvent,
    PreferenceRepository, PreferenceStore, RepoError, SqlitePreferenceRepository, StoreError,
    ValidationError,
};

/// Records apply requests; can be told to refuse them.
#[derive(Clone, Default)]
struct FakeIcons {
    active: Arc<Mutex<Option<String>>>,
    applied: Arc<Mutex<Vec<Option<String>>>>,
    refuse: bool,
}

impl IconProvider for FakeIcons {
    fn icon_names(&self) -> Vec<String> {
        vec!["Blue".to_string(), "Pink".to_string(), "Green".to_string()]
    }

    fn active_icon(&self) -> Option<String> {
        self.active.lock().unwrap().clone()
    }

    fn apply_icon(&self, name: Option<&str>) -> Result<(), IconApplyError> {
        if self.refuse {
            return Err(IconApplyError("alternate icons unsupported".to_string()));
        }
        self.applied.lock().unwrap().push(name.map(str::to_string));
        *self.active.lock().unwrap() = name.map(str::to_string);
        Ok(())
    }
}

fn memory_repo() -> SqlitePreferenceRepository {
    SqlitePreferenceRepository::new(open_db_in_memory().unwrap())
}

fn record_events<R: PreferenceRepository>(
    store: &PreferenceStore<R, FakeIcons>,
) -> Arc<Mutex<Vec<PreferenceEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

#[test]
fn first_run_defaults_to_first_theme_and_no_icon() {
    let store = PreferenceStore::load(memory_repo(), FakeIcons::default()).unwrap();

    assert_eq!(store.selected_theme().id, 0);
    assert_eq!(store.selected_icon(), None);
    assert_eq!(store.selected_icon_name(), None);
}

#[test]
fn selected_theme_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.db");

    let store = PreferenceStore::load(
        SqlitePreferenceRepository::new(open_db(&path).unwrap()),
        FakeIcons::default(),
    )
    .unwrap();
    store.set_selected_theme(2).unwrap();
    drop(store);

    let reloaded = PreferenceStore::load(
        SqlitePreferenceRepository::new(open_db(&path).unwrap()),
        FakeIcons::default(),
    )
    .unwrap();
    assert_eq!(reloaded.selected_theme().id, 2);
    assert_eq!(reloaded.selected_theme().color, AccentColor::Green);
}

#[test]
fn unknown_theme_is_rejected_and_selection_unchanged() {
    let store = PreferenceStore::load(memory_repo(), FakeIcons::default()).unwrap();
    store.set_selected_theme(1).unwrap();
    let events = record_events(&store);

    let unknown = u32::try_from(list_themes().len()).unwrap();
    let err = store.set_selected_theme(unknown).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownTheme(id)) if id == i64::from(unknown)
    ));
    assert_eq!(store.selected_theme().id, 1);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn corrupted_stored_theme_falls_back_to_default() {
    let repo = memory_repo();
    repo.write_int(SELECTED_THEME_KEY, Some(42)).unwrap();

    let store = PreferenceStore::load(repo, FakeIcons::default()).unwrap();

    assert_eq!(store.selected_theme().id, 0);
    store.set_selected_theme(0).unwrap();
    assert_eq!(store.selected_theme().id, 0);
}

#[test]
fn corrupted_stored_icon_falls_back_to_none() {
    let repo = memory_repo();
    repo.write_int(SELECTED_ICON_KEY, Some(-7)).unwrap();

    let store = PreferenceStore::load(repo, FakeIcons::default()).unwrap();

    assert_eq!(store.selected_icon(), None);
}

#[test]
fn theme_change_notifies_once_and_repeat_is_silent() {
    let store = PreferenceStore::load(memory_repo(), FakeIcons::default()).unwrap();
    let events = record_events(&store);

    let theme = store.set_selected_theme(1).unwrap();
    store.set_selected_theme(1).unwrap();

    assert_eq!(theme.name, "Blue theme");
    assert_eq!(
        *events.lock().unwrap(),
        vec![PreferenceEvent::ThemeChanged(theme)]
    );
}

#[test]
fn handler_sees_new_theme_and_cannot_write_back() {
    let store = Arc::new(PreferenceStore::load(memory_repo(), FakeIcons::default()).unwrap());
    let observed = Arc::new(Mutex::new(Vec::new()));

    let inner = Arc::clone(&store);
    let sink = Arc::clone(&observed);
    store.subscribe(move |_| {
        let current = inner.selected_theme().id;
        let write_back = inner.set_selected_theme(0);
        sink.lock()
            .unwrap()
            .push((current, matches!(write_back, Err(StoreError::ReentrantWrite))));
    });

    store.set_selected_theme(2).unwrap();

    assert_eq!(*observed.lock().unwrap(), vec![(2, true)]);
    assert_eq!(store.selected_theme().id, 2);
}

#[test]
fn icon_selection_is_persisted_and_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("icons.db");
    let icons = FakeIcons::default();

    let store = PreferenceStore::load(
        SqlitePreferenceRepository::new(open_db(&path).unwrap()),
        icons.clone(),
    )
    .unwrap();
    let events = record_events(&store);

    assert_eq!(store.set_selected_icon(1).unwrap(), IconApplyOutcome::Applied);
    assert_eq!(store.selected_icon_name(), Some("Pink"));
    assert_eq!(
        *events.lock().unwrap(),
        vec![PreferenceEvent::IconChanged {
            index: Some(1),
            name: Some("Pink".to_string()),
        }]
    );
    drop(store);

    let reloaded = PreferenceStore::load(
        SqlitePreferenceRepository::new(open_db(&path).unwrap()),
        icons.clone(),
    )
    .unwrap();
    assert_eq!(reloaded.selected_icon(), Some(1));
    assert_eq!(
        *icons.applied.lock().unwrap(),
        vec![Some("Pink".to_string())]
    );
}

#[test]
fn icon_already_shown_is_not_reapplied() {
    let icons = FakeIcons::default();
    *icons.active.lock().unwrap() = Some("Green".to_string());
    let store = PreferenceStore::load(memory_repo(), icons.clone()).unwrap();

    assert_eq!(
        store.set_selected_icon(2).unwrap(),
        IconApplyOutcome::AlreadyActive
    );
    assert_eq!(store.selected_icon(), Some(2));
    assert!(icons.applied.lock().unwrap().is_empty());
}

#[test]
fn icon_out_of_range_is_rejected() {
    let store = PreferenceStore::load(memory_repo(), FakeIcons::default()).unwrap();
    store.set_selected_icon(0).unwrap();

    let err = store.set_selected_icon(3).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::IconOutOfRange { index: 3, count: 3 })
    ));
    assert_eq!(store.selected_icon(), Some(0));
}

#[test]
fn refused_icon_keeps_selection_and_reports_failure() {
    let icons = FakeIcons {
        refuse: true,
        ..FakeIcons::default()
    };
    let store = PreferenceStore::load(memory_repo(), icons).unwrap();

    let outcome = store.set_selected_icon(1).unwrap();

    assert!(matches!(outcome, IconApplyOutcome::Failed(_)));
    assert_eq!(store.selected_icon(), Some(1));
}

#[test]
fn clearing_icon_restores_default() {
    let icons = FakeIcons::default();
    let store = PreferenceStore::load(memory_repo(), icons.clone()).unwrap();
    store.set_selected_icon(0).unwrap();

    assert_eq!(store.clear_selected_icon().unwrap(), IconApplyOutcome::Applied);

    assert_eq!(store.selected_icon(), None);
    assert_eq!(
        *icons.applied.lock().unwrap(),
        vec![Some("Blue".to_string()), None]
    );
}

/// Reads work, every write fails.
struct ReadOnlyRepository(SqlitePreferenceRepository);

impl PreferenceRepository for ReadOnlyRepository {
    fn read_int(&self, key: &str) -> DbResult<Option<i64>> {
        self.0.read_int(key)
    }

    fn write_int(&self, _key: &str, _value: Option<i64>) -> DbResult<()> {
        Err(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
            Some("attempt to write a readonly database".to_string()),
        )))
    }
}

#[test]
fn failed_write_keeps_previous_selection() {
    let store =
        PreferenceStore::load(ReadOnlyRepository(memory_repo()), FakeIcons::default()).unwrap();
    let events = record_events(&store);

    let theme_err = store.set_selected_theme(1).unwrap_err();
    let icon_err = store.set_selected_icon(1).unwrap_err();

    match &theme_err {
        StoreError::Persistence(RepoError::Db(db_err)) => {
            assert_eq!(db_err.sqlite_code(), Some(rusqlite::ErrorCode::ReadOnly));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(icon_err.is_persistence());
    assert_eq!(store.selected_theme().id, 0);
    assert_eq!(store.selected_icon(), None);
    assert!(events.lock().unwrap().is_empty());
}

/// Icon "A" blocks inside `apply_icon` until the test releases it.
#[derive(Clone)]
struct GatedIcons {
    gate: Arc<Mutex<Option<(Sender<()>, Receiver<()>)>>>,
    active: Arc<Mutex<Option<String>>>,
    applied: Arc<Mutex<Vec<String>>>,
}

impl IconProvider for GatedIcons {
    fn icon_names(&self) -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn active_icon(&self) -> Option<String> {
        self.active.lock().unwrap().clone()
    }

    fn apply_icon(&self, name: Option<&str>) -> Result<(), IconApplyError> {
        if name == Some("A") {
            let gate = self.gate.lock().unwrap().take();
            if let Some((entered, release)) = gate {
                entered.send(()).unwrap();
                release.recv().unwrap();
            }
        }
        if let Some(name) = name {
            self.applied.lock().unwrap().push(name.to_string());
        }
        *self.active.lock().unwrap() = name.map(str::to_string);
        Ok(())
    }
}

#[test]
fn concurrent_icon_writes_leave_platform_on_stored_icon() {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let icons = GatedIcons {
        gate: Arc::new(Mutex::new(Some((entered_tx, release_rx)))),
        active: Arc::new(Mutex::new(None)),
        applied: Arc::new(Mutex::new(Vec::new())),
    };
    let store = Arc::new(PreferenceStore::load(memory_repo(), icons.clone()).unwrap());

    let first = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.set_selected_icon(0))
    };
    entered_rx.recv().unwrap();

    let second = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.set_selected_icon(1))
    };
    // Give the second writer time to race the blocked apply.
    thread::sleep(Duration::from_millis(50));
    release_tx.send(()).unwrap();

    assert_eq!(first.join().unwrap().unwrap(), IconApplyOutcome::Applied);
    assert_eq!(second.join().unwrap().unwrap(), IconApplyOutcome::Applied);

    assert_eq!(store.selected_icon_name(), Some("B"));
    assert_eq!(icons.active_icon().as_deref(), Some("B"));
    assert_eq!(
        *icons.applied.lock().unwrap(),
        vec!["A".to_string(), "B".to_string()]
    );
}
