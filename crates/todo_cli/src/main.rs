//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `todo_core` wiring against a real database without any UI.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Environment: `TODO_DB_PATH`, `TODO_LOG_LEVEL`, `TODO_LOG_DIR`.

use std::path::PathBuf;
use std::process::ExitCode;
use todo_core::{list_themes, open_app, CoreConfig, StaticIconProvider};

const DEFAULT_DB_FILE_NAME: &str = "todo_app.sqlite3";

fn main() -> ExitCode {
    let config = config_from_env();
    let app = match open_app(&config, StaticIconProvider::default()) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("todo_core open failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("todo_core version={}", todo_core::core_version());
    if let Some(path) = &config.db_path {
        println!("db_path={}", path.display());
    }
    for theme in list_themes() {
        println!(
            "theme id={} name={:?} color={}",
            theme.id,
            theme.name,
            theme.color.hex()
        );
    }

    let selected = app.preferences.selected_theme();
    println!(
        "selected_theme={} selected_icon={}",
        selected.id,
        app.preferences.selected_icon_name().unwrap_or("default")
    );

    match app.tasks.list_tasks() {
        Ok(tasks) => {
            println!("tasks={}", tasks.len());
            for (position, task) in tasks.iter().enumerate() {
                println!(
                    "{position}: [{}] {} ({})",
                    task.priority,
                    task.name,
                    task.priority.accent().name()
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("todo_core list failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn config_from_env() -> CoreConfig {
    let mut config = CoreConfig::default()
        .with_db_path(env_path("TODO_DB_PATH").unwrap_or_else(|| {
            std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
        }));
    if let Some(level) = env_value("TODO_LOG_LEVEL") {
        config = config.with_log_level(level);
    }
    if let Some(dir) = env_path("TODO_LOG_DIR") {
        config = config.with_log_dir(dir);
    }
    config
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(PathBuf::from)
}
