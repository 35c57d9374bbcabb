//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - The database path is resolved once per process and then reused.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Overrides the document database location when set to a non-blank path.
pub const DB_PATH_ENV: &str = "STUDYPLAN_DB_PATH";
pub const DEFAULT_DB_FILE_NAME: &str = "studyplan.sqlite3";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the document database path for this process.
pub fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| db_path_from(std::env::var(DB_PATH_ENV).ok().as_deref()))
        .clone()
}

/// Picks the database path from a raw override value.
///
/// Blank or missing overrides fall back to the temp directory.
pub fn db_path_from(raw: Option<&str>) -> PathBuf {
    match raw.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => PathBuf::from(trimmed),
        _ => std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::{db_path_from, DEFAULT_DB_FILE_NAME};
    use std::path::PathBuf;

    #[test]
    fn override_is_trimmed() {
        assert_eq!(
            db_path_from(Some("  /data/plan.db ")),
            PathBuf::from("/data/plan.db")
        );
    }

    #[test]
    fn blank_override_falls_back_to_temp_dir() {
        let path = db_path_from(Some("   "));
        assert!(path.ends_with(DEFAULT_DB_FILE_NAME));
        assert_eq!(db_path_from(None), path);
    }
}
