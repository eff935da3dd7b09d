//! Applied history persisted on disk across runs

use crate::fixtures::music;
use anyhow::Result;
use migrun::migration::discover_migrations;
use migrun::migration_tracking::{FileHistory, HistoryStore};
use migrun::{ApplyError, MigrationKey, Migrator, SchemaState};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_history_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    music::write_project(temp_dir.path())?;
    let migrations = discover_migrations(&temp_dir.path().join("migrations"))?;
    let history_path = temp_dir.path().join(".migrun").join("history.json");
    let settings = music::settings();

    let mut state = SchemaState::new();
    {
        let mut migrator = Migrator::new(&settings, FileHistory::open(&history_path)?);
        let report = migrator.run(&migrations, &mut state, None)?;
        assert_eq!(report.applied_count(), 3);
    }

    // A fresh process sees everything as applied and rebuilds the same state
    let mut migrator = Migrator::new(&settings, FileHistory::open(&history_path)?);
    assert!(migrator.pending(&migrations, None)?.is_empty());
    let mut projected = migrator.project_state(&migrations)?;
    assert_eq!(projected, state);

    let report = migrator.run(&migrations, &mut projected, None)?;
    assert_eq!(report.applied_count(), 0);
    assert_eq!(migrator.history().applied().len(), 3);

    Ok(())
}

#[test]
fn test_target_applies_prefix_then_rest() -> Result<()> {
    let temp_dir = TempDir::new()?;
    music::write_project(temp_dir.path())?;
    let migrations = discover_migrations(&temp_dir.path().join("migrations"))?;
    let history_path = temp_dir.path().join("history.json");
    let settings = music::settings();

    let target = MigrationKey::new("music", "create_lyricline_model");
    let mut migrator = Migrator::new(&settings, FileHistory::open(&history_path)?);
    let mut state = SchemaState::new();
    let report = migrator.run(&migrations, &mut state, Some(&target))?;
    assert_eq!(report.applied_keys(), vec![target.clone()]);
    assert!(state.contains_table("music_comment"));

    let mut migrator = Migrator::new(&settings, FileHistory::open(&history_path)?);
    let mut state = migrator.project_state(&migrations)?;
    let report = migrator.run(&migrations, &mut state, None)?;
    assert_eq!(report.applied_count(), 2);
    assert_eq!(report.skipped, vec![target]);
    assert!(state.contains_table("comments"));

    Ok(())
}

#[test]
fn test_edited_migration_detected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    music::write_project(temp_dir.path())?;
    let migrations_dir = temp_dir.path().join("migrations");
    let history_path = temp_dir.path().join("history.json");
    let settings = music::settings();

    let migrations = discover_migrations(&migrations_dir)?;
    let mut migrator = Migrator::new(&settings, FileHistory::open(&history_path)?);
    migrator.run(&migrations, &mut SchemaState::new(), None)?;

    let edited = music::AUTH_INITIAL.replace("max_length: 150", "max_length: 254");
    fs::write(migrations_dir.join("auth").join("0001_initial.yaml"), edited)?;

    let migrations = discover_migrations(&migrations_dir)?;
    let migrator = Migrator::new(&settings, FileHistory::open(&history_path)?);
    let err = migrator.pending(&migrations, None).unwrap_err();
    assert!(matches!(
        err,
        ApplyError::ChecksumMismatch { ref migration, .. } if *migration == MigrationKey::new("auth", "0001_initial")
    ));

    Ok(())
}
