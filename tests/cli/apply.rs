//! `migrun apply` end to end

use crate::fixtures::music;
use crate::helpers::cli::with_cli_helper;
use anyhow::Result;
use predicates::prelude::*;
use std::fs;

fn fixture_keys() -> Vec<String> {
    music::APPLY_ORDER
        .iter()
        .map(|(app, name)| format!("{}.{}", app, name))
        .collect()
}

#[test]
fn test_apply_records_history() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;

        helper
            .command()
            .arg("apply")
            .assert()
            .success()
            .stdout(predicate::str::contains("Applied 3 migrations"));

        assert_eq!(helper.applied()?, fixture_keys());
        Ok(())
    })
}

#[test]
fn test_apply_twice_is_idempotent() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;

        helper.command().arg("apply").assert().success();
        let first = fs::read_to_string(helper.history_path())?;

        helper
            .command()
            .arg("apply")
            .assert()
            .success()
            .stdout(predicate::str::contains("No migrations to apply (3 already applied)"));

        // History is untouched by the second run
        assert_eq!(fs::read_to_string(helper.history_path())?, first);
        Ok(())
    })
}

#[test]
fn test_apply_dry_run_records_nothing() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;

        helper
            .command()
            .args(["apply", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Would apply music.create_lyricline_model"))
            .stdout(predicate::str::contains("CREATE TABLE \"genres\" ("));

        assert!(!helper.history_path().exists());
        Ok(())
    })
}

#[test]
fn test_apply_to_target() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;

        helper
            .command()
            .args(["apply", "--target", "music/create_lyricline_model"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Applied 1 migration "));

        assert_eq!(helper.applied()?, vec!["music.create_lyricline_model"]);

        helper
            .command()
            .arg("apply")
            .assert()
            .success()
            .stdout(predicate::str::contains("Applied 2 migrations"));

        assert_eq!(helper.applied()?.len(), 3);
        Ok(())
    })
}

#[test]
fn test_failed_migration_exits_non_zero_and_keeps_earlier_work() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;
        helper.write_migration(
            "music",
            "0002_broken.yaml",
            r#"app_name: music
migration_name: "0002_broken"
dependencies:
  - [music, "0001_artist_alter_comment_options_comment_parent_and_more"]
operations:
  - op: add_column
    table: artists
    column:
      name: website
      field: {kind: char, max_length: 200}
      nullable: true
  - op: add_column
    table: songs
    column:
      name: title
      field: {kind: text}
"#,
        )?;

        helper
            .command()
            .arg("apply")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Failed:"))
            .stderr(predicate::str::contains(
                "Migration music.0002_broken failed at operation 1 (AddColumn songs.title)",
            ));

        assert_eq!(helper.applied()?, fixture_keys());
        Ok(())
    })
}

#[test]
fn test_migrations_dir_from_environment() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;
        fs::rename(
            helper.project_root.join("migrations"),
            helper.project_root.join("db"),
        )?;

        helper
            .command()
            .env("MIGRUN_MIGRATIONS_DIR", "db")
            .arg("apply")
            .assert()
            .success()
            .stdout(predicate::str::contains("Applied 3 migrations"));

        Ok(())
    })
}

#[test]
fn test_cli_history_file_overrides_default() -> Result<()> {
    with_cli_helper(|helper| {
        helper.init_project()?;

        helper
            .command()
            .args(["apply", "--history-file", "state/applied.json"])
            .assert()
            .success();

        assert!(helper.project_root.join("state/applied.json").exists());
        assert!(!helper.history_path().exists());
        Ok(())
    })
}
