//! Applying the music fixture end to end

use crate::fixtures::music;
use anyhow::Result;
use migrun::catalog::{CascadePolicy, ConstraintKind, FieldType, TableRef};
use migrun::migration::discover_migrations;
use migrun::migration_tracking::{HistoryStore, InMemoryHistory};
use migrun::{MigrationKey, Migrator, SchemaState};
use tempfile::TempDir;

fn load_fixture() -> Result<(TempDir, Vec<migrun::Migration>)> {
    let temp_dir = TempDir::new()?;
    music::write_project(temp_dir.path())?;
    let migrations = discover_migrations(&temp_dir.path().join("migrations"))?;
    Ok((temp_dir, migrations))
}

fn expected_order() -> Vec<MigrationKey> {
    music::APPLY_ORDER
        .iter()
        .map(|(app, name)| MigrationKey::new(*app, *name))
        .collect()
}

#[test]
fn test_applies_in_dependency_order() -> Result<()> {
    let (_dir, migrations) = load_fixture()?;
    let settings = music::settings();
    let mut migrator = Migrator::new(&settings, InMemoryHistory::new());
    let mut state = SchemaState::new();

    let report = migrator.run(&migrations, &mut state, None)?;

    assert_eq!(report.applied_keys(), expected_order());
    let recorded: Vec<MigrationKey> = migrator
        .history()
        .applied()
        .iter()
        .map(|entry| entry.key())
        .collect();
    assert_eq!(recorded, expected_order());

    Ok(())
}

#[test]
fn test_final_schema_state() -> Result<()> {
    let (_dir, migrations) = load_fixture()?;
    let settings = music::settings();
    let mut migrator = Migrator::new(&settings, InMemoryHistory::new());
    let mut state = SchemaState::new();
    migrator.run(&migrations, &mut state, None)?;

    let names: Vec<&str> = state.table_names().collect();
    assert_eq!(
        names,
        vec![
            "artists",
            "auth_user",
            "comments",
            "genres",
            "lyric_lines",
            "queue_items",
            "queues",
            "songs",
            "user_statuses",
        ]
    );

    // Renamed table keeps its options and self-reference
    let comments = state.table("comments").unwrap();
    assert_eq!(comments.options.ordering, vec!["-created_at".to_string()]);
    let parent = comments.column("parent").unwrap();
    assert!(parent.nullable);
    assert_eq!(
        parent.field.foreign_target(),
        Some((&TableRef::table("comments"), CascadePolicy::Cascade))
    );
    assert!(matches!(
        &comments.column("song").unwrap().field,
        FieldType::ForeignKey { related_name: Some(name), .. } if name == "comments"
    ));

    let queue_items = state.table("queue_items").unwrap();
    let unique = queue_items
        .constraint("queue_items_queue_position_uniq")
        .unwrap();
    assert_eq!(
        unique.kind,
        ConstraintKind::Unique {
            columns: vec!["queue".to_string(), "position".to_string()]
        }
    );

    let statuses = state.table("user_statuses").unwrap();
    let playing = statuses.column("currently_playing").unwrap();
    assert!(playing.nullable);
    assert_eq!(
        playing.field.foreign_target().map(|(_, policy)| policy),
        Some(CascadePolicy::SetNull)
    );
    assert_eq!(
        statuses.column("user").unwrap().field.foreign_target().map(|(to, _)| to),
        Some(&TableRef::Swappable {
            swappable: "AUTH_USER_MODEL".to_string()
        })
    );

    assert!(!state.table("queues").unwrap().column("songs").unwrap().field.is_concrete());

    Ok(())
}

#[test]
fn test_second_run_is_a_no_op() -> Result<()> {
    let (_dir, migrations) = load_fixture()?;
    let settings = music::settings();
    let mut migrator = Migrator::new(&settings, InMemoryHistory::new());
    let mut state = SchemaState::new();

    migrator.run(&migrations, &mut state, None)?;
    let after_first = state.clone();
    let history_len = migrator.history().applied().len();

    let report = migrator.run(&migrations, &mut state, None)?;

    assert_eq!(report.applied_count(), 0);
    assert_eq!(report.skipped, expected_order());
    assert_eq!(state, after_first);
    assert_eq!(migrator.history().applied().len(), history_len);

    Ok(())
}

#[test]
fn test_project_state_matches_applied_state() -> Result<()> {
    let (_dir, migrations) = load_fixture()?;
    let settings = music::settings();
    let mut migrator = Migrator::new(&settings, InMemoryHistory::new());
    let mut state = SchemaState::new();
    migrator.run(&migrations, &mut state, None)?;

    assert_eq!(migrator.project_state(&migrations)?, state);

    Ok(())
}

#[test]
fn test_migration_sql_for_queue_migration() -> Result<()> {
    let (_dir, migrations) = load_fixture()?;
    let settings = music::settings();
    let migrator = Migrator::new(&settings, InMemoryHistory::new());

    let key = MigrationKey::new(
        "music",
        "0001_artist_alter_comment_options_comment_parent_and_more",
    );
    let sql = migrator.migration_sql(&migrations, &key)?;

    assert!(sql.contains(&r#"ALTER TABLE "music_comment" RENAME TO "comments";"#.to_string()));
    assert!(sql.contains(
        &r#"ALTER TABLE "queue_items" ADD CONSTRAINT "queue_items_queue_position_uniq" UNIQUE ("queue_id", "position");"#
            .to_string()
    ));
    assert!(
        sql.iter()
            .any(|s| s.contains(r#""user_id" bigint NOT NULL UNIQUE REFERENCES "auth_user" ("id") ON DELETE CASCADE"#))
    );
    // Options and many-to-many fields have no DDL
    assert!(!sql.iter().any(|s| s.contains(r#"ADD COLUMN "songs""#)));
    assert!(!sql.iter().any(|s| s.contains("ordering")));
    // Changing only the related name leaves the foreign key alone
    assert!(sql.contains(
        &r#"ALTER TABLE "music_comment" ALTER COLUMN "song_id" TYPE bigint, ALTER COLUMN "song_id" SET NOT NULL, ALTER COLUMN "song_id" DROP DEFAULT;"#
            .to_string()
    ));

    Ok(())
}

#[test]
fn test_migration_sql_for_cascade_change() -> Result<()> {
    let (dir, _) = load_fixture()?;
    music::write_migration(
        dir.path(),
        "music",
        "0002_comment_song_set_null.yaml",
        r#"app_name: music
migration_name: "0002_comment_song_set_null"
dependencies:
  - [music, "0001_artist_alter_comment_options_comment_parent_and_more"]
operations:
  - op: alter_column
    table: comments
    column:
      name: song
      field: {kind: foreign_key, to: songs, on_delete: SET_NULL, related_name: comments}
      nullable: true
"#,
    )?;
    let migrations = discover_migrations(&dir.path().join("migrations"))?;
    let settings = music::settings();
    let migrator = Migrator::new(&settings, InMemoryHistory::new());

    let sql = migrator.migration_sql(
        &migrations,
        &MigrationKey::new("music", "0002_comment_song_set_null"),
    )?;
    assert_eq!(
        sql,
        vec![
            r#"ALTER TABLE "comments" ALTER COLUMN "song_id" TYPE bigint, ALTER COLUMN "song_id" DROP NOT NULL, ALTER COLUMN "song_id" DROP DEFAULT, DROP CONSTRAINT "comments_song_id_fkey", ADD CONSTRAINT "comments_song_id_fkey" FOREIGN KEY ("song_id") REFERENCES "songs" ("id") ON DELETE SET NULL;"#
                .to_string()
        ]
    );

    Ok(())
}
