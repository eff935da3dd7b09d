//! A small music project: an auth app providing the user model and a music
//! app whose second migration creates artists, queues and user statuses.

use anyhow::Result;
use migrun::Settings;
use std::fs;
use std::path::Path;

pub const CONFIG: &str = r#"settings:
  swappable:
    AUTH_USER_MODEL:
      app: auth
      table: auth_user
"#;

pub const AUTH_INITIAL: &str = r#"app_name: auth
migration_name: "0001_initial"
operations:
  - op: create_table
    name: auth_user
    columns:
      - name: id
        field: {kind: big_auto}
        primary_key: true
      - name: username
        field: {kind: char, max_length: 150}
        unique: true
"#;

pub const MUSIC_LYRICS: &str = r#"app_name: music
migration_name: create_lyricline_model
operations:
  - op: create_table
    name: genres
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: name, field: {kind: char, max_length: 100}}
  - op: create_table
    name: songs
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: title, field: {kind: char, max_length: 200}}
      - name: genre
        field: {kind: foreign_key, to: genres, on_delete: SET_NULL}
        nullable: true
  - op: create_table
    name: music_comment
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: text, field: {kind: text}}
      - {name: created_at, field: {kind: date_time, auto_now_add: true}}
      - name: song
        field: {kind: foreign_key, to: songs, on_delete: CASCADE}
  - op: create_table
    name: lyric_lines
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: position, field: {kind: positive_integer}}
      - {name: text, field: {kind: text}}
      - name: song
        field: {kind: foreign_key, to: songs, on_delete: CASCADE, related_name: lyrics}
"#;

pub const MUSIC_QUEUE: &str = r#"app_name: music
migration_name: "0001_artist_alter_comment_options_comment_parent_and_more"
dependencies:
  - [music, create_lyricline_model]
  - {swappable: AUTH_USER_MODEL}
operations:
  - op: create_table
    name: artists
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: name, field: {kind: char, max_length: 200}}
      - {name: bio, field: {kind: text}, default: ""}
      - name: image
        field: {kind: image, upload_to: artist_images/}
        nullable: true
  - op: alter_model_options
    table: music_comment
    options:
      ordering: ["-created_at"]
  - op: add_column
    table: music_comment
    column:
      name: parent
      field: {kind: foreign_key, to: music_comment, on_delete: CASCADE, related_name: replies}
      nullable: true
  - op: add_column
    table: genres
    column:
      name: image
      field: {kind: image, upload_to: genre_images/}
      nullable: true
  - op: add_column
    table: songs
    column:
      name: release_date
      field: {kind: date}
      nullable: true
  - op: alter_column
    table: music_comment
    column:
      name: song
      field: {kind: foreign_key, to: songs, on_delete: CASCADE, related_name: comments}
  - op: rename_table
    old_name: music_comment
    new_name: comments
  - op: create_table
    name: queues
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: created_at, field: {kind: date_time, auto_now_add: true}}
      - {name: updated_at, field: {kind: date_time, auto_now: true}}
      - name: user
        field:
          kind: one_to_one
          to: {swappable: AUTH_USER_MODEL}
          on_delete: CASCADE
          related_name: queue
  - op: create_table
    name: queue_items
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: position, field: {kind: positive_integer}}
      - {name: added_at, field: {kind: date_time, auto_now_add: true}}
      - name: queue
        field: {kind: foreign_key, to: queues, on_delete: CASCADE}
      - name: song
        field: {kind: foreign_key, to: songs, on_delete: CASCADE}
    constraints:
      - name: queue_items_queue_position_uniq
        type: unique
        columns: [queue, position]
    options:
      ordering: [position]
  - op: add_column
    table: queues
    column:
      name: songs
      field: {kind: many_to_many, to: songs, through: queue_items}
  - op: create_table
    name: user_statuses
    columns:
      - {name: id, field: {kind: big_auto}, primary_key: true}
      - {name: status_text, field: {kind: char, max_length: 255}, default: ""}
      - {name: is_listening, field: {kind: boolean}, default: false}
      - {name: updated_at, field: {kind: date_time, auto_now: true}}
      - name: currently_playing
        field: {kind: foreign_key, to: songs, on_delete: SET_NULL}
        nullable: true
      - name: user
        field:
          kind: one_to_one
          to: {swappable: AUTH_USER_MODEL}
          on_delete: CASCADE
          related_name: music_status
"#;

/// Keys of the fixture migrations in the order they must apply
pub const APPLY_ORDER: [(&str, &str); 3] = [
    ("auth", "0001_initial"),
    ("music", "create_lyricline_model"),
    (
        "music",
        "0001_artist_alter_comment_options_comment_parent_and_more",
    ),
];

pub fn settings() -> Settings {
    Settings::new().with_swappable("AUTH_USER_MODEL", "auth", "auth_user")
}

/// Write a migration file under `<root>/migrations/<app>/<file>`
pub fn write_migration(root: &Path, app: &str, file: &str, contents: &str) -> Result<()> {
    let dir = root.join("migrations").join(app);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(file), contents)?;
    Ok(())
}

/// Lay out the full music project, including `migrun.yaml`
pub fn write_project(root: &Path) -> Result<()> {
    fs::write(root.join("migrun.yaml"), CONFIG)?;
    write_migration(root, "auth", "0001_initial.yaml", AUTH_INITIAL)?;
    write_migration(root, "music", "create_lyricline_model.yaml", MUSIC_LYRICS)?;
    write_migration(
        root,
        "music",
        "0001_artist_alter_comment_options_comment_parent_and_more.yaml",
        MUSIC_QUEUE,
    )?;
    Ok(())
}
