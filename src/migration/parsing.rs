use crate::constants::MIGRATION_EXTENSIONS;
use crate::migration::Migration;
use anyhow::{Context, Result, anyhow, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load a single migration file, choosing the format from its extension
pub fn load_migration_file(path: &Path) -> Result<Migration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read migration file: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| anyhow!("Migration file has no extension: {}", path.display()))?;

    let migration: Migration = match extension {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in migration file: {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in migration file: {}", path.display()))?,
        other => bail!(
            "Unsupported migration file extension '{}': {}",
            other,
            path.display()
        ),
    };

    Ok(migration)
}

/// Find all migration files under `<migrations_dir>/<app>/` and load them.
///
/// Files are returned sorted by path. Each file's `app_name` must match the
/// directory it lives in and its `migration_name` the file stem.
pub fn discover_migrations(migrations_dir: &Path) -> Result<Vec<Migration>> {
    if !migrations_dir.exists() {
        debug!(
            "Migrations directory {} does not exist",
            migrations_dir.display()
        );
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for extension in MIGRATION_EXTENSIONS {
        let pattern = migrations_dir.join("*").join(format!("*.{}", extension));
        let pattern = pattern.to_string_lossy();
        for entry in glob::glob(&pattern)
            .with_context(|| format!("Invalid migration glob pattern: {}", pattern))?
        {
            paths.push(entry?);
        }
    }
    paths.sort();

    let mut migrations = Vec::with_capacity(paths.len());
    for path in paths {
        let migration = load_migration_file(&path)?;

        let app_dir = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if app_dir != migration.app_name {
            bail!(
                "Migration {} declares app '{}' but lives in directory '{}'",
                path.display(),
                migration.app_name,
                app_dir
            );
        }

        let file_stem = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if file_stem != migration.migration_name {
            bail!(
                "Migration {} declares name '{}' but the file is named '{}'",
                path.display(),
                migration.migration_name,
                file_stem
            );
        }

        debug!("Loaded migration {} from {}", migration.key(), path.display());
        migrations.push(migration);
    }

    info!(
        "Discovered {} migrations in {}",
        migrations.len(),
        migrations_dir.display()
    );

    Ok(migrations)
}
