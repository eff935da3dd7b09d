use crate::apply::Migrator;
use crate::commands::Project;
use crate::config::Config;
use crate::migration::MigrationKey;
use crate::render::{render_record_applied, render_tracking_table};
use anyhow::{Result, anyhow};
use std::path::Path;

/// Print the DDL a migration corresponds to, wrapped in a transaction
pub fn cmd_sql(config: &Config, root_dir: &Path, key: &MigrationKey) -> Result<()> {
    let project = Project::load(config, root_dir)?;
    let migration = project
        .migrations
        .iter()
        .find(|m| &m.key() == key)
        .ok_or_else(|| anyhow!("Migration {} not found", key))?;

    let migrator = Migrator::new(&config.settings, project.history);
    let statements = migrator.migration_sql(&project.migrations, key)?;
    let tracking_table = &config.history.tracking_table;

    println!("BEGIN;");
    for statement in &statements {
        println!("{}", statement);
    }
    println!("{}", render_tracking_table(tracking_table)?);
    println!(
        "{}",
        render_record_applied(tracking_table, key, &migration.checksum()?)?
    );
    println!("COMMIT;");

    Ok(())
}
