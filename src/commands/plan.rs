use crate::apply::{MigrationStatus, Migrator};
use crate::commands::Project;
use crate::config::Config;
use crate::migration::MigrationKey;
use anyhow::Result;
use console::style;
use std::path::Path;

/// Print the resolved application order, marking applied migrations
pub fn cmd_plan(config: &Config, root_dir: &Path, target: Option<&MigrationKey>) -> Result<()> {
    let project = Project::load(config, root_dir)?;
    let migrator = Migrator::new(&config.settings, project.history);
    let plan = migrator.plan(&project.migrations, target)?;

    if plan.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    println!("Migration plan:");
    for migration in plan {
        let key = migration.key();
        let marker = match migrator.status_of(&key) {
            MigrationStatus::Applied => style("[X]").green(),
            _ => style("[ ]").dim(),
        };

        if migration.dependencies.is_empty() {
            println!("  {} {}", marker, key);
        } else {
            let dependencies = migration
                .dependencies
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {} {} {}",
                marker,
                key,
                style(format!("(depends on {})", dependencies)).dim()
            );
        }
    }

    Ok(())
}
