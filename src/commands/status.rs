use crate::commands::Project;
use crate::config::Config;
use crate::migration_tracking::HistoryStore;
use anyhow::Result;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::path::Path;

pub fn cmd_status(config: &Config, root_dir: &Path) -> Result<()> {
    println!("Checking migration status");

    let project = Project::load(config, root_dir)?;
    let history = &project.history;

    if project.migrations.is_empty() {
        println!("No migrations found in {}", config.directories.migrations);
        return Ok(());
    }

    let by_app = project
        .migrations
        .iter()
        .sorted_by_key(|m| m.key())
        .chunk_by(|m| m.app_name.clone());

    let mut pending = 0;
    for (app, migrations) in &by_app {
        println!("{}", app);
        for migration in migrations {
            match history.find(&migration.key()) {
                Some(entry) => println!(
                    "  [X] {} (applied: {})",
                    migration.migration_name,
                    entry.applied_at.format("%Y-%m-%d %H:%M:%S")
                ),
                None => {
                    pending += 1;
                    println!("  [ ] {}", migration.migration_name);
                }
            }
        }
    }

    let known: BTreeSet<_> = project.migrations.iter().map(|m| m.key()).collect();
    for entry in history.applied() {
        if !known.contains(&entry.key()) {
            println!(
                "Warning: {} is recorded as applied but has no migration file",
                entry.key()
            );
        }
    }

    if pending == 0 {
        println!("All migrations have been applied");
    } else {
        println!("{} migration(s) pending", pending);
    }

    Ok(())
}
