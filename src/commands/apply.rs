use crate::apply::Migrator;
use crate::commands::Project;
use crate::config::Config;
use crate::migration::MigrationKey;
use crate::progress::MigrationReporter;
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Stop after this migration and its dependencies
    pub target: Option<MigrationKey>,
    /// Apply to the in-memory state only; the history is left untouched
    pub dry_run: bool,
    pub verbose: bool,
}

pub fn cmd_apply(config: &Config, root_dir: &Path, options: &ApplyOptions) -> Result<()> {
    let project = Project::load(config, root_dir)?;

    if options.dry_run {
        println!("Checking migrations (dry run, nothing will be recorded)");
    } else {
        println!("Applying migrations");
    }

    let mut migrator = Migrator::new(&config.settings, project.history).dry_run(options.dry_run);
    let mut state = migrator.project_state(&project.migrations)?;

    let target = options.target.as_ref();
    let plan = migrator.plan(&project.migrations, target)?;
    let pending: BTreeSet<MigrationKey> = migrator
        .pending(&project.migrations, target)?
        .into_iter()
        .map(|m| m.key())
        .collect();
    debug!(
        "Plan has {} migrations, {} pending",
        plan.len(),
        pending.len()
    );

    let mut reporter = MigrationReporter::new(pending.len(), options.verbose, options.dry_run);
    let start = Instant::now();
    let mut applied = 0;

    for migration in &plan {
        let key = migration.key();
        if !pending.contains(&key) {
            reporter.skip_migration(&key);
            continue;
        }

        reporter.start_migration(&key);
        match migrator.apply_migration(&mut state, migration) {
            Ok(outcome) => {
                reporter.complete_migration(&outcome);
                applied += 1;
            }
            Err(err) => {
                reporter.fail_migration(&err);
                return Err(err.into());
            }
        }
    }

    reporter.summary(applied, plan.len() - pending.len(), start.elapsed());
    Ok(())
}
