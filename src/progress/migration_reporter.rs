use crate::apply::MigrationOutcome;
use crate::error::ApplyError;
use crate::migration::MigrationKey;
use console::style;
use std::time::Duration;

/// Console progress for an apply run, one line per migration
pub struct MigrationReporter {
    total_migrations: usize,
    current_migration: usize,
    verbose: bool,
    dry_run: bool,
}

impl MigrationReporter {
    pub fn new(total_migrations: usize, verbose: bool, dry_run: bool) -> Self {
        Self {
            total_migrations,
            current_migration: 0,
            verbose,
            dry_run,
        }
    }

    pub fn start_migration(&mut self, key: &MigrationKey) {
        self.current_migration += 1;

        if self.verbose {
            println!(
                "  Migration {}/{}: {}",
                self.current_migration, self.total_migrations, key
            );
        }
    }

    pub fn skip_migration(&self, key: &MigrationKey) {
        if self.verbose {
            println!("  {} {} already applied", style("-").dim(), style(key).dim());
        }
    }

    pub fn complete_migration(&self, outcome: &MigrationOutcome) {
        let duration_str = format_duration(outcome.duration);
        let verb = if self.dry_run { "Would apply" } else { "Applied" };
        println!(
            "  {} {} {} ({} operations, {})",
            style("✓").green(),
            verb,
            outcome.key,
            outcome.operations,
            style(&duration_str).dim()
        );

        if self.verbose || self.dry_run {
            for statement in &outcome.statements {
                for line in statement.lines() {
                    println!("      {}", style(line).dim());
                }
            }
        }
    }

    pub fn fail_migration(&self, error: &ApplyError) {
        let err_str = error.to_string();
        println!("  {} Failed: {}", style("✗").red(), style(&err_str).red());

        if let ApplyError::Failed { migration, .. } = error {
            println!(
                "    Migration {} was rolled back; no later migrations were applied",
                style(migration).yellow()
            );
        }
    }

    pub fn summary(&self, applied: usize, skipped: usize, total_duration: Duration) {
        let duration_str = format_duration(total_duration);

        if applied == 0 {
            println!(
                "{} No migrations to apply ({} already applied)",
                style("✓").green(),
                skipped
            );
            return;
        }

        println!(
            "{} {} {} migration{} in {}",
            style("✓").green(),
            if self.dry_run { "Checked" } else { "Applied" },
            applied,
            if applied == 1 { "" } else { "s" },
            style(&duration_str).green()
        );
    }
}

pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let millis = d.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{}s", total_secs, millis / 100)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m{}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
