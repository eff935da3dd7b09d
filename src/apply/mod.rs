//! Applying migrations to a schema state
//!
//! Migrations run sequentially in resolved order. Each one runs inside a
//! [`SchemaTransaction`]: either every operation succeeds and the state and
//! history are updated, or nothing about that migration is kept.

pub mod operations;
pub mod transaction;

pub use operations::apply_operation;
pub use transaction::SchemaTransaction;

use crate::catalog::SchemaState;
use crate::error::{ApplyError, ResolveError};
use crate::migration::{Migration, MigrationKey, Resolver};
use crate::migration_tracking::{AppliedMigration, HistoryStore};
use crate::render::{previous_column, render_operation};
use crate::settings::Settings;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-migration lifecycle: Pending -> Applying -> Applied | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Pending,
    Applying,
    Applied,
    Failed,
}

impl MigrationStatus {
    pub fn can_transition_to(self, next: MigrationStatus) -> bool {
        matches!(
            (self, next),
            (MigrationStatus::Pending, MigrationStatus::Applying)
                | (MigrationStatus::Applying, MigrationStatus::Applied)
                | (MigrationStatus::Applying, MigrationStatus::Failed)
        )
    }
}

/// Result of applying one migration
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub key: MigrationKey,
    pub status: MigrationStatus,
    pub operations: usize,
    /// DDL equivalent of the applied operations
    pub statements: Vec<String>,
    pub duration: Duration,
}

/// Summary of an apply run
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub applied: Vec<MigrationOutcome>,
    pub skipped: Vec<MigrationKey>,
}

impl ApplyReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn applied_keys(&self) -> Vec<MigrationKey> {
        self.applied.iter().map(|o| o.key.clone()).collect()
    }
}

/// Drives resolution, application and recording of migrations
pub struct Migrator<'s, H: HistoryStore> {
    settings: &'s Settings,
    history: H,
    dry_run: bool,
    statuses: BTreeMap<MigrationKey, MigrationStatus>,
}

impl<'s, H: HistoryStore> Migrator<'s, H> {
    pub fn new(settings: &'s Settings, history: H) -> Self {
        Self {
            settings,
            history,
            dry_run: false,
            statuses: BTreeMap::new(),
        }
    }

    /// Apply to the state without recording anything in the history
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Status of a migration as seen by this migrator
    pub fn status_of(&self, key: &MigrationKey) -> MigrationStatus {
        if let Some(status) = self.statuses.get(key) {
            return *status;
        }
        if self.history.contains(key) {
            MigrationStatus::Applied
        } else {
            MigrationStatus::Pending
        }
    }

    /// Resolved order, optionally limited to a target and its dependencies
    pub fn plan<'m>(
        &self,
        migrations: &'m [Migration],
        target: Option<&MigrationKey>,
    ) -> Result<Vec<&'m Migration>, ApplyError> {
        let resolver = Resolver::new(self.settings);
        let order = match target {
            Some(target) => resolver.plan_for(migrations, target)?,
            None => resolver.resolve(migrations)?,
        };
        Ok(order)
    }

    /// Migrations in the plan that are not yet applied.
    ///
    /// Applied migrations are checked against their recorded checksum.
    pub fn pending<'m>(
        &self,
        migrations: &'m [Migration],
        target: Option<&MigrationKey>,
    ) -> Result<Vec<&'m Migration>, ApplyError> {
        let mut pending = Vec::new();
        for migration in self.plan(migrations, target)? {
            if self.verify_applied(migration)? {
                continue;
            }
            pending.push(migration);
        }
        Ok(pending)
    }

    /// Rebuild the schema state by replaying every applied migration in order
    pub fn project_state(&self, migrations: &[Migration]) -> Result<SchemaState, ApplyError> {
        let mut state = SchemaState::new();
        for migration in self.plan(migrations, None)? {
            if !self.history.contains(&migration.key()) {
                continue;
            }

            let mut tx = SchemaTransaction::begin(&mut state);
            apply_all(&mut tx, migration, self.settings)?;
            tx.commit();
        }

        debug!("Projected schema state with {} tables", state.len());
        Ok(state)
    }

    /// DDL for a single migration, rendered against the state its
    /// dependencies produce. Nothing is recorded.
    pub fn migration_sql(
        &self,
        migrations: &[Migration],
        key: &MigrationKey,
    ) -> Result<Vec<String>, ApplyError> {
        let plan = self.plan(migrations, Some(key))?;
        let Some((target, dependencies)) = plan.split_last() else {
            return Err(ResolveError::UnknownTarget(key.clone()).into());
        };

        let mut state = SchemaState::new();
        for migration in dependencies {
            let mut tx = SchemaTransaction::begin(&mut state);
            apply_all(&mut tx, migration, self.settings)?;
            tx.commit();
        }

        let mut tx = SchemaTransaction::begin(&mut state);
        apply_all(&mut tx, target, self.settings)
    }

    /// Apply one migration atomically and record it
    pub fn apply_migration(
        &mut self,
        state: &mut SchemaState,
        migration: &Migration,
    ) -> Result<MigrationOutcome, ApplyError> {
        let key = migration.key();
        if self.history.contains(&key) {
            return Err(ApplyError::AlreadyApplied(key));
        }

        // Not recorded: an earlier dry run or failure on this migrator starts over
        self.statuses.remove(&key);

        let checksum = migration.checksum()?;
        self.transition(&key, MigrationStatus::Applying);
        info!("Applying migration {}", key);

        let start = Instant::now();
        let mut tx = SchemaTransaction::begin(state);
        let statements = match apply_all(&mut tx, migration, self.settings) {
            Ok(statements) => statements,
            Err(err) => {
                warn!("Migration {} failed, rolling back: {}", key, err);
                self.transition(&key, MigrationStatus::Failed);
                return Err(err);
            }
        };

        if !self.dry_run
            && let Err(err) = self.history.record(AppliedMigration::new(&key, checksum))
        {
            self.transition(&key, MigrationStatus::Failed);
            return Err(ApplyError::History(err));
        }
        tx.commit();

        self.transition(&key, MigrationStatus::Applied);
        let duration = start.elapsed();
        info!(
            "Applied migration {} ({} operations in {:?})",
            key,
            migration.operations.len(),
            duration
        );

        Ok(MigrationOutcome {
            key,
            status: MigrationStatus::Applied,
            operations: migration.operations.len(),
            statements,
            duration,
        })
    }

    /// Apply every pending migration in order, halting at the first failure
    pub fn run(
        &mut self,
        migrations: &[Migration],
        state: &mut SchemaState,
        target: Option<&MigrationKey>,
    ) -> Result<ApplyReport, ApplyError> {
        let plan = self.plan(migrations, target)?;
        let mut report = ApplyReport::default();

        for migration in plan {
            if self.verify_applied(migration)? {
                debug!("Migration {} already applied, skipping", migration.key());
                report.skipped.push(migration.key());
                continue;
            }
            report.applied.push(self.apply_migration(state, migration)?);
        }

        info!(
            "Apply run finished: {} applied, {} already applied",
            report.applied.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// True when the migration is recorded; errors if it changed since
    fn verify_applied(&self, migration: &Migration) -> Result<bool, ApplyError> {
        let key = migration.key();
        let Some(entry) = self.history.find(&key) else {
            return Ok(false);
        };

        let actual = migration.checksum()?;
        if entry.checksum != actual {
            return Err(ApplyError::ChecksumMismatch {
                migration: key,
                expected: entry.checksum.clone(),
                actual,
            });
        }
        Ok(true)
    }

    fn transition(&mut self, key: &MigrationKey, next: MigrationStatus) {
        let current = self.status_of(key);
        debug_assert!(
            current.can_transition_to(next),
            "invalid status transition for {}: {:?} -> {:?}",
            key,
            current,
            next
        );
        self.statuses.insert(key.clone(), next);
    }
}

/// Apply and render every operation of a migration inside `tx`
fn apply_all(
    tx: &mut SchemaTransaction<'_>,
    migration: &Migration,
    settings: &Settings,
) -> Result<Vec<String>, ApplyError> {
    let mut statements = Vec::new();
    for (index, operation) in migration.operations.iter().enumerate() {
        let previous = previous_column(tx.state(), operation);
        apply_operation(tx.state_mut(), operation, settings).map_err(|source| {
            ApplyError::Failed {
                migration: migration.key(),
                operation_index: index,
                operation: operation.describe(),
                source,
            }
        })?;
        statements.extend(render_operation(
            operation,
            previous.as_ref(),
            tx.state(),
            settings,
        ));
    }
    Ok(statements)
}
