use crate::fixtures::music;
use anyhow::Result;
use assert_cmd::Command;
use migrun::migration_tracking::{FileHistory, HistoryStore};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// CLI test helper running the migrun binary inside a temporary project
pub struct CliTestHelper {
    pub temp_dir: TempDir,
    pub project_root: PathBuf,
}

impl CliTestHelper {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project_root = temp_dir.path().to_path_buf();

        Self {
            temp_dir,
            project_root,
        }
    }

    /// Lay out the music fixture project
    pub fn init_project(&self) -> Result<()> {
        music::write_project(&self.project_root)
    }

    pub fn write_config(&self, contents: &str) -> Result<()> {
        fs::write(self.project_root.join("migrun.yaml"), contents)?;
        Ok(())
    }

    pub fn write_migration(&self, app: &str, file: &str, contents: &str) -> Result<()> {
        music::write_migration(&self.project_root, app, file, contents)
    }

    /// Command for the migrun binary, isolated from the caller's environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("migrun").unwrap();
        cmd.current_dir(&self.project_root)
            .env_remove("RUST_LOG")
            .env_remove("MIGRUN_MIGRATIONS_DIR")
            .env_remove("MIGRUN_HISTORY_FILE");
        cmd
    }

    pub fn history_path(&self) -> PathBuf {
        self.project_root.join(".migrun").join("history.json")
    }

    /// Keys recorded in the project's history file, in applied order
    pub fn applied(&self) -> Result<Vec<String>> {
        let history = FileHistory::open(self.history_path())?;
        Ok(history
            .applied()
            .iter()
            .map(|entry| entry.key().to_string())
            .collect())
    }
}

impl Default for CliTestHelper {
    fn default() -> Self {
        Self::new()
    }
}

pub fn with_cli_helper<F, R>(test_fn: F) -> R
where
    F: FnOnce(&CliTestHelper) -> R,
{
    let helper = CliTestHelper::new();
    test_fn(&helper)
}
