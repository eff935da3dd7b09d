use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use migrun::commands::{self, ApplyOptions};
use migrun::config::{self, Config, ConfigInput};
use migrun::constants::CONFIG_FILENAME;
use migrun::migration::MigrationKey;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct ApplyArgs {
    /// Apply only this migration (app/name) and its dependencies
    #[arg(long)]
    target: Option<MigrationKey>,

    /// Show what would be applied without recording anything
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    directory_args: config::DirectoryArgs,

    #[command(flatten)]
    history_args: config::HistoryArgs,
}

#[derive(Parser)]
struct PlanArgs {
    /// Limit the plan to this migration (app/name) and its dependencies
    #[arg(long)]
    target: Option<MigrationKey>,

    #[command(flatten)]
    directory_args: config::DirectoryArgs,

    #[command(flatten)]
    history_args: config::HistoryArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations in dependency order
    Apply(ApplyArgs),

    /// Show the resolved application order
    Plan(PlanArgs),

    /// Show applied and pending migrations per app
    Status {
        #[command(flatten)]
        directory_args: config::DirectoryArgs,

        #[command(flatten)]
        history_args: config::HistoryArgs,
    },

    /// Print the SQL for a single migration
    Sql {
        /// App the migration belongs to
        app: String,

        /// Migration name
        name: String,

        #[command(flatten)]
        directory_args: config::DirectoryArgs,

        #[command(flatten)]
        history_args: config::HistoryArgs,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);
    run_main(cli)
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(
    file_config: ConfigInput,
    directory_args: &config::DirectoryArgs,
    history_args: &config::HistoryArgs,
) -> Result<Config> {
    let cli_config = ConfigInput {
        directories: Some(directory_args.clone().into()),
        history: Some(history_args.clone().into()),
        settings: None,
    };

    config::ConfigBuilder::new()
        .with_file(file_config)
        .with_env()
        .with_cli_args(cli_config)
        .resolve()
}

fn run_main(cli: Cli) -> Result<()> {
    let (file_config, root_dir) = config::load_config(&cli.config_file)?;
    let root_dir: &Path = &root_dir;

    match &cli.command {
        Commands::Apply(args) => {
            let config = resolve_config(file_config, &args.directory_args, &args.history_args)?;
            let options = ApplyOptions {
                target: args.target.clone(),
                dry_run: args.dry_run,
                verbose: cli.verbose || cli.debug,
            };

            info!("Applying migrations from {}", config.directories.migrations);
            commands::cmd_apply(&config, root_dir, &options)
        }
        Commands::Plan(args) => {
            let config = resolve_config(file_config, &args.directory_args, &args.history_args)?;
            commands::cmd_plan(&config, root_dir, args.target.as_ref())
        }
        Commands::Status {
            directory_args,
            history_args,
        } => {
            let config = resolve_config(file_config, directory_args, history_args)?;
            commands::cmd_status(&config, root_dir)
        }
        Commands::Sql {
            app,
            name,
            directory_args,
            history_args,
        } => {
            let config = resolve_config(file_config, directory_args, history_args)?;
            let key = MigrationKey::new(app, name);
            commands::cmd_sql(&config, root_dir, &key)
        }
    }
}
