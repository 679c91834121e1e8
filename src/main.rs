use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};

use shelfload::config::{StoreConfig, StoreKind};
use shelfload::data_importer::{run_import, CommitMode, Dataset, ImportJob, ImportOptions, ITEMS_TABLE, PEOPLE_TABLE};
use shelfload::maintenance::{default_backup_name, drop_tables, setup_schema, BackupProvider, PgDumpBackup, SqliteFileBackup};
use shelfload::source::SourceFormat;
use shelfload::store::{close_after, Connection};

/// Exit code for imports that finished with rejected records
const EXIT_PARTIAL_IMPORT: i32 = 2;

#[derive(Parser)]
#[command(name = "shelfload")]
#[command(about = "Load library users and books from CSV/JSON into PostgreSQL or SQLite")]
#[command(version = "0.1.0")]
#[command(after_help = "EXAMPLES:
    # Create the schema in a SQLite file and load users from CSV
    shelfload --store sqlite --database folder/litedata.db setup
    shelfload --store sqlite --database folder/litedata.db import --dataset users --source Użytkownicy.csv

    # Load books from a JSON document into PostgreSQL using a credentials file
    shelfload --store postgres --credentials database_creds.json import --dataset books --source dane.json

    # Back up and restore a SQLite database
    shelfload --store sqlite --database folder/litedata.db backup --output kopie/baza_backup.db
    shelfload --store sqlite --database folder/litedata.db restore --input kopie/baza_backup.db")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    store: StoreArgs,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Args)]
struct StoreArgs {
    /// Kind of destination store
    #[arg(long, global = true, value_enum, default_value = "sqlite")]
    store: StoreChoice,

    /// SQLite database file, or PostgreSQL connection string
    #[arg(long, global = true, value_name = "PATH|DSN", default_value = "")]
    database: String,

    /// JSON file with host_name, user_name, db_name, password, port_number (PostgreSQL)
    #[arg(long, global = true, value_name = "FILE")]
    credentials: Option<PathBuf>,
}

impl StoreArgs {
    fn to_config(&self) -> StoreConfig {
        let config = match self.store {
            StoreChoice::Postgres => StoreConfig::postgres(self.database.clone()),
            StoreChoice::Sqlite => StoreConfig::sqlite(&self.database),
        };
        match &self.credentials {
            Some(path) => config.with_credentials_file(path.clone()),
            None => config,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StoreChoice {
    Postgres,
    Sqlite,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DatasetChoice {
    Users,
    Books,
}

impl From<DatasetChoice> for Dataset {
    fn from(choice: DatasetChoice) -> Self {
        match choice {
            DatasetChoice::Users => Dataset::Users,
            DatasetChoice::Books => Dataset::Books,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatChoice {
    Csv,
    Json,
}

impl From<FormatChoice> for SourceFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Csv => SourceFormat::Csv,
            FormatChoice::Json => SourceFormat::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CommitChoice {
    /// One transaction for the whole file
    Batch,
    /// Commit after every successful record
    PerRecord,
}

impl From<CommitChoice> for CommitMode {
    fn from(choice: CommitChoice) -> Self {
        match choice {
            CommitChoice::Batch => CommitMode::Batch,
            CommitChoice::PerRecord => CommitMode::PerRecord,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the people and items tables if they do not exist
    Setup,

    /// Import one dataset from a CSV or JSON source file
    Import {
        /// Which dataset the source holds
        #[arg(long, value_enum)]
        dataset: DatasetChoice,

        /// Source file path
        #[arg(short, long, value_name = "FILE")]
        source: PathBuf,

        /// Source format (inferred from the extension by default)
        #[arg(long, value_enum)]
        format: Option<FormatChoice>,

        /// Dataset key inside a JSON document, matched ignoring case
        #[arg(long)]
        key: Option<String>,

        /// Destination table (defaults to the dataset's table)
        #[arg(long)]
        table: Option<String>,

        /// When successful records are committed
        #[arg(long, value_enum, default_value = "batch")]
        commit: CommitChoice,
    },

    /// Drop tables if they exist, in the order given
    Drop {
        #[arg(required = true)]
        tables: Vec<String>,
    },

    /// Write a backup of the store
    Backup {
        /// Backup file (defaults to a timestamped name in the current directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Restore the store from a backup
    Restore {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Drop both tables and create the schema again
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    info!("Starting shelfload v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.store.to_config();

    let outcome = match cli.command {
        Commands::Setup => execute_setup(&config, false).await,
        Commands::Reset => execute_setup(&config, true).await,
        Commands::Import {
            dataset,
            source,
            format,
            key,
            table,
            commit,
        } => {
            let job = ImportJob {
                dataset: dataset.into(),
                source,
                format: format.map(Into::into),
                key,
                table,
                options: ImportOptions {
                    commit_mode: commit.into(),
                },
            };
            execute_import(&config, &job).await
        }
        Commands::Drop { tables } => execute_drop(&config, &tables).await,
        Commands::Backup { output } => execute_backup(&config, output).await,
        Commands::Restore { input } => execute_restore(&config, &input).await,
    };

    if let Err(e) = outcome {
        eprintln!("shelfload failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Create the schema, optionally dropping both tables first
async fn execute_setup(config: &StoreConfig, reset: bool) -> Result<()> {
    let mut store = Connection::open(config).await?;

    let outcome = async {
        if reset {
            info!("Dropping existing tables");
            drop_tables(&mut store, &[ITEMS_TABLE, PEOPLE_TABLE]).await?;
        }
        setup_schema(&mut store).await
    }
    .await;

    close_after(store, outcome).await.context("schema setup failed")?;
    info!("Schema setup completed");
    Ok(())
}

/// Run one import and report its outcome
async fn execute_import(config: &StoreConfig, job: &ImportJob) -> Result<()> {
    let result = run_import(config, job)
        .await
        .with_context(|| format!("import of {} failed", job.source.display()))?;

    info!("Summary: {}", result.summary());
    if !result.is_successful() {
        for failure in &result.failures {
            error!(index = failure.index, error = %failure.error, "Record not imported");
        }
        std::process::exit(EXIT_PARTIAL_IMPORT);
    }
    Ok(())
}

async fn execute_drop(config: &StoreConfig, tables: &[String]) -> Result<()> {
    let mut store = Connection::open(config).await?;
    let names: Vec<&str> = tables.iter().map(String::as_str).collect();

    let outcome = drop_tables(&mut store, &names).await;
    close_after(store, outcome).await.context("dropping tables failed")?;
    Ok(())
}

async fn execute_backup(config: &StoreConfig, output: Option<PathBuf>) -> Result<()> {
    let written = match config.kind {
        StoreKind::Sqlite => {
            let dest = output.unwrap_or_else(|| default_backup_name("db"));
            SqliteFileBackup::new(config.database_path()?).dump(&dest).await?
        }
        StoreKind::Postgres => {
            let dest = output.unwrap_or_else(|| default_backup_name("sql"));
            PgDumpBackup::new(config.connection_string()?).dump(&dest).await?
        }
    };
    info!("Backup written to {}", written.display());
    Ok(())
}

async fn execute_restore(config: &StoreConfig, input: &Path) -> Result<()> {
    match config.kind {
        StoreKind::Sqlite => SqliteFileBackup::new(config.database_path()?).restore(input).await?,
        StoreKind::Postgres => {
            warn!("Restoring replays the dump on top of the current database contents");
            PgDumpBackup::new(config.connection_string()?).restore(input).await?
        }
    }
    info!("Restore completed from {}", input.display());
    Ok(())
}

/// Initialize logging based on CLI configuration
fn initialize_logging(cli: &Cli) -> Result<()> {
    let log_level = if let Some(level) = &cli.log_level {
        level.clone().into()
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .init();
    }

    Ok(())
}
