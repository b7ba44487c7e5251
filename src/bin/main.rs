//! metasync CLI - replicate table metadata between catalogs
//!
//! Usage:
//!   metasync copy --from <catalog> --to <catalog> --from-db <db> --from-table <t> [...]
//!   metasync copy-all --from <catalog> --to <catalog> [--schema-filter <p>] [...]
//!   metasync import-all --from <catalog> --to <catalog> --repository <repo> [...]
//!   metasync copy-db --from <catalog> --to <catalog> --from-db <db> [--to-db <db>]
//!   metasync copy-symlink --catalog <catalog> --from-db <db> --from-table <t> --location-prefix <p>
//!                         [--fix-spark-placeholder]
//!   metasync diff --from <catalog> --to <catalog> --from-db <db> --from-table <t>
//!
//! Examples:
//!   metasync copy --from hive --to glue --from-db sales --from-table orders --to-branch dev
//!   metasync copy-all --from hive --to glue --schema-filter 'sales*' --continue-on-error
//!   metasync diff --from hive --to glue --from-db sales --from-table orders

use clap::{Args, Parser, Subcommand};
use metasync::bridge::BridgeCatalog;
use metasync::config::{Settings, SettingsError, SyncSettings};
use metasync::metastore::{self, BatchSync, LocationTransform, MetastoreError, TableSync};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metasync")]
#[command(about = "metasync - replicate table metadata between data catalogs")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to METASYNC_CONFIG, ./metasync.toml, ~/.config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy or merge one table (or one partition) into the target catalog
    Copy {
        #[command(flatten)]
        catalogs: CatalogPair,

        #[command(flatten)]
        table: TableArgs,

        /// SerDe name written to the target
        #[arg(long, default_value = "")]
        serde: String,

        /// Partition values; copies only that partition
        #[arg(long, num_args = 1..)]
        partition: Vec<String>,

        #[command(flatten)]
        locations: LocationArgs,
    },

    /// Copy or merge every matching table of every matching database
    CopyAll {
        #[command(flatten)]
        catalogs: CatalogPair,

        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        locations: LocationArgs,
    },

    /// Like copy-all, addressing external locations as imported data
    ImportAll {
        #[command(flatten)]
        catalogs: CatalogPair,

        #[command(flatten)]
        batch: BatchArgs,

        /// Repository the imported data lives in
        #[arg(long)]
        repository: Option<String>,

        #[command(flatten)]
        locations: LocationArgs,
    },

    /// Copy a database definition
    CopyDb {
        #[command(flatten)]
        catalogs: CatalogPair,

        /// Source database
        #[arg(long)]
        from_db: String,

        /// Target database (defaults to the source name)
        #[arg(long)]
        to_db: Option<String>,

        #[command(flatten)]
        locations: LocationArgs,
    },

    /// Copy a table within one catalog, pointing it at a symlink tree
    CopySymlink {
        /// Catalog name from the config file
        #[arg(long)]
        catalog: String,

        #[command(flatten)]
        table: TableArgs,

        /// Root of the symlink tree
        #[arg(long)]
        location_prefix: String,

        /// Rename Spark placeholder locations
        #[arg(long)]
        fix_spark_placeholder: bool,
    },

    /// Print column and partition differences as JSON
    Diff {
        #[command(flatten)]
        catalogs: CatalogPair,

        #[command(flatten)]
        table: TableArgs,
    },
}

#[derive(Args)]
struct CatalogPair {
    /// Source catalog name from the config file
    #[arg(long)]
    from: String,

    /// Target catalog name from the config file
    #[arg(long)]
    to: String,
}

#[derive(Args)]
struct TableArgs {
    /// Source database
    #[arg(long)]
    from_db: String,

    /// Source table
    #[arg(long)]
    from_table: String,

    /// Target database (defaults to the source name)
    #[arg(long)]
    to_db: Option<String>,

    /// Target table (defaults to the source name)
    #[arg(long)]
    to_table: Option<String>,
}

impl TableArgs {
    fn request(&self) -> TableSync {
        TableSync::new(
            &self.from_db,
            &self.from_table,
            self.to_db.as_deref().unwrap_or(&self.from_db),
            self.to_table.as_deref().unwrap_or(&self.from_table),
        )
    }
}

#[derive(Args)]
struct BatchArgs {
    /// Database name pattern (`*` and `|` supported)
    #[arg(long, default_value = "*")]
    schema_filter: String,

    /// Table name pattern (`*` and `|` supported)
    #[arg(long, default_value = "*")]
    table_filter: String,

    /// Log and skip tables that fail
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Args)]
struct LocationArgs {
    /// Replacement root for dbfs:/ locations
    #[arg(long)]
    dbfs_location: Option<String>,

    /// Branch substituted into structured locations
    #[arg(long)]
    to_branch: Option<String>,

    /// Rename Spark placeholder locations
    #[arg(long)]
    fix_spark_placeholder: bool,
}

impl LocationArgs {
    /// Merge with config defaults; flags win.
    fn resolve(&self, defaults: &SyncSettings) -> (String, String, bool) {
        (
            self.dbfs_location
                .clone()
                .unwrap_or_else(|| defaults.dbfs_location.clone()),
            self.to_branch
                .clone()
                .unwrap_or_else(|| defaults.to_branch.clone()),
            self.fix_spark_placeholder || defaults.fix_spark_placeholder,
        )
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Metastore(#[from] MetastoreError),

    #[error("failed to encode diff: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Copy {
            catalogs,
            table,
            serde,
            partition,
            locations,
        } => {
            let (from, to) = connect_pair(&settings, &catalogs).await?;
            let (dbfs_location, to_branch, fix) = locations.resolve(&settings.sync);
            let request = table
                .request()
                .with_serde(serde)
                .with_partition(partition)
                .with_fix_spark_placeholder(fix);
            let transform = LocationTransform::branch(dbfs_location, to_branch);
            metastore::copy_or_merge(&from, &to, &request, &transform).await?;
        }
        Commands::CopyAll {
            catalogs,
            batch,
            locations,
        } => {
            let (from, to) = connect_pair(&settings, &catalogs).await?;
            let (dbfs_location, to_branch, fix) = locations.resolve(&settings.sync);
            let batch = batch_sync(&batch, &settings.sync, fix);
            let report =
                metastore::copy_or_merge_all(&from, &to, &batch, &dbfs_location, &to_branch)
                    .await?;
            print_report(&report)?;
        }
        Commands::ImportAll {
            catalogs,
            batch,
            repository,
            locations,
        } => {
            let (from, to) = connect_pair(&settings, &catalogs).await?;
            let (dbfs_location, to_branch, fix) = locations.resolve(&settings.sync);
            let batch = batch_sync(&batch, &settings.sync, fix);
            let repository = repository.unwrap_or_else(|| settings.sync.repository.clone());
            let report = metastore::import_all(
                &from,
                &to,
                &batch,
                &repository,
                &to_branch,
                &dbfs_location,
            )
            .await?;
            print_report(&report)?;
        }
        Commands::CopyDb {
            catalogs,
            from_db,
            to_db,
            locations,
        } => {
            let (from, to) = connect_pair(&settings, &catalogs).await?;
            let (dbfs_location, to_branch, _) = locations.resolve(&settings.sync);
            let to_db = to_db.unwrap_or_else(|| from_db.clone());
            let transform = LocationTransform::branch(dbfs_location, to_branch);
            metastore::copy_db(&from, &to, &from_db, &to_db, &transform).await?;
        }
        Commands::CopySymlink {
            catalog,
            table,
            location_prefix,
            fix_spark_placeholder,
        } => {
            let client = BridgeCatalog::connect(settings.get_catalog(&catalog)?).await?;
            let request = table.request().with_fix_spark_placeholder(
                fix_spark_placeholder || settings.sync.fix_spark_placeholder,
            );
            metastore::copy_or_merge_to_symlink(&client, &request, &location_prefix).await?;
        }
        Commands::Diff { catalogs, table } => {
            let (from, to) = connect_pair(&settings, &catalogs).await?;
            let request = table.request();
            let diff = metastore::get_diff(
                &from,
                &to,
                &request.from_db,
                &request.from_table,
                &request.to_db,
                &request.to_table,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
    }

    Ok(())
}

async fn connect_pair(
    settings: &Settings,
    catalogs: &CatalogPair,
) -> Result<(BridgeCatalog, BridgeCatalog), CliError> {
    let from = BridgeCatalog::connect(settings.get_catalog(&catalogs.from)?).await?;
    let to = BridgeCatalog::connect(settings.get_catalog(&catalogs.to)?).await?;
    Ok((from, to))
}

fn batch_sync(args: &BatchArgs, defaults: &SyncSettings, fix_spark_placeholder: bool) -> BatchSync {
    BatchSync {
        schema_filter: args.schema_filter.clone(),
        table_filter: args.table_filter.clone(),
        continue_on_error: args.continue_on_error || defaults.continue_on_error,
        fix_spark_placeholder,
    }
}

fn print_report(report: &metastore::SyncReport) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
