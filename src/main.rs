use anyhow::Result;
use clap::{Parser, Subcommand};

use credit_store::audit::AuditLogger;
use credit_store::cli::{
    handle_account_command, handle_audit_command, handle_report_command, handle_store_command,
};
use credit_store::config::{catalog::Catalog, paths::StorePaths, settings::Settings};
use credit_store::events::{AuditSink, EventSink, NullSink};
use credit_store::logging::setup_tracing;
use credit_store::storage::{FsArtifactStore, Storage};

#[derive(Parser)]
#[command(
    name = "credit-store",
    author = "Kaylee Beyene",
    version,
    about = "Credit store and abuse report resolution for a hosting panel",
    long_about = "credit-store keeps user credit balances, sells resource quota \
                  upgrades from a catalog, and resolves abuse reports by deleting \
                  the reported artifact together with the status change."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management commands
    #[command(subcommand)]
    Account(credit_store::cli::AccountCommands),

    /// Store catalog and purchases
    #[command(subcommand)]
    Store(credit_store::cli::StoreCommands),

    /// Abuse report commands
    #[command(subcommand)]
    Report(credit_store::cli::ReportCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = StorePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::with_settings(paths.clone(), &settings)?;
    storage.load_all()?;

    let events: Box<dyn EventSink> = if settings.audit_enabled {
        Box::new(AuditSink::new(AuditLogger::new(paths.audit_log())))
    } else {
        Box::new(NullSink)
    };

    match cli.command {
        Some(Commands::Account(cmd)) => {
            handle_account_command(&storage, events.as_ref(), cmd)?;
        }
        Some(Commands::Store(cmd)) => {
            let catalog = load_catalog(&paths)?;
            handle_store_command(&storage, &catalog, events.as_ref(), cmd)?;
        }
        Some(Commands::Report(cmd)) => {
            let artifacts = FsArtifactStore::new(paths.artifacts_dir());
            handle_report_command(&storage, &artifacts, events.as_ref(), cmd)?;
        }
        Some(Commands::Audit { limit }) => {
            handle_audit_command(&AuditLogger::new(paths.audit_log()), limit)?;
        }
        Some(Commands::Init) => {
            println!("Initializing credit-store at: {}", paths.base_dir().display());
            credit_store::storage::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("A default catalog has been written to:");
            println!("  {}", paths.catalog_file().display());
            println!();
            println!("Run 'credit-store store items' to see what can be bought.");
        }
        Some(Commands::Config) => {
            println!("credit-store Configuration");
            println!("==========================");
            println!("Base directory:      {}", paths.base_dir().display());
            println!("State file:          {}", paths.state_file().display());
            println!("Catalog file:        {}", paths.catalog_file().display());
            println!("Artifacts directory: {}", paths.artifacts_dir().display());
            println!("Audit log:           {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Ledger strategy: {}", settings.ledger_strategy);
            println!(
                "  Retry:           {} retries, {}-{} ms backoff",
                settings.retry.max_retries,
                settings.retry.base_backoff_ms,
                settings.retry.max_backoff_ms
            );
            println!("  Audit enabled:   {}", settings.audit_enabled);
        }
        None => {
            println!("credit-store - credits, quotas and abuse reports");
            println!();
            println!("Run 'credit-store --help' for usage information.");
            println!("Run 'credit-store init' to set up a data directory.");
        }
    }

    Ok(())
}

/// The configured catalog, or the built-in one before `init` has run
fn load_catalog(paths: &StorePaths) -> Result<Catalog> {
    let path = paths.catalog_file();
    if path.exists() {
        Ok(Catalog::load(path)?)
    } else {
        Ok(Catalog::default_catalog())
    }
}
