use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::{
    execute_delete_command, execute_list_command, execute_seed_command, execute_serve_command,
    ServeArgs,
};

/// Default log directives when neither `--log-level` nor `RUST_LOG` is set
const DEFAULT_LOG_FILTER: &str = "commentd=debug,info";

/// Default sled database path
const DEFAULT_DB_PATH: &str = ".commentd";

#[derive(Parser)]
#[command(name = "commentd")]
#[command(about = "Commentd - comment list/delete HTTP service")]
#[command(version)]
pub struct Cli {
    /// Log filter directives (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Serve(ServeCommandArgs),
    /// Load comments from a JSON file
    Seed(SeedArgs),
    /// Print every stored comment
    List(DbArgs),
    /// Delete a comment by id
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct ServeCommandArgs {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<String>,
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Local database path
    #[arg(long)]
    pub db: Option<String>,
    /// Path prefix for the comment routes
    #[arg(long)]
    pub base_path: Option<String>,
    /// Failure status mapping: uniform or classified
    #[arg(long)]
    pub error_policy: Option<commentd_adapters::ErrorPolicy>,
    /// Serve from memory instead of the database
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Args)]
pub struct DbArgs {
    /// Local database path
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db: String,
}

#[derive(Args)]
pub struct SeedArgs {
    /// JSON file holding an array of comment objects
    pub file: String,
    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Comment id (24 hex characters)
    pub id: String,
    #[command(flatten)]
    pub db: DbArgs,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Serve(args) => {
            let serve_args = ServeArgs {
                config: args.config,
                port: args.port,
                db: args.db,
                base_path: args.base_path,
                error_policy: args.error_policy,
                in_memory: args.in_memory,
            };
            execute_serve_command(serve_args).await
        }
        Commands::Seed(args) => execute_seed_command(&args.db.db, &args.file),
        Commands::List(args) => execute_list_command(&args.db).await,
        Commands::Delete(args) => execute_delete_command(&args.db.db, &args.id).await,
    }
}
