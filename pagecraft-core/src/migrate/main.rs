use clap::Parser;
use pagecraft_core::{add_extra_classes, db, logging, preview_extra_classes, AppConfig, ComponentService, CoreResult};
use std::path::PathBuf;
use std::process;

/// Add the standard `extraClasses` property to every component schema.
#[derive(Parser, Debug)]
#[command(name = "migrate-schemas", version)]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("migrate-schemas: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> CoreResult<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    logging::init(&config.log_level);

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    tracing::info!("connected to PostgreSQL");
    db::run_migrations(&pool).await?;

    let service = ComponentService::new(pool);
    let summary = if args.dry_run {
        preview_extra_classes(&service).await?
    } else {
        add_extra_classes(&service).await?
    };

    let verb = if args.dry_run { "Would update" } else { "Updated" };
    println!(
        "{}: {}, Skipped: {}, Errors: {}",
        verb, summary.updated, summary.skipped, summary.errors
    );
    Ok(())
}
