use anyhow::{Context, Result};
use clap::Parser;
use relgraph::db::{migrate, Db};
use relgraph::ingest::ingest_csv;
use relgraph::Config;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Load a relationship CSV into the relgraph database, replacing the stored table")]
struct Args {
    /// CSV with columns entity_from, relationship_type, relationship_sub_type, entity_to
    #[arg(short, long)]
    file: PathBuf,

    /// Print the full entity list after loading
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let start = Instant::now();

    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());

    let db = Db::new(config.db_path());
    let migrations_dir = config.migrations_dir().to_path_buf();
    db.with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
        .await
        .context("Failed to run database migrations")?;

    let contents = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let source_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let (summary, _) = ingest_csv(&db, &source_name, &contents).await?;

    println!("\n=== Ingestion Complete ===");
    println!("Source: {}", source_name);
    println!("Entities: {}", summary.node_count);
    println!("Relationships: {}", summary.edge_count);
    println!("Skipped rows: {}", summary.skipped_rows);
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    if args.verbose {
        println!("\nEntities:");
        for entity in &summary.entities {
            println!("  {}", entity);
        }
    }

    Ok(())
}
