use anyhow::{Context, Result};
use relgraph::db::{migrate, Db};
use relgraph::ingest::{latest_dataset, load_store};
use relgraph::server::HttpServer;
use relgraph::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.relgraph.log_level.as_str()),
    )
    .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" => run_http_server(config).await?,
        "verify" => run_schema_verification(config).await?,
        other => anyhow::bail!("Unknown command '{}'. Usage: relgraph [serve|verify]", other),
    }

    Ok(())
}

/// Open the configured database and apply pending migrations
async fn open_database(config: &Config) -> Result<Db> {
    let db = Db::new(config.db_path());
    let migrations_dir = config.migrations_dir().to_path_buf();
    db.with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
        .await
        .context("Failed to run database migrations")?;
    Ok(db)
}

/// Run the HTTP server, restoring the last uploaded table
async fn run_http_server(config: Config) -> Result<()> {
    log::info!("Starting relgraph v{}", env!("CARGO_PKG_VERSION"));

    let db = open_database(&config).await?;

    let store = load_store(&db).await.context("Failed to load stored relationships")?;
    match (&store, latest_dataset(&db).await?) {
        (Some(store), Some(dataset)) => log::info!(
            "Restored '{}' (uploaded {}): {} entities, {} relationships",
            dataset.source_name,
            dataset.uploaded_at,
            store.entities().len(),
            store.relationships().len()
        ),
        (Some(store), None) => log::info!("Restored {} entities", store.entities().len()),
        (None, _) => log::info!("No relationship table stored yet; waiting for an upload"),
    }

    HttpServer::new(db, config, store).run().await?;
    Ok(())
}

/// Run database schema verification
async fn run_schema_verification(config: Config) -> Result<()> {
    log::info!("Database path: {}", config.db_path().display());

    let db = open_database(&config).await?;

    db.with_connection(|conn| {
        let missing = migrate::missing_tables(conn)?;
        for table in &missing {
            log::error!("Missing table: {}", table);
        }
        if !missing.is_empty() {
            return Err(relgraph::RelgraphError::Config(format!(
                "Missing tables: {}",
                missing.join(", ")
            )));
        }
        log::debug!("✓ All tables exist");

        let applied = migrate::get_applied_migrations(conn)?;
        log::debug!("✓ {} migrations applied", applied.len());

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(relgraph::RelgraphError::Config(format!(
                "Journal mode is not WAL: {}",
                journal_mode
            )));
        }

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(relgraph::RelgraphError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(relgraph::RelgraphError::Config(format!(
                "Database integrity check failed: {}",
                integrity
            )));
        }
        log::info!("✓ Database integrity: OK");
        Ok(())
    })
    .await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}
