use anyhow::Result;
use relgraph::db::Db;
use relgraph::ingest::{latest_dataset, load_store};
use relgraph::Config;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let db = Db::new(config.db_path());

    println!("\n=== relgraph Statistics ===\n");

    let Some(store) = load_store(&db).await? else {
        println!("No relationship table stored.");
        println!("\nRun `ingest --file <csv>` to load one.");
        return Ok(());
    };

    if let Some(dataset) = latest_dataset(&db).await? {
        println!("Dataset:       {} (#{})", dataset.source_name, dataset.id);
        println!("Uploaded at:   {}", dataset.uploaded_at);
        println!("Rows skipped:  {}", dataset.skipped_rows);
        println!();
    }

    let stats = store.stats();
    println!("Entities:      {}", stats.node_count);
    println!("Relationships: {}", stats.edge_count);
    println!("Density:       {:.4}", stats.density);

    let people = store
        .entities()
        .iter()
        .filter(|e| e.kind == relgraph::graph::EntityKind::Person)
        .count();
    println!("People:        {}", people);
    println!("Companies:     {}", stats.node_count - people);

    println!("\n{:<30} {:>8}", "Relationship type", "Count");
    println!("{}", "-".repeat(39));
    for (relationship_type, count) in store.type_counts() {
        println!("{:<30} {:>8}", relationship_type, count);
    }
    println!();

    Ok(())
}
