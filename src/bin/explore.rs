use anyhow::{Context, Result};
use clap::Parser;
use relgraph::db::Db;
use relgraph::graph::{interactive_query, radial_query, ColorPalette, ExpansionState};
use relgraph::ingest::load_store;
use relgraph::layout::Simulation;
use relgraph::Config;

#[derive(Parser, Debug)]
#[command(name = "explore")]
#[command(about = "Run an interactive or radial query against the stored table and print it as JSON")]
struct Args {
    /// Root entity
    #[arg(short, long)]
    entity: String,

    /// Radial query with this depth
    #[arg(short, long, conflicts_with = "expand")]
    depth: Option<i64>,

    /// Expanded entity for an interactive query (repeatable)
    #[arg(short = 'x', long)]
    expand: Vec<String>,

    /// Relax the layout for up to this many steps and include positions
    #[arg(short, long)]
    layout_steps: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "warn")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let db = Db::new(config.db_path());

    let store = load_store(&db)
        .await?
        .context("No relationship table stored; run `ingest --file <csv>` first")?;
    let palette = ColorPalette::new(&config.palette.colors).with_types(store.relationship_types());

    let view = match args.depth {
        Some(depth) => radial_query(&store, &palette, &args.entity, depth, config.query.max_depth)?,
        None => {
            let expansion = ExpansionState::from_request(&args.entity, &args.expand);
            interactive_query(&store, &palette, &expansion)?
        }
    };

    let mut output = serde_json::json!({ "graph": &view });

    if let Some(max_steps) = args.layout_steps {
        let mut simulation = Simulation::new(config.layout.clone());
        simulation.set_graph(&view.nodes, &view.links)?;
        let steps = simulation.run(max_steps);
        log::info!("Layout ran {} steps (idle: {})", steps, simulation.is_idle());
        output["layout"] = serde_json::to_value(simulation.frame())?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
