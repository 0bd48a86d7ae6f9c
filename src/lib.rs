pub mod config;
pub mod error;
pub mod db;
pub mod ingest;
pub mod graph;
pub mod layout;
pub mod session;
pub mod cache;
pub mod server;

pub use config::Config;
pub use error::{RelgraphError, Result};
pub use graph::{interactive_query, radial_query, GraphView, RelationshipStore};
pub use session::ExplorationSession;
