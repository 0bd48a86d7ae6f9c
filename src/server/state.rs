use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::cache::RadialCache;
use crate::config::Config;
use crate::db::Db;
use crate::error::{RelgraphError, Result};
use crate::graph::{ColorPalette, RelationshipStore};
use crate::session::ExplorationSession;

/// The ingested table together with the palette and radial cache built for it.
///
/// The cache lives and dies with its table: an upload swaps in a fresh
/// `LoadedGraph`, and a handler still holding the old one can only write into
/// the old cache.
#[derive(Debug)]
pub struct LoadedGraph {
    pub store: RelationshipStore,
    pub palette: ColorPalette,
    pub radial_cache: RadialCache,
}

impl LoadedGraph {
    pub fn new(store: RelationshipStore, config: &Config) -> Self {
        let palette = ColorPalette::new(&config.palette.colors).with_types(store.relationship_types());
        Self {
            store,
            palette,
            radial_cache: RadialCache::new(config.query.radial_cache_capacity),
        }
    }
}

pub type SharedSession = Arc<Mutex<ExplorationSession>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Arc<Config>,
    graph: Arc<RwLock<Option<Arc<LoadedGraph>>>>,
    sessions: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
    /// Serializes uploads so the stored table and the in-memory graph agree
    upload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: Db, config: Config, store: Option<RelationshipStore>) -> Self {
        let graph = store.map(|s| Arc::new(LoadedGraph::new(s, &config)));
        Self {
            db,
            config: Arc::new(config),
            graph: Arc::new(RwLock::new(graph)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            upload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current graph, or `NoGraphLoaded` before the first upload
    pub async fn graph(&self) -> Result<Arc<LoadedGraph>> {
        self.graph.read().await.clone().ok_or(RelgraphError::NoGraphLoaded)
    }

    pub async fn lock_uploads(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.upload_lock.lock().await
    }

    /// Swap in a freshly ingested graph.
    ///
    /// Cached radial views and open sessions belong to the old table and are
    /// dropped with it.
    pub async fn replace_graph(&self, store: RelationshipStore) {
        let loaded = Arc::new(LoadedGraph::new(store, &self.config));
        *self.graph.write().await = Some(loaded);
        let mut sessions = self.sessions.lock().await;
        if !sessions.is_empty() {
            log::info!("Dropping {} sessions of the previous graph", sessions.len());
            sessions.clear();
        }
    }

    pub async fn insert_session(&self, session: ExplorationSession) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.lock().await.insert(id, Arc::clone(&shared));
        (id, shared)
    }

    pub async fn session(&self, id: Uuid) -> Result<SharedSession> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RelgraphError::UnknownSession(id.to_string()))
    }

    pub async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
