use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub relgraph: RelgraphConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
}

/// Storage and logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelgraphConfig {
    /// SQLite file holding the most recently uploaded relationship table.
    pub db_path: PathBuf,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelgraphConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("relgraph.db"),
            migrations_dir: default_migrations_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Query engine limits
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_depth")]
    pub default_depth: usize,
    /// Number of radial results kept in the LRU cache (0 disables caching)
    #[serde(default = "default_radial_cache_capacity")]
    pub radial_cache_capacity: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_depth: default_depth(),
            radial_cache_capacity: default_radial_cache_capacity(),
        }
    }
}

fn default_max_depth() -> usize {
    5
}

fn default_depth() -> usize {
    2
}

fn default_radial_cache_capacity() -> usize {
    128
}

/// Force simulation tuning.
///
/// Defaults settle a fresh layout in roughly 300 steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Target separation of linked nodes
    pub link_distance: f64,
    /// Many-body strength; negative values repel
    pub charge_strength: f64,
    /// Pull toward the canvas center per step
    pub center_strength: f64,
    /// Fraction of an overlap resolved per collision pass (0..=1)
    pub collision_strength: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    /// Fraction of velocity removed each step
    pub velocity_decay: f64,
    /// Alpha restored after the node set changes
    pub reheat_alpha: f64,
    /// Alpha floor while at least one node is being dragged
    pub drag_alpha_target: f64,
    /// Unpinned velocities below this count as settled
    pub idle_velocity: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min: f64 = 0.001;
        Self {
            width: 800.0,
            height: 600.0,
            link_distance: 150.0,
            charge_strength: -400.0,
            center_strength: 0.05,
            collision_strength: 0.7,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            reheat_alpha: 1.0,
            drag_alpha_target: 0.3,
            idle_velocity: 0.5,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Delay between two streamed simulation frames
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            allowed_origins: default_allowed_origins(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Relationship type colors layered over the built-in table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaletteConfig {
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    // Empty means any origin; restrict in config.toml for production
    vec![]
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RELGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("RELGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if let Some(parent) = self.relgraph.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                anyhow::bail!(
                    "db_path directory does not exist: {}. Create it or point db_path elsewhere.",
                    parent.display()
                );
            }
        }

        if self.query.max_depth == 0 || self.query.max_depth > 10 {
            anyhow::bail!("query.max_depth must be between 1 and 10");
        }

        if self.query.default_depth == 0 || self.query.default_depth > self.query.max_depth {
            anyhow::bail!(
                "query.default_depth must be between 1 and query.max_depth ({})",
                self.query.max_depth
            );
        }

        let layout = &self.layout;
        if layout.width <= 0.0 || layout.height <= 0.0 {
            anyhow::bail!("layout.width and layout.height must be greater than 0");
        }

        if layout.link_distance <= 0.0 {
            anyhow::bail!("layout.link_distance must be greater than 0");
        }

        if !(0.0..=1.0).contains(&layout.center_strength) {
            anyhow::bail!("layout.center_strength must be between 0.0 and 1.0");
        }

        if !(0.0..=1.0).contains(&layout.collision_strength) {
            anyhow::bail!("layout.collision_strength must be between 0.0 and 1.0");
        }

        for (name, value) in [
            ("alpha_decay", layout.alpha_decay),
            ("velocity_decay", layout.velocity_decay),
        ] {
            if value <= 0.0 || value >= 1.0 {
                anyhow::bail!("layout.{} must be strictly between 0.0 and 1.0", name);
            }
        }

        if layout.alpha_min <= 0.0 || layout.alpha_min >= layout.reheat_alpha {
            anyhow::bail!("layout.alpha_min must be greater than 0 and less than layout.reheat_alpha");
        }

        if layout.reheat_alpha > 1.0 || layout.drag_alpha_target > 1.0 {
            anyhow::bail!("layout.reheat_alpha and layout.drag_alpha_target must not exceed 1.0");
        }

        if self.http_server.tick_interval_ms == 0 {
            anyhow::bail!("http_server.tick_interval_ms must be greater than 0");
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.relgraph.db_path
    }

    /// Get the directory holding the SQL migrations
    pub fn migrations_dir(&self) -> &Path {
        &self.relgraph.migrations_dir
    }
}
