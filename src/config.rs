use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StatsError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// TOML file consulted when `TRAFFIC_STATS_CONFIG` is unset.
const DEFAULT_CONFIG_FILE: &str = "traffic-stats.toml";

const DEFAULT_SNAPSHOT: &str = "stats_data.json";
const DEFAULT_DAILY_GRAPH: &str = "docs/stats_graph_daily.png";
const DEFAULT_CUMULATIVE_GRAPH: &str = "docs/stats_graph_cumulative.png";
const DEFAULT_README: &str = "README.md";
const DEFAULT_ANCHOR: &str = "## Contributing";

/// Run configuration, built once at the entry point and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    /// `owner/name` of the repository whose traffic is tracked.
    pub repository: Option<String>,
    pub token: Option<String>,
    /// Gist holding the accumulated history. Unset on the very first run.
    pub gist_id: Option<String>,
    pub api_url: String,
    pub paths: PathsConfig,
    pub readme: ReadmeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub snapshot: PathBuf,
    pub daily_graph: PathBuf,
    pub cumulative_graph: PathBuf,
    pub readme: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT),
            daily_graph: PathBuf::from(DEFAULT_DAILY_GRAPH),
            cumulative_graph: PathBuf::from(DEFAULT_CUMULATIVE_GRAPH),
            readme: PathBuf::from(DEFAULT_README),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadmeConfig {
    /// Heading the stats block is inserted before when no markers exist yet.
    pub anchor: String,
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR.to_string(),
        }
    }
}

/// Shape of the optional TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    paths: PathsConfig,
    readme: ReadmeConfig,
}

impl Config {
    /// Build from the process environment plus the optional TOML file.
    pub fn load() -> Result<Self, StatsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Values are trimmed and empty
    /// values count as unset (CI secrets often carry a trailing newline).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StatsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let file = match get("TRAFFIC_STATS_CONFIG") {
            Some(path) => read_file_config(Path::new(&path))?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    read_file_config(default)?
                } else {
                    FileConfig::default()
                }
            }
        };

        let api_url = get("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            repository: get("GITHUB_REPOSITORY"),
            token: get("GITHUB_TOKEN"),
            gist_id: get("GIST_ID"),
            api_url,
            paths: file.paths,
            readme: file.readme,
        })
    }

    pub fn require_token(&self) -> Result<&str, StatsError> {
        self.token.as_deref().ok_or(StatsError::MissingToken)
    }

    pub fn require_repository(&self) -> Result<&str, StatsError> {
        self.repository
            .as_deref()
            .ok_or(StatsError::MissingRepository)
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, StatsError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| StatsError::Config(format!("failed to read {}: {e}", path.display())))?;
    let parsed: FileConfig = toml::from_str(&text)
        .map_err(|e| StatsError::Config(format!("failed to parse {}: {e}", path.display())))?;
    tracing::debug!("loaded config file {}", path.display());
    Ok(parsed)
}
