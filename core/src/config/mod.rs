use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SCOUT_DIR: &str = ".skillscout";

/// A GitHub-hosted skill registry. Higher priority wins name collisions
/// when registries are merged into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySpec {
    pub name: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_priority() -> u32 {
    10
}

impl RegistrySpec {
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Skill roots in precedence order: earlier roots win name collisions.
    pub local_roots: Vec<PathBuf>,
    pub registries: Vec<RegistrySpec>,
    #[serde(skip)]
    pub cache_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            local_roots: vec![
                PathBuf::from("/mnt/skills/public"),
                PathBuf::from("/mnt/skills/user"),
                PathBuf::from("/mnt/skills/examples"),
                PathBuf::from("~/.skillscout/skills"),
                PathBuf::from(".skillscout/skills"),
            ],
            registries: vec![
                RegistrySpec {
                    name: "awesome-claude-skills".to_string(),
                    owner: "ComposioHQ".to_string(),
                    repo: "awesome-claude-skills".to_string(),
                    branch: "master".to_string(),
                    priority: 1,
                },
                RegistrySpec {
                    name: "anthropic-skills".to_string(),
                    owner: "anthropics".to_string(),
                    repo: "skills".to_string(),
                    branch: "main".to_string(),
                    priority: 2,
                },
            ],
            cache_path: get_cache_path(),
        }
    }
}

pub fn get_scout_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(SCOUT_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_scout_dir().join("config.toml")
}

pub fn get_cache_path() -> PathBuf {
    get_scout_dir().join("catalog.json")
}

pub fn ensure_scout_dir() -> Result<PathBuf> {
    let scout_dir = get_scout_dir();

    if !scout_dir.exists() {
        std::fs::create_dir_all(&scout_dir).with_context(|| {
            format!(
                "Failed to create skillscout directory at {}",
                scout_dir.display()
            )
        })?;
    }

    Ok(scout_dir)
}

/// Expand a leading `~` component to `$HOME`.
pub fn expand_root(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(rest)
        }
        Err(_) => path.to_path_buf(),
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("Config file not found at {}", config_path.display())
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.cache_path = get_cache_path();

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_scout_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}
