//! CLI configuration.

use anyhow::{Context, Result};
use market_data::BackendConfig;
use market_search::config::SearchConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Catalog backend connection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Search session tunables.
    #[serde(default)]
    pub search: SearchConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config content, picking the format from the file extension.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Problems that make the config unusable, and ones worth a warning.
    pub fn check(&self) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(e) = self.search.validate() {
            errors.push(e.to_string());
        }

        if self.backend.is_configured() {
            if let Err(e) = self.backend.validate() {
                errors.push(format!("backend: {}", e));
            }
            if self.backend.resolve_api_key().is_none() {
                warnings.push(format!(
                    "backend.api_key is not set and {} is empty",
                    BackendConfig::API_KEY_ENV
                ));
            }
        } else {
            warnings.push("backend.url is not set; only --fixture searches will work".to_string());
        }

        if self.backend.timeout_ms == 0 {
            errors.push("backend.timeout_ms must be greater than 0".to_string());
        }
        if self.search.debounce_ms > 2_000 {
            warnings.push(format!(
                "search.debounce_ms = {} will make typing feel unresponsive",
                self.search.debounce_ms
            ));
        }

        (errors, warnings)
    }
}

/// Generate a default market.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# shift-market search configuration

[backend]
# REST root of the catalog database.
url = ""
# Anonymous key; leave unset to read {env}.
# api_key = ""
table = "products"
select = "*,ads(id,is_promoted,views),shops(name,location)"
timeout_ms = 10000
max_retries = 0

[search]
page_size = 12
debounce_ms = 300
# "replace" or "push"
history_mode = "replace"
path = "/search"
"#,
        env = BackendConfig::API_KEY_ENV
    )
}
