use crate::grouping_config::GroupingConfig;
use crate::llm_config::{AnalysisConfig, EmbeddingConfig, LLMProviderConfig};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    // LLM configuration (group analysis)
    pub llm_provider: String, // e.g., "openai", "anthropic", "ollama"
    pub llm_api_key: Option<String>,
    pub llm_model: String, // e.g., "gpt-4.1-mini", "llama3"
    pub llm_config_file: Option<String>,

    // Embedding configuration
    pub embedding_provider: String,
    pub embedding_model: String,

    // Ollama configuration (optional)
    pub ollama_endpoint: Option<String>,

    // Grouping engine tunables
    pub grouping: GroupingConfig,

    // Service
    pub bind_addr: SocketAddr,
    pub offline_results_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment
    /// in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_provider = var("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string());
        let llm_api_key = var("LLM_API_KEY").or_else(|| var("OPENAI_API_KEY"));

        if llm_provider != "ollama" && llm_api_key.is_none() {
            return Err(format!(
                "LLM_API_KEY (or OPENAI_API_KEY) environment variable is required for provider '{}'",
                llm_provider
            ));
        }

        let llm_model = var("LLM_MODEL").unwrap_or_else(|| {
            // Provide sensible defaults based on provider
            match llm_provider.as_str() {
                "anthropic" => "claude-3-5-haiku-latest".to_string(),
                "ollama" => var("OLLAMA_MODEL").unwrap_or_else(|| "llama3".to_string()),
                _ => "gpt-4.1-mini".to_string(),
            }
        });

        let embedding_provider = var("EMBEDDING_PROVIDER").unwrap_or_else(|| {
            match llm_provider.as_str() {
                "ollama" => "ollama".to_string(),
                _ => "openai".to_string(),
            }
        });

        let embedding_model = var("EMBEDDING_MODEL").unwrap_or_else(|| {
            match embedding_provider.as_str() {
                "ollama" => "nomic-embed-text".to_string(),
                _ => "text-embedding-3-small".to_string(),
            }
        });

        let defaults = GroupingConfig::default();
        let grouping = GroupingConfig::new()
            .with_max_distance(parse_var(&var, "MAX_DISTANCE", defaults.max_distance)?)
            .with_asset_boost(parse_var(&var, "ASSET_BOOST", defaults.asset_boost)?)
            .with_min_group_size(parse_var(&var, "MIN_GROUP_SIZE", defaults.min_group_size)?)
            .with_max_descriptions(parse_var(
                &var,
                "MAX_DESCRIPTIONS_PER_GROUP",
                defaults.max_descriptions_per_group,
            )?);

        Ok(Config {
            llm_provider,
            llm_api_key,
            llm_model,
            llm_config_file: var("LLM_CONFIG_FILE"),
            embedding_provider,
            embedding_model,
            ollama_endpoint: var("OLLAMA_ENDPOINT"),
            grouping,
            bind_addr: parse_var(&var, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)))?,
            offline_results_path: var("OFFLINE_RESULTS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/offline/offline_results.json")),
        })
    }

    /// Analysis providers: the JSON file named by `LLM_CONFIG_FILE` when set,
    /// otherwise the single provider described by the environment
    pub fn analysis_config(&self) -> anyhow::Result<AnalysisConfig> {
        if let Some(ref path) = self.llm_config_file {
            return AnalysisConfig::from_file(path);
        }

        let config = AnalysisConfig {
            providers: vec![LLMProviderConfig {
                name: self.llm_provider.clone(),
                provider: self.llm_provider.clone(),
                model: self.llm_model.clone(),
                api_key: self.llm_api_key.clone(),
                endpoint: self.ollama_endpoint.clone(),
                timeout_secs: Some(60),
            }],
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn embedding_config(&self) -> anyhow::Result<EmbeddingConfig> {
        let config = EmbeddingConfig {
            provider: self.embedding_provider.clone(),
            model: self.embedding_model.clone(),
            api_key: self.llm_api_key.clone(),
            endpoint: match self.embedding_provider.as_str() {
                "ollama" => self.ollama_endpoint.clone(),
                _ => None,
            },
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn log_config(&self) {
        tracing::info!("📋 Configuration:");
        tracing::info!("   LLM Provider: {}", self.llm_provider);
        tracing::info!("   LLM Model: {}", self.llm_model);
        match self.llm_api_key {
            Some(ref key) => tracing::info!(
                "   LLM API Key: {}***",
                key.chars().take(4).collect::<String>()
            ),
            None => tracing::info!("   LLM API Key: (not set)"),
        }
        if let Some(ref path) = self.llm_config_file {
            tracing::info!("   LLM Config File: {}", path);
        }
        tracing::info!("   Embedding Provider: {}", self.embedding_provider);
        tracing::info!("   Embedding Model: {}", self.embedding_model);
        if let Some(ref endpoint) = self.ollama_endpoint {
            tracing::info!("   Ollama Endpoint: {}", endpoint);
        }
        tracing::info!("   Max Distance: {}", self.grouping.max_distance);
        tracing::info!("   Asset Boost: {}", self.grouping.asset_boost);
        tracing::info!("   Min Group Size: {}", self.grouping.min_group_size);
        tracing::info!(
            "   Max Descriptions Per Group: {}",
            self.grouping.max_descriptions_per_group
        );
        tracing::info!("   Bind Address: {}", self.bind_addr);
        tracing::info!("   Offline Results: {}", self.offline_results_path.display());
    }
}

fn parse_var<T, F>(var: &F, key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
