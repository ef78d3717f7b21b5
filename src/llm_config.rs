use serde::{Deserialize, Serialize};

/// Configuration for a single LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    pub name: String,
    pub provider: String, // "openai", "ollama", "anthropic"
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>, // For Ollama or OpenAI-compatible gateways
    pub timeout_secs: Option<u64>,
}

/// Providers used for group analysis, tried in order until one succeeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub providers: Vec<LLMProviderConfig>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Groups analysed concurrently
    #[serde(default = "default_concurrency")]
    pub max_concurrent: usize,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_concurrency() -> usize {
    4
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            providers: vec![LLMProviderConfig {
                name: "openai".to_string(),
                provider: "openai".to_string(),
                model: "gpt-4.1-mini".to_string(),
                api_key: None,
                endpoint: None,
                timeout_secs: Some(60),
            }],
            temperature: default_temperature(),
            max_concurrent: default_concurrency(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file (used for `LLM_CONFIG_FILE`)
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read LLM config file {}: {}", path, e))?;
        let config: Self = serde_json::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid LLM config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("At least one LLM provider must be configured");
        }

        for provider in &self.providers {
            validate_provider(&provider.provider, provider.api_key.as_deref(), &provider.name)?;
        }

        if self.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be at least 1");
        }

        Ok(())
    }
}

/// Embedding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String, // "openai" or "ollama"
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub max_batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            endpoint: None,
            max_batch_size: 64,
            timeout_secs: 60,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.provider.as_str() {
            "openai" | "ollama" => {}
            other => anyhow::bail!("Unsupported embedding provider: {}", other),
        }
        validate_provider(&self.provider, self.api_key.as_deref(), "embedding")?;
        if self.max_batch_size == 0 {
            anyhow::bail!("max_batch_size must be at least 1");
        }
        Ok(())
    }
}

fn validate_provider(provider: &str, api_key: Option<&str>, name: &str) -> anyhow::Result<()> {
    match provider {
        "openai" | "anthropic" => {
            if api_key.map_or(true, str::is_empty) {
                anyhow::bail!("Provider {} ({}) requires an API key", name, provider);
            }
        }
        "ollama" => {}
        other => anyhow::bail!("Unsupported provider for {}: {}", name, other),
    }
    Ok(())
}
