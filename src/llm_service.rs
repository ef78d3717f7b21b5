use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::llm_config::{AnalysisConfig, LLMProviderConfig};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

pub const SYSTEM_PROMPT: &str = r#"You are an internal IT service operations analyst.

You are NOT responsible for grouping or clustering incidents.
The incidents provided to you have already been grouped by semantic similarity.

Your task is to analyse the group and explain patterns based strictly on
the information provided.

Rules:
- Do not re-group or reclassify incidents
- Do not invent facts not supported by the data
- If evidence is insufficient, say so explicitly
- Hypotheses must be labelled as hypotheses
- Be concise and technically accurate
"#;

/// Structured analysis of one group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAnalysis {
    pub group_label: String,
    pub summary: String,
    pub common_patterns: Vec<String>,
    pub hypotheses: Vec<String>,
    pub recommended_checks: Vec<String>,
}

/// What came back from the analysis service
///
/// A reply that is not valid JSON is kept verbatim rather than dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Unparsed { error: String, raw_response: String },
    Parsed(GroupAnalysis),
}

impl AnalysisOutcome {
    pub fn unparsed(error: impl Into<String>, raw_response: impl Into<String>) -> Self {
        AnalysisOutcome::Unparsed {
            error: error.into(),
            raw_response: raw_response.into(),
        }
    }

    pub fn analysis(&self) -> Option<&GroupAnalysis> {
        match self {
            AnalysisOutcome::Parsed(analysis) => Some(analysis),
            AnalysisOutcome::Unparsed { .. } => None,
        }
    }
}

pub struct LLMServiceClient {
    config: AnalysisConfig,
    http_client: reqwest::Client,
}

/// Single provider client for making API calls
struct ProviderClient<'a> {
    config: &'a LLMProviderConfig,
    temperature: f32,
    http_client: &'a reqwest::Client,
}

impl ProviderClient<'_> {
    /// Send the prompt to this provider and return its raw text reply
    async fn complete(&self, user_prompt: &str) -> Result<String> {
        match self.config.provider.as_str() {
            "openai" => self.call_openai(user_prompt).await,
            "ollama" => self.call_ollama(user_prompt).await,
            "anthropic" => self.call_anthropic(user_prompt).await,
            _ => anyhow::bail!("Unsupported provider: {}", self.config.provider),
        }
    }

    async fn call_openai(&self, user_prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key not configured"))?;

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": self.temperature
        });

        let response = self.http_client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            anyhow::bail!("OpenAI API error: {}", response_json);
        }

        response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("No response from OpenAI"))
    }

    async fn call_ollama(&self, user_prompt: &str) -> Result<String> {
        let endpoint = self.config.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT);

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt }
            ],
            "stream": false,
            "format": "json",
            "options": {
                "temperature": self.temperature,
            }
        });

        let response = self.http_client
            .post(format!("{}/api/chat", endpoint.trim_end_matches('/')))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            anyhow::bail!("Ollama API error: {}", response_json);
        }

        response_json
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("No response from Ollama"))
    }

    async fn call_anthropic(&self, user_prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key not configured"))?;

        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 1500,
            "system": SYSTEM_PROMPT,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": user_prompt }
            ]
        });

        let response = self.http_client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            anyhow::bail!("Anthropic API error: {}", response_json);
        }

        response_json
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("No response from Anthropic"))
    }
}

impl LLMServiceClient {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "🤖 Analysis service configured with {} provider(s)",
            config.providers.len()
        );
        for provider in &config.providers {
            tracing::info!(
                "   - {}: {} ({})",
                provider.name,
                provider.provider,
                provider.model
            );
        }

        let timeout = config
            .providers
            .iter()
            .filter_map(|p| p.timeout_secs)
            .max()
            .unwrap_or(60);

        Ok(Self {
            config,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse one group of incident descriptions
    ///
    /// Providers are tried in order; the first one that answers wins. Only a
    /// transport-level failure of every provider is an error.
    pub async fn analyse_group(&self, descriptions: &[String]) -> Result<AnalysisOutcome> {
        let prompt = build_user_prompt(descriptions);

        for provider_config in &self.config.providers {
            let client = ProviderClient {
                config: provider_config,
                temperature: self.config.temperature,
                http_client: &self.http_client,
            };

            match client.complete(&prompt).await {
                Ok(raw) => {
                    tracing::debug!("Provider {} answered", provider_config.name);
                    return Ok(parse_analysis_response(&raw));
                }
                Err(e) => {
                    tracing::warn!("Provider {} failed: {}", provider_config.name, e);
                    continue;
                }
            }
        }

        anyhow::bail!("All LLM providers failed")
    }
}

pub fn build_user_prompt(descriptions: &[String]) -> String {
    let mut prompt = String::from(
        "Below is a group of incident descriptions that are semantically similar.\n\
         \n\
         Please provide the following in JSON format:\n\
         \n\
         1. group_label\n\
         2. summary\n\
         3. common_patterns\n\
         4. hypotheses\n\
         5. recommended_checks\n\
         \n\
         Incident descriptions:\n",
    );

    for description in descriptions {
        prompt.push_str("- ");
        prompt.push_str(description);
        prompt.push('\n');
    }

    prompt
}

/// Parse the model's reply, tolerating Markdown code fences
pub fn parse_analysis_response(raw: &str) -> AnalysisOutcome {
    let content = strip_code_fence(raw.trim());

    match serde_json::from_str::<GroupAnalysis>(content) {
        Ok(analysis) => AnalysisOutcome::Parsed(analysis),
        Err(e) => {
            tracing::warn!("Failed to parse LLM analysis: {}", e);
            AnalysisOutcome::unparsed("Failed to parse LLM response", content)
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(body) = content.strip_prefix("```") else {
        return content;
    };

    // Drop the language tag line ("json", "JSON", or nothing)
    let body = match body.find('\n') {
        Some(newline) if body[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &body[newline + 1..]
        }
        _ => body.trim_start_matches("json"),
    };

    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS_JSON: &str = r#"{
        "group_label": "MFA push failures",
        "summary": "Users are not receiving MFA pushes.",
        "common_patterns": ["mfa-gateway-01"],
        "hypotheses": ["Hypothesis: gateway certificate expired"],
        "recommended_checks": ["Check gateway logs"]
    }"#;

    #[test]
    fn test_user_prompt_lists_descriptions() {
        let prompt = build_user_prompt(&["vpn drops".to_string(), "mfa timeout".to_string()]);

        assert!(prompt.contains("1. group_label"));
        assert!(prompt.ends_with("- vpn drops\n- mfa timeout\n"));
    }

    #[test]
    fn test_parse_plain_json() {
        let outcome = parse_analysis_response(ANALYSIS_JSON);
        let analysis = outcome.analysis().unwrap();

        assert_eq!(analysis.group_label, "MFA push failures");
        assert_eq!(analysis.recommended_checks, vec!["Check gateway logs"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", ANALYSIS_JSON);
        assert!(parse_analysis_response(&fenced).analysis().is_some());

        let bare_fence = format!("```\n{}\n```", ANALYSIS_JSON);
        assert!(parse_analysis_response(&bare_fence).analysis().is_some());

        let inline_tag = format!("```json{}```", ANALYSIS_JSON);
        assert!(parse_analysis_response(&inline_tag).analysis().is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let outcome = parse_analysis_response(r#"{"group_label": "Directory sync"}"#);
        let analysis = outcome.analysis().unwrap();

        assert_eq!(analysis.group_label, "Directory sync");
        assert!(analysis.hypotheses.is_empty());
    }

    #[test]
    fn test_unparseable_reply_is_kept() {
        let outcome = parse_analysis_response("Sorry, I cannot help with that.");

        assert_eq!(
            outcome,
            AnalysisOutcome::unparsed(
                "Failed to parse LLM response",
                "Sorry, I cannot help with that."
            )
        );
    }

    #[test]
    fn test_outcome_serialization_shapes() {
        let unparsed = AnalysisOutcome::unparsed("Failed to parse LLM response", "oops");
        let json = serde_json::to_value(&unparsed).unwrap();
        assert_eq!(json["raw_response"], "oops");

        let parsed: AnalysisOutcome = serde_json::from_str(ANALYSIS_JSON).unwrap();
        assert!(parsed.analysis().is_some());

        let roundtrip: AnalysisOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, unparsed);
    }
}
