use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub generation: GenerationConfig,
    pub gateway: GatewayConfig,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    /// Required for the default gemini provider.
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Provider backing every agent: "gemini", "openai", or "anthropic".
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8501,
        }
    }
}

impl Config {
    /// Check that the selected provider has a credential.
    ///
    /// Runs at startup so a missing key fails with a clear message instead
    /// of surfacing deep inside the first agent call.
    pub fn validate(&self) -> anyhow::Result<()> {
        let (key, var) = match self.generation.provider.as_str() {
            "gemini" => (&self.providers.google_api_key, "GOOGLE_API_KEY"),
            "openai" => (&self.providers.openai_api_key, "OPENAI_API_KEY"),
            "anthropic" => (&self.providers.anthropic_api_key, "ANTHROPIC_API_KEY"),
            other => anyhow::bail!(
                "Unknown provider '{other}'. Valid providers: gemini, openai, anthropic"
            ),
        };
        if key.as_deref().map(str::trim).unwrap_or("").is_empty() {
            anyhow::bail!(
                "Provider '{}' selected but {var} is not set. \
                 Add it to your environment (or a .env file you source) and retry.",
                self.generation.provider
            );
        }
        Ok(())
    }
}
