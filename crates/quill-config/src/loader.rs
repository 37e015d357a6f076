use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::Config;

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<Config> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    from_vars(&vars)
}

/// Build a Config from a variable map. Separated from the process
/// environment so tests don't mutate global state.
pub fn from_vars(vars: &HashMap<String, String>) -> Result<Config> {
    let mut config = Config::default();

    config.providers.google_api_key = non_empty(vars, "GOOGLE_API_KEY");
    config.providers.openai_api_key = non_empty(vars, "OPENAI_API_KEY");
    config.providers.anthropic_api_key = non_empty(vars, "ANTHROPIC_API_KEY");

    if let Some(provider) = non_empty(vars, "QUILL_PROVIDER") {
        config.generation.provider = provider;
    }
    if let Some(model) = non_empty(vars, "QUILL_MODEL") {
        config.generation.model = model;
    }
    if let Some(raw) = non_empty(vars, "MAX_TOKENS") {
        config.generation.max_tokens = raw
            .parse()
            .with_context(|| format!("MAX_TOKENS is not a number: '{raw}'"))?;
    }
    if let Some(raw) = non_empty(vars, "TEMPERATURE") {
        config.generation.temperature = raw
            .parse()
            .with_context(|| format!("TEMPERATURE is not a number: '{raw}'"))?;
    }
    if let Some(host) = non_empty(vars, "UI_HOST") {
        config.gateway.host = host;
    }
    if let Some(raw) = non_empty(vars, "UI_PORT") {
        config.gateway.port = raw
            .parse()
            .with_context(|| format!("UI_PORT is not a valid port: '{raw}'"))?;
    }
    if let Some(raw) = non_empty(vars, "DEBUG_MODE") {
        config.debug = matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes");
    }

    Ok(config)
}

fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = from_vars(&HashMap::new()).unwrap();
        assert!(cfg.providers.google_api_key.is_none());
        assert_eq!(cfg.generation.model, "gemini-2.5-flash");
        assert_eq!(cfg.gateway.port, 8501);
    }

    #[test]
    fn reads_keys_and_overrides() {
        let cfg = from_vars(&vars(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("QUILL_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("QUILL_MODEL", "gpt-4.1"),
            ("MAX_TOKENS", "1500"),
            ("TEMPERATURE", "0.2"),
            ("UI_PORT", "9000"),
            ("DEBUG_MODE", "true"),
        ]))
        .unwrap();

        assert_eq!(cfg.providers.google_api_key.as_deref(), Some("g-key"));
        assert_eq!(cfg.generation.provider, "openai");
        assert_eq!(cfg.generation.model, "gpt-4.1");
        assert_eq!(cfg.generation.max_tokens, 1500);
        assert_eq!(cfg.generation.temperature, 0.2);
        assert_eq!(cfg.gateway.port, 9000);
        assert!(cfg.debug);
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let cfg = from_vars(&vars(&[("GOOGLE_API_KEY", "  ")])).unwrap();
        assert!(cfg.providers.google_api_key.is_none());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(from_vars(&vars(&[("MAX_TOKENS", "lots")])).is_err());
        assert!(from_vars(&vars(&[("UI_PORT", "99999")])).is_err());
        assert!(from_vars(&vars(&[("TEMPERATURE", "warm")])).is_err());
    }
}
