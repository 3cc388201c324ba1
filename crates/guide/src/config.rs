use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct GuideConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Applies to non-streaming requests and to connection setup of streams.
    pub timeout: Duration,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

impl GuideConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: env::var("LLM_API_BASE").unwrap_or(defaults.api_base),
            api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: env::var("LLM_MODEL").unwrap_or(defaults.model),
            max_tokens: env_var_u32("LLM_MAX_TOKENS", defaults.max_tokens),
            temperature: env_var_f32("LLM_TEMPERATURE", defaults.temperature),
            timeout: Duration::from_secs(env_var_u32("LLM_TIMEOUT_SECS", 60) as u64),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_var_f32(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}
