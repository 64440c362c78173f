//! Configuration system (layered: defaults > TOML file > env).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CounselError, Result};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Process configuration for the chat backend.
///
/// Resolution order (later wins):
/// 1. Built-in defaults
/// 2. An optional TOML file (`CounselConfig::load_file`)
/// 3. Environment variables, including a `.env` file when present
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CounselConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub tavily_api_key: Option<String>,
    pub tavily_base_url: Option<String>,
    /// Base URL of the remote summary service. `None` keeps summaries in process.
    pub summary_api_base: Option<String>,
    pub max_tool_rounds: usize,
    pub search_max_results: u32,
    pub tool_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
    pub memory_token_limit: usize,
    pub memory_retained_turns: usize,
    pub bind_addr: String,
}

impl Default for CounselConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            tavily_api_key: None,
            tavily_base_url: None,
            summary_api_base: None,
            max_tool_rounds: 10,
            search_max_results: 4,
            tool_timeout_secs: 30,
            session_ttl_secs: 3600,
            max_sessions: 10_000,
            memory_token_limit: 1000,
            memory_retained_turns: 10,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl CounselConfig {
    /// Load from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok());
        config
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| CounselError::Configuration(e.to_string()))
    }

    /// Load a TOML file, then apply environment overrides.
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let _ = dotenvy::dotenv();
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut Option<String>); 5] = [
            ("OPENAI_API_KEY", &mut self.openai_api_key),
            ("OPENAI_BASE_URL", &mut self.openai_base_url),
            ("TAVILY_API_KEY", &mut self.tavily_api_key),
            ("TAVILY_BASE_URL", &mut self.tavily_base_url),
            ("SUMMARY_API_BASE", &mut self.summary_api_base),
        ];
        for (key, slot) in strings {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }

        if let Some(model) = lookup("COUNSEL_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(addr) = lookup("COUNSEL_BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            self.bind_addr = addr;
        }

        let numbers: [(&str, &mut usize); 3] = [
            ("COUNSEL_MAX_TOOL_ROUNDS", &mut self.max_tool_rounds),
            ("COUNSEL_MAX_SESSIONS", &mut self.max_sessions),
            ("COUNSEL_MEMORY_RETAINED_TURNS", &mut self.memory_retained_turns),
        ];
        for (key, slot) in numbers {
            if let Some(parsed) = lookup(key).as_deref().and_then(parse_positive) {
                *slot = parsed as usize;
            }
        }
        if let Some(ttl) = lookup("COUNSEL_SESSION_TTL_SECS").as_deref().and_then(parse_positive) {
            self.session_ttl_secs = ttl;
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// The OpenAI API key, or a configuration error naming the variable.
    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| CounselError::Configuration("OPENAI_API_KEY is not set".into()))
    }
}

fn parse_positive(value: &str) -> Option<u64> {
    let parsed = value.trim().parse::<u64>().ok()?;
    if parsed == 0 {
        None
    } else {
        Some(parsed)
    }
}
