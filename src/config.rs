//! Engine configuration: generator credentials and tuning from the environment,
//! prompt overrides from an optional TOML file.
//!
//! See `EngineConfig` and `Prompts` for the recognized keys.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptFile {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts sent to the generator. Override them in TOML under `[prompts]`.
///
/// `user_template` placeholders: `{count}`, `{topic}`, `{difficulty}`,
/// `{difficulty_label}`, `{language}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "You create high-quality multiple-choice questions with 4 options. Return ONLY valid JSON.".into(),
      user_template: concat!(
        "Generate {count} multiple-choice questions on \"{topic}\" at {difficulty} ({difficulty_label}) difficulty.\n",
        "- Language: {language}.\n",
        "- Each question has exactly 4 short, distinct options (plain strings).\n",
        "- Exactly one correct option.\n",
        "- Include a brief explanation.\n",
        "- Avoid \"All of the above\"/\"None of the above\" and repetitions.\n",
        "Return ONLY JSON array with objects: {\"question\",\"options\",\"answer\",\"explanation\"}. No markdown."
      )
      .into(),
    }
  }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub request_timeout: Duration,
  pub default_batch_size: usize,
  pub default_max_parallel: usize,
  pub cache_ttl: Duration,
  pub cache_max_entries: usize,
  pub prompts: Prompts,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_BASE_URL.into(),
      model: DEFAULT_MODEL.into(),
      temperature: 0.3,
      max_tokens: 1200,
      request_timeout: Duration::from_secs(60),
      default_batch_size: 10,
      default_max_parallel: 3,
      cache_ttl: DEFAULT_TTL,
      cache_max_entries: DEFAULT_MAX_ENTRIES,
      prompts: Prompts::default(),
    }
  }
}

impl EngineConfig {
  /// Build from process env. Unparseable numbers fall back to defaults.
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
    let d = Self::default();
    let api_key = ["LLAMA_API_KEY", "LLama_API_KEY", "OPENROUTER_API_KEY"]
      .into_iter()
      .find_map(|k| var(k).filter(|v| !v.trim().is_empty()));

    let prompts = var("QUIZ_CONFIG_PATH")
      .and_then(|path| load_prompt_file(&path))
      .map(|f| f.prompts)
      .unwrap_or_default();

    Self {
      api_key,
      base_url: var("LLAMA_BASE_URL").unwrap_or(d.base_url),
      model: var("LLAMA_MODEL").unwrap_or(d.model),
      temperature: parse_or(&var, "LLAMA_TEMPERATURE", d.temperature),
      max_tokens: parse_or(&var, "LLAMA_MAX_TOKENS", d.max_tokens),
      request_timeout: Duration::from_secs(parse_or(&var, "LLAMA_TIMEOUT_SECS", d.request_timeout.as_secs())),
      default_batch_size: parse_or(&var, "LLAMA_BATCH_SIZE", d.default_batch_size).max(1),
      default_max_parallel: parse_or(&var, "LLAMA_MAX_PARALLEL", d.default_max_parallel).max(1),
      cache_ttl: Duration::from_millis(parse_or(&var, "CACHE_TTL_MS", d.cache_ttl.as_millis() as u64)),
      cache_max_entries: parse_or(&var, "CACHE_MAX_ENTRIES", d.cache_max_entries).max(1),
      prompts,
    }
  }
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
  match var(key) {
    None => default,
    Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
      warn!(target: "quiz_engine", %key, value = %raw, "Ignoring unparseable setting; using default");
      default
    }),
  }
}

/// Read and parse a prompt file. On any IO/parse error, logs and returns None.
pub fn load_prompt_file(path: &str) -> Option<PromptFile> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<PromptFile>(&s) {
      Ok(cfg) => {
        info!(target: "quiz_engine", %path, "Loaded prompt config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quiz_engine", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quiz_engine", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
