//! 配置模块
//!
//! 启动时从环境变量读取一次，之后只读。
//!
//! | 变量 | 默认值 |
//! |------|--------|
//! | `API_PROVIDER` | `openai` |
//! | `OPENAI_API_KEY` / `OPENAI_API_BASE` / `OPENAI_API_MODEL` | - / `https://api.openai.com/v1` / `gpt-3.5-turbo` |
//! | `GEMINI_API_KEY` / `GEMINI_API_BASE` / `GEMINI_API_MODEL` | - / Gemini OpenAI 兼容端点 / `gemini-2.0-flash` |
//! | `PROMPT_FILE` | `./prompt.yaml` |
//! | `HOST` / `PORT` | `0.0.0.0` / `8000` |
//! | `RELAY_HTTP_PROXY` | - |
//! | `RELAY_CONNECT_TIMEOUT_SECS` / `RELAY_REQUEST_TIMEOUT_SECS` | `30` / `300` |

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 提示词文件缺失或格式错误时使用的系统提示词
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_PROMPT_FILE: &str = "./prompt.yaml";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com/v1";
const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const GEMINI_DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// 单个 Provider 的配置
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// 已知 Provider 配置表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTable {
    providers: Vec<ProviderConfig>,
}

impl ProviderTable {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter()
    }

    /// 从环境变量构建固定的 openai / gemini 配置表
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(vec![
            ProviderConfig {
                name: "openai".to_string(),
                api_key: non_empty(lookup, "OPENAI_API_KEY"),
                base_url: non_empty(lookup, "OPENAI_API_BASE")
                    .unwrap_or_else(|| OPENAI_DEFAULT_BASE.to_string()),
                default_model: non_empty(lookup, "OPENAI_API_MODEL")
                    .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            },
            ProviderConfig {
                name: "gemini".to_string(),
                api_key: non_empty(lookup, "GEMINI_API_KEY"),
                base_url: non_empty(lookup, "GEMINI_API_BASE")
                    .unwrap_or_else(|| GEMINI_DEFAULT_BASE.to_string()),
                default_model: non_empty(lookup, "GEMINI_API_MODEL")
                    .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            },
        ])
    }
}

/// 上游 HTTP 客户端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// 进程级配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub providers: ProviderTable,
    pub default_provider: String,
    pub system_prompt: String,
    pub host: String,
    pub port: u16,
    pub http: HttpClientConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过查找函数读取配置，便于测试时注入变量
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let providers = ProviderTable::from_lookup(&lookup);

        let requested = non_empty(&lookup, "API_PROVIDER")
            .map(|p| p.to_lowercase())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let default_provider = if providers.contains(&requested) {
            requested
        } else {
            tracing::warn!(
                "[CONFIG] unknown API_PROVIDER '{}', falling back to '{}'",
                requested,
                DEFAULT_PROVIDER
            );
            DEFAULT_PROVIDER.to_string()
        };

        let prompt_file = non_empty(&lookup, "PROMPT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPT_FILE));
        let system_prompt = load_prompt(&prompt_file);

        let port = match non_empty(&lookup, "PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("[CONFIG] invalid PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let defaults = HttpClientConfig::default();
        let http = HttpClientConfig {
            proxy: non_empty(&lookup, "RELAY_HTTP_PROXY"),
            connect_timeout: secs_or(&lookup, "RELAY_CONNECT_TIMEOUT_SECS", defaults.connect_timeout),
            request_timeout: secs_or(&lookup, "RELAY_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
        };

        Self {
            providers,
            default_provider,
            system_prompt,
            host: non_empty(&lookup, "HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            http,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    system_prompt: Option<String>,
}

/// 从 YAML 文件加载系统提示词
///
/// 文件格式：
/// ```yaml
/// system_prompt: |
///   You are a concise assistant.
/// ```
///
/// 任何读取或解析失败都会记录日志并回退到 [`FALLBACK_SYSTEM_PROMPT`]，不会中断启动。
pub fn load_prompt(path: &Path) -> String {
    match read_prompt(path) {
        Ok(prompt) => {
            tracing::info!("[CONFIG] loaded system prompt from {}", path.display());
            prompt
        }
        Err(e) => {
            tracing::warn!(
                "[CONFIG] failed to load prompt from {}: {}",
                path.display(),
                e
            );
            FALLBACK_SYSTEM_PROMPT.to_string()
        }
    }
}

fn read_prompt(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: PromptFile = serde_yaml::from_str(&raw)?;
    parsed
        .system_prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing `system_prompt` key"))
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                tracing::warn!("[CONFIG] invalid {} '{}', using default", key, raw);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(move |k| env.get(k).cloned())
    }

    fn missing_prompt() -> (&'static str, &'static str) {
        ("PROMPT_FILE", "/nonexistent/chat-relay/prompt.yaml")
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[missing_prompt()]);
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.system_prompt, FALLBACK_SYSTEM_PROMPT);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.http, HttpClientConfig::default());

        let openai = config.providers.get("openai").unwrap();
        assert_eq!(openai.base_url, "https://api.openai.com/v1");
        assert_eq!(openai.default_model, "gpt-3.5-turbo");
        assert!(openai.api_key.is_none());

        let gemini = config.providers.get("gemini").unwrap();
        assert_eq!(
            gemini.base_url,
            "https://generativelanguage.googleapis.com/v1beta/openai/"
        );
        assert_eq!(gemini.default_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            missing_prompt(),
            ("API_PROVIDER", "Gemini"),
            ("OPENAI_API_KEY", "sk-abc"),
            ("OPENAI_API_BASE", "http://localhost:11434/v1"),
            ("OPENAI_API_MODEL", "llama3"),
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_API_MODEL", "gemini-1.5-pro"),
            ("PORT", "9000"),
            ("RELAY_REQUEST_TIMEOUT_SECS", "60"),
            ("RELAY_HTTP_PROXY", "socks5://127.0.0.1:1080"),
        ]);

        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.port, 9000);
        assert_eq!(config.http.request_timeout, Duration::from_secs(60));
        assert_eq!(config.http.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));

        let openai = config.providers.get("openai").unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(openai.base_url, "http://localhost:11434/v1");
        assert_eq!(openai.default_model, "llama3");

        let default = config.providers.get(&config.default_provider).unwrap();
        assert_eq!(default.name, "gemini");
        assert_eq!(default.default_model, "gemini-1.5-pro");
    }

    #[test]
    fn test_unknown_provider_falls_back() {
        let config = config_from(&[missing_prompt(), ("API_PROVIDER", "anthropic")]);
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[
            missing_prompt(),
            ("OPENAI_API_KEY", ""),
            ("OPENAI_API_MODEL", "  "),
            ("PORT", "not-a-port"),
        ]);
        let openai = config.providers.get("openai").unwrap();
        assert!(openai.api_key.is_none());
        assert_eq!(openai.default_model, "gpt-3.5-turbo");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = config_from(&[missing_prompt(), ("OPENAI_API_KEY", "sk-secret")]);
        let debug = format!("{:?}", config.providers);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_load_prompt_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "system_prompt: |\n  You are a pirate.\n  Answer briefly.").unwrap();

        let prompt = load_prompt(file.path());
        assert_eq!(prompt, "You are a pirate.\nAnswer briefly.\n");
    }

    #[test]
    fn test_load_prompt_via_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "system_prompt: Be terse.").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = config_from(&[("PROMPT_FILE", path.as_str())]);
        assert_eq!(config.system_prompt, "Be terse.");
    }

    #[test]
    fn test_load_prompt_fallbacks() {
        assert_eq!(
            load_prompt(Path::new("/nonexistent/prompt.yaml")),
            FALLBACK_SYSTEM_PROMPT
        );

        let mut malformed = tempfile::NamedTempFile::new().unwrap();
        writeln!(malformed, "system_prompt: [unclosed").unwrap();
        assert_eq!(load_prompt(malformed.path()), FALLBACK_SYSTEM_PROMPT);

        let mut missing_key = tempfile::NamedTempFile::new().unwrap();
        writeln!(missing_key, "other: value").unwrap();
        assert_eq!(load_prompt(missing_key.path()), FALLBACK_SYSTEM_PROMPT);

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_prompt(dir.path()), FALLBACK_SYSTEM_PROMPT);
    }
}
