//! 日志模块
//!
//! - 初始化 tracing 输出（stdout，`RUST_LOG` 控制级别）
//! - 上游错误信息在写日志前脱敏，避免 API Key 泄露
use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "chat_relay=info,tower_http=info";

/// 初始化全局 tracing subscriber，重复调用时忽略
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn redaction_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let patterns = [
            (r"Bearer\s+[A-Za-z0-9._-]+", "Bearer ***"),
            // OpenAI 风格的 key 可能原样出现在错误信息里（"Incorrect API key provided: sk-..."）
            (r"sk-[A-Za-z0-9_-]{8,}", "sk-***"),
            (
                r#"api[_-]?key["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
                "api_key: ***",
            ),
            (r#"[?&]key=[A-Za-z0-9._-]+"#, "?key=***"),
            (
                r#"access[_-]?token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
                "access_token: ***",
            ),
            (
                r#"[Aa]uthorization["']?\s*[:=]\s*["']?[A-Za-z0-9._\s-]+"#,
                "authorization: ***",
            ),
            (
                r#"secret["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
                "secret: ***",
            ),
        ];
        patterns
            .into_iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|re| (re, replacement))
            })
            .collect()
    })
}

/// 日志脱敏
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (re, replacement) in redaction_rules() {
        sanitized = re.replace_all(&sanitized, *replacement).to_string();
    }
    sanitized
}
