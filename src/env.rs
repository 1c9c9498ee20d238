//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。所有变量以 `FEEDTRANS_` 为前缀。

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// 变量未设置时返回 `None`，设置了则返回解析结果
    fn lookup() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        match Self::lookup() {
            Some(Ok(value)) => value,
            _ => default,
        }
    }
}

fn invalid(variable: &str, message: impl Into<String>) -> EnvError {
    EnvError {
        variable: variable.to_string(),
        message: message.into(),
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(invalid(
            var_name,
            format!("Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off", value),
        )),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value
        .trim()
        .parse()
        .map_err(|_| invalid(var_name, "Must be a valid positive number"))?;

    if num < min {
        return Err(invalid(var_name, format!("Value {} is below minimum {}", num, min)));
    }

    if num > max {
        return Err(invalid(var_name, format!("Value {} exceeds maximum {}", num, max)));
    }

    Ok(num)
}

/// 空字符串表示显式关闭该端点
fn parse_optional_url(value: &str, var_name: &str) -> EnvResult<String> {
    let url = value.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(invalid(var_name, "URL must be empty or start with http:// or https://"))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "FEEDTRANS_LOG_LEVEL";
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                level @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(level.to_string()),
                _ => Err(invalid(
                    Self::NAME,
                    format!("Invalid log level '{}'. Use: trace, debug, info, warn, error", value),
                )),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;
    use crate::translation::config::{DisplayMode, ServiceKind};

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "FEEDTRANS_TARGET_LANG";
        const DESCRIPTION: &'static str = "Target language code, e.g. zh, en, ja, zh-TW";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim();
            let valid = !lang.is_empty()
                && lang.len() <= 10
                && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if valid {
                Ok(lang.to_string())
            } else {
                Err(invalid(Self::NAME, format!("Invalid language code '{}'", value)))
            }
        }
    }

    /// 显示模式
    pub struct Mode;
    impl EnvVar<DisplayMode> for Mode {
        const NAME: &'static str = "FEEDTRANS_DISPLAY_MODE";
        const DESCRIPTION: &'static str = "Display mode: bilingual or translated";

        fn parse(value: &str) -> EnvResult<DisplayMode> {
            value.parse().map_err(|e: String| invalid(Self::NAME, e))
        }
    }

    /// 并发窗口大小
    pub struct Concurrency;
    impl EnvVar<usize> for Concurrency {
        const NAME: &'static str = "FEEDTRANS_CONCURRENCY";
        const DESCRIPTION: &'static str = "Number of translation requests in flight per window";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 200)
        }
    }

    /// 单次请求最大字符数
    pub struct MaxChunkSize;
    impl EnvVar<usize> for MaxChunkSize {
        const NAME: &'static str = "FEEDTRANS_MAX_CHUNK_SIZE";
        const DESCRIPTION: &'static str = "Maximum characters sent to the provider per request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 100, 50000)
        }
    }

    /// 首选翻译服务
    pub struct DefaultService;
    impl EnvVar<ServiceKind> for DefaultService {
        const NAME: &'static str = "FEEDTRANS_DEFAULT_SERVICE";
        const DESCRIPTION: &'static str = "Preferred translation service: ai or google";

        fn parse(value: &str) -> EnvResult<ServiceKind> {
            value.parse().map_err(|e: String| invalid(Self::NAME, e))
        }
    }

    /// 单次请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "FEEDTRANS_REQUEST_TIMEOUT";
        const DESCRIPTION: &'static str = "Provider request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_positive_usize(value, Self::NAME, 1, 600)?;
            Ok(Duration::from_secs(seconds as u64))
        }
    }

    /// 英文内容自动翻译开关
    pub struct AutoTranslateEnglish;
    impl EnvVar<bool> for AutoTranslateEnglish {
        const NAME: &'static str = "FEEDTRANS_AUTO_TRANSLATE_ENGLISH";
        const DESCRIPTION: &'static str = "Translate only content detected as English (true/false)";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 翻译服务端点相关环境变量
pub mod providers {
    use super::*;

    /// OpenAI 兼容的聊天补全端点
    pub struct AiApiUrl;
    impl EnvVar<String> for AiApiUrl {
        const NAME: &'static str = "FEEDTRANS_AI_API_URL";
        const DESCRIPTION: &'static str = "OpenAI-compatible chat completions endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_optional_url(value, Self::NAME)
        }
    }

    /// AI 服务密钥
    pub struct AiApiKey;
    impl EnvVar<String> for AiApiKey {
        const NAME: &'static str = "FEEDTRANS_AI_API_KEY";
        const DESCRIPTION: &'static str = "Bearer key for the AI endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }

    /// AI 模型名称
    pub struct AiModel;
    impl EnvVar<String> for AiModel {
        const NAME: &'static str = "FEEDTRANS_AI_MODEL";
        const DESCRIPTION: &'static str = "Model name sent to the AI endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            let model = value.trim();
            if model.is_empty() {
                Err(invalid(Self::NAME, "Model name must not be empty"))
            } else {
                Ok(model.to_string())
            }
        }
    }

    /// Google 翻译兼容端点
    pub struct GoogleApiUrl;
    impl EnvVar<String> for GoogleApiUrl {
        const NAME: &'static str = "FEEDTRANS_GOOGLE_API_URL";
        const DESCRIPTION: &'static str = "Google-Translate-compatible endpoint, empty to disable";

        fn parse(value: &str) -> EnvResult<String> {
            parse_optional_url(value, Self::NAME)
        }
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let entries = [
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (translation::TargetLang::NAME, translation::TargetLang::DESCRIPTION),
        (translation::Mode::NAME, translation::Mode::DESCRIPTION),
        (translation::Concurrency::NAME, translation::Concurrency::DESCRIPTION),
        (translation::MaxChunkSize::NAME, translation::MaxChunkSize::DESCRIPTION),
        (translation::DefaultService::NAME, translation::DefaultService::DESCRIPTION),
        (translation::RequestTimeout::NAME, translation::RequestTimeout::DESCRIPTION),
        (translation::AutoTranslateEnglish::NAME, translation::AutoTranslateEnglish::DESCRIPTION),
        (providers::AiApiUrl::NAME, providers::AiApiUrl::DESCRIPTION),
        (providers::AiApiKey::NAME, providers::AiApiKey::DESCRIPTION),
        (providers::AiModel::NAME, providers::AiModel::DESCRIPTION),
        (providers::GoogleApiUrl::NAME, providers::GoogleApiUrl::DESCRIPTION),
    ];

    let mut docs = String::from("# Environment Variables\n\n");
    for (name, description) in entries {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }
    docs
}
