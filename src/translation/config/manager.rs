//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::{providers, translation, EnvVar};
use crate::translation::error::{TranslationError, TranslationResult};

/// 译文显示模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// 保留原文，在每个单元后插入译文
    #[default]
    Bilingual,
    /// 用译文替换原文
    Translated,
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bilingual" => Ok(DisplayMode::Bilingual),
            "translated" | "translation-only" => Ok(DisplayMode::Translated),
            other => Err(format!("未知的显示模式 '{}'，可选: bilingual, translated", other)),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Bilingual => write!(f, "bilingual"),
            DisplayMode::Translated => write!(f, "translated"),
        }
    }
}

/// 翻译服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// OpenAI 兼容的聊天补全接口
    Ai,
    /// Google 翻译兼容接口
    #[default]
    Google,
}

impl ServiceKind {
    /// 另一种服务，用于回退
    pub fn other(self) -> Self {
        match self {
            ServiceKind::Ai => ServiceKind::Google,
            ServiceKind::Google => ServiceKind::Ai,
        }
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ai" | "openai" => Ok(ServiceKind::Ai),
            "google" => Ok(ServiceKind::Google),
            other => Err(format!("未知的翻译服务 '{}'，可选: ai, google", other)),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Ai => write!(f, "ai"),
            ServiceKind::Google => write!(f, "google"),
        }
    }
}

/// AI 翻译服务设置
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AiSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_AI_API_URL.to_string(),
            api_key: None,
            model: constants::DEFAULT_AI_MODEL.to_string(),
        }
    }
}

impl AiSettings {
    /// 端点、密钥、模型齐全才可用
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
            && !self.model.trim().is_empty()
            && self
                .api_key
                .as_deref()
                .map_or(false, |key| !key.trim().is_empty())
    }
}

// 密钥不进日志
impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[configured]"))
            .field("model", &self.model)
            .finish()
    }
}

/// Google 翻译服务设置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GoogleSettings {
    pub api_url: String,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_GOOGLE_API_URL.to_string(),
        }
    }
}

impl GoogleSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
    }
}

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub target_lang: String,
    pub display_mode: DisplayMode,

    // 调度配置
    pub concurrency: usize,
    pub max_chunk_size: usize,
    pub request_timeout_secs: u64,

    // 服务选择
    pub default_service: ServiceKind,
    pub ai: AiSettings,
    pub google: GoogleSettings,

    // 语言判断
    pub english_ratio_threshold: f32,
    /// 只翻译被判定为英文的内容
    pub auto_translate_english: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_lang: "zh".to_string(),
            display_mode: DisplayMode::default(),

            concurrency: constants::DEFAULT_CONCURRENCY,
            max_chunk_size: constants::DEFAULT_MAX_CHUNK_SIZE,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            default_service: ServiceKind::default(),
            ai: AiSettings::default(),
            google: GoogleSettings::default(),

            english_ratio_threshold: constants::ENGLISH_RATIO_THRESHOLD,
            auto_translate_english: false,
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("目标语言不能为空".to_string()));
        }

        if self.concurrency == 0 {
            return Err(TranslationError::ConfigError("并发窗口大小不能为0".to_string()));
        }

        if self.max_chunk_size < 100 {
            return Err(TranslationError::ConfigError(format!(
                "单次请求最大字符数过小: {}",
                self.max_chunk_size
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        if !(self.english_ratio_threshold > 0.0 && self.english_ratio_threshold <= 1.0) {
            return Err(TranslationError::ConfigError(format!(
                "英文比例阈值必须在 (0, 1] 之间: {}",
                self.english_ratio_threshold
            )));
        }

        validate_endpoint(&self.ai.api_url)?;
        validate_endpoint(&self.google.api_url)?;

        Ok(())
    }

    /// 应用环境变量覆盖，只有设置了的变量才会生效
    pub fn apply_env_overrides(&mut self) {
        env_override::<_, translation::TargetLang>(&mut self.target_lang);
        env_override::<_, translation::Mode>(&mut self.display_mode);
        env_override::<_, translation::Concurrency>(&mut self.concurrency);
        env_override::<_, translation::MaxChunkSize>(&mut self.max_chunk_size);
        env_override::<_, translation::DefaultService>(&mut self.default_service);
        env_override::<_, translation::AutoTranslateEnglish>(&mut self.auto_translate_english);

        let mut timeout = self.request_timeout();
        env_override::<_, translation::RequestTimeout>(&mut timeout);
        self.request_timeout_secs = timeout.as_secs();

        env_override::<_, providers::AiApiUrl>(&mut self.ai.api_url);
        env_override::<_, providers::AiModel>(&mut self.ai.model);
        env_override::<_, providers::GoogleApiUrl>(&mut self.google.api_url);

        if let Some(Ok(key)) = providers::AiApiKey::lookup() {
            self.ai.api_key = if key.is_empty() { None } else { Some(key) };
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_override<T, V: EnvVar<T>>(slot: &mut T) {
    match V::lookup() {
        Some(Ok(value)) => *slot = value,
        Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
        None => {}
    }
}

/// 空端点表示未配置；非空时必须是 http(s) URL
fn validate_endpoint(endpoint: &str) -> TranslationResult<()> {
    if endpoint.trim().is_empty() {
        return Ok(());
    }

    let url = url::Url::parse(endpoint.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(TranslationError::ConfigError(format!(
            "不支持的协议 '{}': {}",
            scheme, endpoint
        ))),
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 按搜索路径加载配置文件，再应用环境变量
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let (mut config, source) = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, source })
    }

    /// 从指定文件加载配置，再应用环境变量
    pub fn from_file<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        Self::load_dotenv();

        let path = path.as_ref();
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 配置来源文件（未找到文件时为 `None`）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 以指定目标语言派生一份配置
    pub fn config_for(&self, target_lang: &str) -> TranslationConfig {
        TranslationConfig {
            target_lang: target_lang.to_string(),
            ..self.config.clone()
        }
    }

    fn load_config() -> TranslationResult<(TranslationConfig, Option<PathBuf>)> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                let config = Self::load_from_file(candidate)?;
                return Ok((config, Some(candidate.to_path_buf())));
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok((TranslationConfig::default(), None))
    }

    /// 从指定文件加载配置（TOML 或 JSON）
    fn load_from_file(path: &Path) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::ConfigError(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;

        if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency, 20);
        assert_eq!(config.display_mode, DisplayMode::Bilingual);
    }

    #[test]
    fn ai_requires_key() {
        let mut ai = AiSettings::default();
        assert!(!ai.is_configured());

        ai.api_key = Some("   ".to_string());
        assert!(!ai.is_configured());

        ai.api_key = Some("sk-test".to_string());
        assert!(ai.is_configured());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let ai = AiSettings {
            api_key: Some("sk-secret".to_string()),
            ..AiSettings::default()
        };
        let printed = format!("{:?}", ai);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("[configured]"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: TranslationConfig = toml::from_str(
            r#"
            target_lang = "ja"
            display_mode = "translated"
            concurrency = 4

            [ai]
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.target_lang, "ja");
        assert_eq!(config.display_mode, DisplayMode::Translated);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_chunk_size, constants::DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(config.ai.model, constants::DEFAULT_AI_MODEL);
        assert!(config.ai.is_configured());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let config = TranslationConfig {
            concurrency: 0,
            ..TranslationConfig::default()
        };
        assert!(matches!(config.validate(), Err(TranslationError::ConfigError(_))));

        let mut config = TranslationConfig::default();
        config.google.api_url = "ftp://example.com/translate".to_string();
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.google.api_url = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn example_config_round_trips() {
        let path = std::env::temp_dir().join(format!("feedtrans-example-{}.toml", std::process::id()));
        ConfigManager::generate_example_config(&path).unwrap();

        let loaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(loaded, TranslationConfig::default());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn env_overrides_only_touch_set_variables() {
        std::env::set_var("FEEDTRANS_CONCURRENCY", "7");
        std::env::set_var("FEEDTRANS_DEFAULT_SERVICE", "nonsense");

        let mut config = TranslationConfig::default_with_lang("ja");
        config.apply_env_overrides();

        assert_eq!(config.concurrency, 7);
        // 无效值被忽略
        assert_eq!(config.default_service, ServiceKind::Google);
        // 未设置的变量不覆盖已有值
        assert_eq!(config.target_lang, "ja");

        std::env::remove_var("FEEDTRANS_CONCURRENCY");
        std::env::remove_var("FEEDTRANS_DEFAULT_SERVICE");
    }
}
