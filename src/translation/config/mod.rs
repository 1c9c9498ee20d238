//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{
    AiSettings, ConfigManager, DisplayMode, GoogleSettings, ServiceKind, TranslationConfig,
};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 调度相关
    pub const DEFAULT_CONCURRENCY: usize = 20;
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2500;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 抽取回退阶梯
    pub const DIV_FALLBACK_MIN_TEXT: usize = 20;
    pub const LINE_FALLBACK_MIN_LINE: usize = 10;
    pub const COARSE_FALLBACK_THRESHOLD: usize = 3000;
    pub const COARSE_SLICE_SIZE: usize = 2500;
    pub const MIN_FALLBACK_TEXT: usize = 10;

    // 纯文本输入短于该长度时原样返回
    pub const MIN_PLAIN_TEXT_LENGTH: usize = 10;

    // 语言判断
    pub const ENGLISH_RATIO_THRESHOLD: f32 = 0.7;
    pub const ENGLISH_SAMPLE_CHARS: usize = 500;

    // 译文节点标记
    pub const TRANSLATED_CLASS: &str = "translated-text";

    // 块级翻译单元
    pub const BLOCK_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "td", "th", "figcaption",
        "dt", "dd", "summary", "caption",
    ];

    // 译文模式整体重建 body 时保留的媒体元素
    pub const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "iframe", "svg"];

    // 其内部永不翻译的元素
    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "pre", "code", "noscript", "template"];

    // 默认服务端点
    pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
    pub const AI_TEMPERATURE: f32 = 0.3;
    pub const AI_MAX_TOKENS: u32 = 4000;
    pub const DEFAULT_GOOGLE_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "feedtrans.toml",
        ".feedtrans.toml",
        "feedtrans.json",
        "~/.config/feedtrans/config.toml",
        "/etc/feedtrans/config.toml",
    ];
}

/// 检查是否存在配置文件
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载配置，失败时回退到默认值
pub fn load_translation_config(target_lang: &str) -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.config_for(target_lang),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            TranslationConfig::default_with_lang(target_lang)
        }
    }
}
