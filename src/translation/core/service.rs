//! 翻译服务核心实现
//!
//! 本模块把管道的各个阶段串成对外的入口：
//!
//! ```text
//! 原始内容 ─┬─ HTML ──────────────────────┬─ 单元抽取 ─ 批次调度 ─ 译文重组 ─ HTML
//!           └─ 纯文本/Markdown ─ 格式化 ──┘        (超长单元先切分)
//! ```
//!
//! 入口方法从不返回错误：单元级失败回退到原文，整体失败时返回原始内容并在
//! [`TranslationOutcome::error`] 中给出原因。
//!
//! ## 使用示例
//!
//! ```no_run
//! use feedtrans::translation::{TranslateRequest, TranslationConfig, TranslationService};
//!
//! # async fn demo() -> feedtrans::translation::TranslationResult<()> {
//! let config = TranslationConfig::default_with_lang("zh");
//! let service = TranslationService::new(config)?;
//!
//! let request = TranslateRequest::new("zh");
//! let outcome = service.translate_html("<p>Hello</p>", &request).await;
//! println!("{}", outcome.html);
//! # Ok(())
//! # }
//! ```

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;

use crate::parsers::html::Document;
use crate::translation::{
    config::{constants, DisplayMode, TranslationConfig},
    error::{helpers, TranslationError, TranslationResult},
    pipeline::{
        apply, chunk, extract, format_markdown, is_english_article, is_english_text, is_html,
        run_batched, slice,
        BatchSummary, ExtractOptions, SplitStrategy, TranslatableUnit,
    },
    providers::{select_translator, Translator},
};

/// 单次翻译请求
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateRequest {
    pub target_lang: String,
    pub mode: DisplayMode,
    /// 每个窗口内并发的请求数
    pub concurrency: usize,
}

impl TranslateRequest {
    pub fn new(target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            mode: DisplayMode::default(),
            concurrency: constants::DEFAULT_CONCURRENCY,
        }
    }

    /// 从配置中取目标语言、显示模式和并发数
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            target_lang: config.target_lang.clone(),
            mode: config.display_mode,
            concurrency: config.concurrency,
        }
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// 翻译结果
///
/// `error` 只在整体失败时有值，此时 `html` 是原始内容。
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub html: String,
    pub error: Option<String>,
}

impl TranslationOutcome {
    fn translated(html: String) -> Self {
        Self { html, error: None }
    }

    fn unchanged(content: &str) -> Self {
        Self {
            html: content.to_string(),
            error: None,
        }
    }

    fn failed(content: &str, error: &TranslationError) -> Self {
        helpers::log_error(error);
        Self {
            html: content.to_string(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 英文内容自动翻译的结果
#[derive(Debug, Clone, PartialEq)]
pub struct AutoTranslation {
    pub outcome: TranslationOutcome,
    /// 译后的标题，没有传入标题时为 `None`
    pub title: Option<String>,
}

/// 翻译服务
///
/// 持有选定的翻译服务适配器和配置。每次调用都重新解析文档，调用之间不共享可变状态，
/// 只有统计计数器是共享的。
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    config: TranslationConfig,
    stats: ServiceStats,
}

impl TranslationService {
    /// 按配置选择翻译服务
    ///
    /// # 错误
    ///
    /// 配置无效，或者 AI 与 Google 服务都缺少必需配置时返回 `ConfigError`。
    pub fn new(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        let translator = select_translator(&config)?;
        Ok(Self::with_translator(translator, config))
    }

    /// 使用指定的翻译服务适配器
    pub fn with_translator(translator: Arc<dyn Translator>, config: TranslationConfig) -> Self {
        Self {
            translator,
            config,
            stats: ServiceStats::default(),
        }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn translator_name(&self) -> &str {
        self.translator.name()
    }

    pub fn get_stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 翻译 HTML 内容
    ///
    /// 内容不含任何标签时按纯文本处理。
    pub async fn translate_html(&self, content: &str, request: &TranslateRequest) -> TranslationOutcome {
        self.translate_content(content, &[], request).await
    }

    /// 翻译任意订阅内容
    ///
    /// HTML 直接进入管道；纯文本/Markdown 先渲染为 HTML，`images` 中未出现在文本里的
    /// 图片会追加到末尾。修剪后短于 10 个字符的纯文本原样返回。
    pub async fn translate_content(
        &self,
        content: &str,
        images: &[String],
        request: &TranslateRequest,
    ) -> TranslationOutcome {
        let start = Instant::now();

        let outcome = if is_html(content) {
            self.run_pipeline(content, content, request).await
        } else if content.trim().chars().count() < constants::MIN_PLAIN_TEXT_LENGTH {
            tracing::debug!("纯文本过短，跳过翻译");
            TranslationOutcome::unchanged(content)
        } else {
            tracing::debug!("内容不是 HTML，按 Markdown 格式化");
            let html = format_markdown(content, images);
            self.run_pipeline(content, &html, request).await
        };

        self.stats.add_processing_time(start.elapsed());
        outcome
    }

    /// 翻译标题等短文本
    ///
    /// 目标语言为英文且文本已经是英文时不发请求。
    pub async fn translate_text(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(text.to_string());
        }

        let target_is_english = target_lang.to_lowercase().starts_with("en");
        if target_is_english && is_english_text(trimmed, self.config.english_ratio_threshold) {
            tracing::debug!("文本已是英文，跳过翻译");
            return Ok(text.to_string());
        }

        self.stats.inc_requests_sent();
        self.translator.translate(trimmed, target_lang).await.map_err(|e| {
            self.stats.inc_errors_encountered();
            e
        })
    }

    /// 只在内容被判定为英文时翻译正文和标题
    ///
    /// 判断时去掉标签，只看前 500 个字符。不是英文时返回 `None`，不发任何请求。
    /// 标题翻译失败只记录日志，标题保持原样。
    pub async fn translate_if_english(
        &self,
        content: &str,
        title: Option<&str>,
        images: &[String],
        request: &TranslateRequest,
    ) -> Option<AutoTranslation> {
        if !is_english_article(content, self.config.english_ratio_threshold) {
            tracing::info!("内容不是英文，跳过自动翻译");
            return None;
        }

        tracing::info!("检测到英文内容，开始自动翻译");
        let outcome = self.translate_content(content, images, request).await;

        let title = match title {
            Some(title) => match self.translate_text(title, &request.target_lang).await {
                Ok(translated) => Some(translated),
                Err(e) => {
                    tracing::warn!("标题翻译失败，保留原标题: {}", e);
                    Some(title.to_string())
                }
            },
            None => None,
        };

        Some(AutoTranslation { outcome, title })
    }

    /// `original` 是出错时返回的内容，`html` 是实际解析的标记
    async fn run_pipeline(&self, original: &str, html: &str, request: &TranslateRequest) -> TranslationOutcome {
        let doc = Document::parse(html);
        let options = ExtractOptions {
            max_chunk_size: self.config.max_chunk_size,
        };

        let units = match extract(&doc, &options) {
            Ok(units) => units,
            Err(e) => return TranslationOutcome::failed(original, &e),
        };

        if units.is_empty() {
            tracing::info!("没有找到可翻译的单元，返回原始内容");
            return TranslationOutcome::unchanged(original);
        }

        self.stats.add_units_collected(units.len());
        tracing::info!(
            "开始翻译 {} 个单元，目标语言 {}，窗口大小 {}，服务 {}",
            units.len(),
            request.target_lang,
            request.concurrency.max(1),
            self.translator.name()
        );

        let results = run_batched(units.iter().collect(), request.concurrency, |_, unit| {
            self.translate_unit(unit, &request.target_lang)
        })
        .await;

        let summary = BatchSummary::from_results(&results, request.concurrency);
        self.stats.add_batch_summary(&summary);
        tracing::info!(
            "翻译完成: {} 个窗口，成功 {}，失败 {}",
            summary.windows,
            summary.succeeded,
            summary.failed
        );

        match apply(&doc, &units, &results, request.mode) {
            Ok(html) => TranslationOutcome::translated(html),
            Err(e) => TranslationOutcome::failed(original, &e),
        }
    }

    /// 翻译单个单元；切块按顺序请求
    async fn translate_unit(&self, unit: &TranslatableUnit, target_lang: &str) -> TranslationResult<String> {
        match unit.split {
            SplitStrategy::Whole => self.request(&unit.source_markup, target_lang).await,
            SplitStrategy::Chunked => {
                let chunks = chunk(&unit.source_markup, self.config.max_chunk_size);
                tracing::debug!("单元 {} 切分为 {} 块", unit.sequence_index, chunks.len());

                let translated = self.translate_pieces(unit.sequence_index, &chunks, target_lang).await?;
                Ok(translated.join(" "))
            }
            SplitStrategy::FixedSlices(size) => {
                let slices = slice(&unit.source_markup, size);
                tracing::debug!("单元 {} 切分为 {} 片", unit.sequence_index, slices.len());

                let translated = self.translate_pieces(unit.sequence_index, &slices, target_lang).await?;
                Ok(translated.concat())
            }
        }
    }

    /// 顺序翻译各块，失败或为空的块保留原文；所有块都没有译文时返回错误
    ///
    /// 配置、解析等非单元级错误不再继续后面的块。
    async fn translate_pieces(
        &self,
        unit_index: usize,
        pieces: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        let mut translated = Vec::with_capacity(pieces.len());
        let mut succeeded = 0usize;
        let mut last_error = None;

        for (index, piece) in pieces.iter().enumerate() {
            match self.request(piece, target_lang).await {
                Ok(text) if !text.trim().is_empty() => {
                    succeeded += 1;
                    translated.push(text);
                }
                Ok(_) => {
                    tracing::warn!("单元 {} 第 {} 块译文为空，保留原文", unit_index, index);
                    translated.push(piece.clone());
                }
                Err(e) if !e.is_unit_local() => return Err(e),
                Err(e) => {
                    tracing::warn!("单元 {} 第 {} 块翻译失败，保留原文: {}", unit_index, index, e);
                    translated.push(piece.clone());
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            return Err(last_error.unwrap_or_else(|| {
                TranslationError::ProviderError("所有分块的翻译结果都为空".to_string())
            }));
        }

        Ok(translated)
    }

    async fn request(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        self.stats.inc_requests_sent();
        self.stats.add_chars_processed(text.chars().count());

        let result = self.translator.translate(text, target_lang).await;
        if result.is_err() {
            self.stats.inc_errors_encountered();
        }
        result
    }
}

/// 使用给定配置翻译 HTML
///
/// 翻译服务不可用时返回原始内容和配置错误信息。
pub async fn translate_html(
    content: &str,
    request: &TranslateRequest,
    config: TranslationConfig,
) -> TranslationOutcome {
    match TranslationService::new(config) {
        Ok(service) => service.translate_html(content, request).await,
        Err(e) => TranslationOutcome::failed(content, &e),
    }
}

/// 线程安全的统计计数器
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 抽取到的翻译单元数量
    pub units_collected: AtomicUsize,
    /// 执行的窗口数量
    pub windows_run: AtomicUsize,
    /// 成功翻译的单元数量
    pub units_translated: AtomicUsize,
    /// 回退到原文的单元数量
    pub units_failed: AtomicUsize,
    /// 发往翻译服务的请求数量
    pub requests_sent: AtomicUsize,
    /// 失败的请求数量
    pub errors_encountered: AtomicUsize,
    /// 发送的字符总数
    pub total_chars_processed: AtomicUsize,
    /// 总处理时间，以微秒为单位存储
    pub processing_time: AtomicU64,
}

impl ServiceStats {
    pub fn add_units_collected(&self, count: usize) {
        self.units_collected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_batch_summary(&self, summary: &BatchSummary) {
        self.windows_run.fetch_add(summary.windows, Ordering::Relaxed);
        self.units_translated.fetch_add(summary.succeeded, Ordering::Relaxed);
        self.units_failed.fetch_add(summary.failed, Ordering::Relaxed);
    }

    pub fn inc_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_errors_encountered(&self) {
        self.errors_encountered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_chars_processed(&self, chars: usize) {
        self.total_chars_processed.fetch_add(chars, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: std::time::Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            units_collected: self.units_collected.load(Ordering::Relaxed),
            windows_run: self.windows_run.load(Ordering::Relaxed),
            units_translated: self.units_translated.load(Ordering::Relaxed),
            units_failed: self.units_failed.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            errors_encountered: self.errors_encountered.load(Ordering::Relaxed),
            total_chars_processed: self.total_chars_processed.load(Ordering::Relaxed),
            processing_time: std::time::Duration::from_micros(
                self.processing_time.load(Ordering::Relaxed),
            ),
        }
    }
}

/// 统计信息快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceStatsSnapshot {
    pub units_collected: usize,
    pub windows_run: usize,
    pub units_translated: usize,
    pub units_failed: usize,
    pub requests_sent: usize,
    pub errors_encountered: usize,
    pub total_chars_processed: usize,
    pub processing_time: std::time::Duration,
}
