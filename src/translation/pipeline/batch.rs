//! 翻译批次调度
//!
//! 把单元按固定大小的窗口分组：同一窗口内的请求并发执行，整个窗口完成后才开始
//! 下一个窗口，因此同时在途的请求数不超过窗口大小。所有 future 都在调用方的任务上
//! 轮询，不派生新任务。
//!
//! 结果按单元序号写入预先分配好的位置，与完成先后无关。

use std::future::Future;

use futures::future::join_all;

use crate::translation::error::{helpers, TranslationResult};

/// 单个单元的翻译结果
///
/// `translated_text` 与 `error` 恰好有一个有值。
#[derive(Debug, Clone, PartialEq)]
pub struct UnitResult {
    pub unit_index: usize,
    pub translated_text: Option<String>,
    pub error: Option<String>,
}

impl UnitResult {
    pub fn success(unit_index: usize, translated_text: String) -> Self {
        Self {
            unit_index,
            translated_text: Some(translated_text),
            error: None,
        }
    }

    pub fn failure(unit_index: usize, error: impl Into<String>) -> Self {
        Self {
            unit_index,
            translated_text: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.translated_text.is_some()
    }

    fn from_outcome(unit_index: usize, outcome: TranslationResult<String>) -> Self {
        match outcome {
            Ok(text) if !text.trim().is_empty() => Self::success(unit_index, text),
            Ok(_) => {
                tracing::warn!("单元 {} 的翻译结果为空，保留原文", unit_index);
                Self::failure(unit_index, "翻译结果为空")
            }
            Err(error) => {
                let error = error.with_context(format!("单元 {}", unit_index));
                helpers::log_error(&error);
                Self::failure(unit_index, error.to_string())
            }
        }
    }
}

/// 批次执行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub windows: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[UnitResult], window_size: usize) -> Self {
        let window_size = window_size.max(1);
        let succeeded = results.iter().filter(|r| r.is_success()).count();

        Self {
            windows: results.len().div_ceil(window_size),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

/// 按窗口并发执行翻译
///
/// `translate` 接收单元序号和单元本身。窗口大小为 0 时按 1 处理。
/// 不做重试，失败和空结果都记为该单元的错误。
pub async fn run_batched<T, F, Fut>(items: Vec<T>, window_size: usize, translate: F) -> Vec<UnitResult>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = TranslationResult<String>>,
{
    let window_size = window_size.max(1);
    let total = items.len();
    let mut slots: Vec<Option<UnitResult>> = vec![None; total];

    let mut pending = items.into_iter().enumerate().peekable();
    let mut window_number = 0;

    while pending.peek().is_some() {
        window_number += 1;
        let window: Vec<(usize, T)> = pending.by_ref().take(window_size).collect();
        tracing::debug!(
            "开始第 {} 个窗口，包含 {} 个单元（共 {} 个）",
            window_number,
            window.len(),
            total
        );

        let calls = window.into_iter().map(|(index, item)| {
            let call = translate(index, item);
            async move { (index, call.await) }
        });

        for (index, outcome) in join_all(calls).await {
            slots[index] = Some(UnitResult::from_outcome(index, outcome));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| UnitResult::failure(index, "单元未执行")))
        .collect()
}
