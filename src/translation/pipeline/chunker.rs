//! 超长单元切分
//!
//! 翻译服务对单次请求的长度有上限。超过 `max_size` 个字符的单元先按 `<br>`
//! 切分，不行再去掉标签按句子切分，最后贪心地把小段用空格拼回不超过上限的块。
//! 所有长度按字符计。

use std::sync::OnceLock;

use regex::Regex;

struct ChunkPatterns {
    line_break: Regex,
    raw_tag: Regex,
    escaped_tag: Regex,
    sentence_end: Regex,
}

fn patterns() -> &'static ChunkPatterns {
    static PATTERNS: OnceLock<ChunkPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ChunkPatterns {
        line_break: Regex::new(r"(?i)<br\s*/?>|&lt;br\s*/?&gt;").expect("换行正则有效"),
        raw_tag: Regex::new(r"<[^>]*>").expect("标签正则有效"),
        escaped_tag: Regex::new(r"&lt;.*?&gt;").expect("转义标签正则有效"),
        sentence_end: Regex::new(r"[。！？.!?]\s*").expect("句末正则有效"),
    })
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// 把文本切成不超过 `max_size` 个字符的块
///
/// 文本本身不超长时原样返回一个块。无法再分的单段超过上限时单独成块。
pub fn chunk(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);

    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }

    let parts = match split_on_line_breaks(text, max_size) {
        Some(parts) => {
            tracing::debug!("按换行标记切分为 {} 段", parts.len());
            parts
        }
        None => {
            let parts = split_sentences(text);
            tracing::debug!("按句子切分为 {} 段", parts.len());
            parts
        }
    };

    pack(parts, max_size)
}

/// 按固定字符数切片，不考虑边界
pub fn slice(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// 至少两段非空且每段都不超长时才采用换行切分
fn split_on_line_breaks(text: &str, max_size: usize) -> Option<Vec<String>> {
    let parts: Vec<String> = patterns()
        .line_break
        .split(text)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();

    if parts.len() >= 2 && parts.iter().all(|part| char_len(part) <= max_size) {
        Some(parts)
    } else {
        None
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let patterns = patterns();
    let stripped = patterns.raw_tag.replace_all(text, "");
    let stripped = patterns.escaped_tag.replace_all(&stripped, "");

    let mut sentences = Vec::new();
    let mut start = 0;
    for terminator in patterns.sentence_end.find_iter(&stripped) {
        push_trimmed(&mut sentences, &stripped[start..terminator.end()]);
        start = terminator.end();
    }
    push_trimmed(&mut sentences, &stripped[start..]);

    sentences
}

fn push_trimmed(parts: &mut Vec<String>, part: &str) {
    let part = part.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
}

/// 贪心合并：在不超过上限的前提下用单个空格拼接相邻段
fn pack(parts: Vec<String>, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for part in parts {
        let part_len = char_len(&part);

        if current.is_empty() {
            current = part;
            current_len = part_len;
        } else if current_len + 1 + part_len <= max_size {
            current.push(' ');
            current.push_str(&part);
            current_len += 1 + part_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current = part;
            current_len = part_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
