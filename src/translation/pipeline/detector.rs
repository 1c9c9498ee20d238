//! 内容边界检测
//!
//! 判断输入是 HTML 还是纯文本/Markdown，并提供简单的英文比例判断。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("标签正则有效")
    })
}

/// 内容中出现任意形如 `<word ...>` 或 `</word>` 的标签即视为 HTML
///
/// 纯文本里的 `<b>` 之类写法也会被判为 HTML。
pub fn is_html(content: &str) -> bool {
    tag_regex().is_match(content)
}

/// 英文判断前移除的片段：Markdown 图片和链接、标签、URL、代码块、行内代码
fn noise_regexes() -> &'static [Regex] {
    static NOISE: OnceLock<Vec<Regex>> = OnceLock::new();
    NOISE.get_or_init(|| {
        [
            r"!\[.*?\]\(.*?\)",
            r"\[.*?\]\(.*?\)",
            r"<[^>]*>",
            r"https?://\S+",
            r"(?s)```.*?```",
            r"`[^`]*`",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("英文判断正则有效"))
        .collect()
    })
}

fn html_tag_regex() -> &'static Regex {
    static HTML_TAG: OnceLock<Regex> = OnceLock::new();
    HTML_TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("标签正则有效"))
}

/// 文本是否主要为英文
///
/// 先去掉链接、URL 和代码，剩余内容修剪后不足 10 个字符时不视为英文。
/// 只统计拉丁字母、中日韩统一表意文字、日文假名和韩文音节，拉丁字母占比
/// 严格大于阈值才算英文。
pub fn is_english_text(text: &str, threshold: f32) -> bool {
    let mut plain = text.to_string();
    for regex in noise_regexes() {
        plain = regex.replace_all(&plain, "").into_owned();
    }
    let plain = plain.trim();

    if plain.chars().count() < constants::MIN_PLAIN_TEXT_LENGTH {
        return false;
    }

    let mut latin = 0usize;
    let mut others = 0usize;
    for c in plain.chars() {
        match c {
            'a'..='z' | 'A'..='Z' => latin += 1,
            '\u{4e00}'..='\u{9fff}' | '\u{3040}'..='\u{30ff}' | '\u{ac00}'..='\u{d7af}' => others += 1,
            _ => {}
        }
    }

    let total = latin + others;
    if total == 0 {
        return false;
    }

    latin as f32 / total as f32 > threshold
}

/// 整篇内容是否为英文文章：去掉标签后只看前 500 个字符
pub fn is_english_article(content: &str, threshold: f32) -> bool {
    let plain = html_tag_regex().replace_all(content, "");
    let head: String = plain.chars().take(constants::ENGLISH_SAMPLE_CHARS).collect();
    is_english_text(&head, threshold)
}
