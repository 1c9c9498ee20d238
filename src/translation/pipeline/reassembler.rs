//! 译文重组
//!
//! 把批次结果写回文档并序列化 body。没有译文的单元保留原文。
//!
//! 双语模式在原文后面插入带 `translated-text` 类的译文节点，插入按序号从大到小进行，
//! 前面的插入点不会受到后面插入的影响。译文节点一般是 `div`，`li` 和 `dt`/`dd`
//! 后面用同一列表能容纳的元素，表格单元格这类元素把译文放进自身末尾。
//! 回退策略重建的单元不改动原文，译文依次追加到 body 末尾。
//!
//! 译文模式替换单元的内容。回退策略重建的单元整体替换 body，只保留其中的媒体元素。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::dom::{
    append_child, append_inner_html, create_html_element, detach, get_node_name, insert_after,
    insert_before, parse_fragment, replace_inner_html, take_children,
};
use crate::parsers::html::Document;
use crate::translation::config::{constants, DisplayMode};
use crate::translation::error::TranslationResult;

use super::batch::UnitResult;
use super::extractor::{TranslatableUnit, UnitTarget};

/// 双语模式下译文节点的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// 紧跟在原文之后的兄弟节点
    After(&'static str),
    /// 追加在原文元素内部末尾
    Inside,
}

fn placement_for(tag: &str) -> Placement {
    match tag {
        "li" => Placement::After("li"),
        "dt" | "dd" => Placement::After("dd"),
        "td" | "th" | "caption" | "summary" | "figcaption" => Placement::Inside,
        _ => Placement::After("div"),
    }
}

/// 写回译文并返回 body 的内部标记
pub fn apply(
    doc: &Document,
    units: &[TranslatableUnit],
    results: &[UnitResult],
    mode: DisplayMode,
) -> TranslationResult<String> {
    let mut translations: Vec<Option<&str>> = vec![None; units.len()];
    for result in results {
        if let (Some(slot), Some(text)) = (translations.get_mut(result.unit_index), result.translated_text.as_deref()) {
            *slot = Some(text);
        }
    }
    let translation_of = |unit: &TranslatableUnit| translations.get(unit.sequence_index).copied().flatten();

    match mode {
        DisplayMode::Bilingual => {
            for unit in units.iter().rev() {
                if !matches!(unit.target, UnitTarget::Rebuilt { .. }) {
                    insert_bilingual(doc, unit, translation_of(unit).unwrap_or(&unit.source_markup))?;
                }
            }

            let body = doc.body()?;
            for unit in units.iter().filter(|u| matches!(u.target, UnitTarget::Rebuilt { .. })) {
                let translated = translated_node(doc, "div", translation_of(unit).unwrap_or(&unit.source_markup));
                append_child(doc.dom(), &body, translated);
            }
        }
        DisplayMode::Translated => {
            let mut rebuilt_root = None;

            for unit in units {
                if let UnitTarget::Rebuilt { root, .. } = &unit.target {
                    rebuilt_root.get_or_insert_with(|| root.clone());
                }

                if let Some(text) = translation_of(unit) {
                    replace_translated(doc, &unit.target, text)?;
                }
            }

            if let Some(root) = rebuilt_root {
                replace_body(doc, &root)?;
            }
        }
    }

    doc.body_html()
}

fn translated_node(doc: &Document, tag: &str, content: &str) -> Handle {
    let node = create_html_element(doc.dom(), tag, &[("class", constants::TRANSLATED_CLASS)]);
    append_inner_html(doc.dom(), &node, content);
    node
}

fn insert_bilingual(doc: &Document, unit: &TranslatableUnit, content: &str) -> TranslationResult<()> {
    match &unit.target {
        UnitTarget::Element(element) => match placement_for(get_node_name(element).unwrap_or("p")) {
            Placement::After(tag) => insert_after(doc.dom(), element, translated_node(doc, tag, content)),
            Placement::Inside => {
                append_child(doc.dom(), element, translated_node(doc, "div", content));
                Ok(())
            }
        },
        UnitTarget::Run(nodes) => match nodes.last() {
            Some(last) => insert_after(doc.dom(), last, translated_node(doc, "div", content)),
            None => Ok(()),
        },
        UnitTarget::Rebuilt { .. } => Ok(()),
    }
}

fn replace_translated(doc: &Document, target: &UnitTarget, text: &str) -> TranslationResult<()> {
    match target {
        UnitTarget::Element(element) => replace_inner_html(doc.dom(), element, text),
        UnitTarget::Rebuilt { paragraph, .. } => replace_inner_html(doc.dom(), paragraph, text),
        UnitTarget::Run(nodes) => {
            if let Some(first) = nodes.first() {
                for node in parse_fragment(text) {
                    insert_before(doc.dom(), first, node)?;
                }
                for node in nodes {
                    detach(node);
                }
            }
        }
    }
    Ok(())
}

/// 用重建的段落替换 body，原 body 中的媒体元素按顺序保留在最前面
fn replace_body(doc: &Document, root: &Handle) -> TranslationResult<()> {
    let body = doc.body()?;

    let mut media = Vec::new();
    collect_media(&body, &mut media);
    for node in &media {
        detach(node);
    }
    take_children(&body);

    for node in media.into_iter().chain(take_children(root)) {
        append_child(doc.dom(), &body, node);
    }
    Ok(())
}

/// 收集最外层的媒体元素
fn collect_media(node: &Handle, media: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        let is_media = matches!(child.data, NodeData::Element { .. })
            && get_node_name(child).map_or(false, |name| constants::MEDIA_TAGS.contains(&name));
        if is_media {
            media.push(child.clone());
        } else {
            collect_media(child, media);
        }
    }
}
