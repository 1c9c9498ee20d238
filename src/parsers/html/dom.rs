use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::{create_element, NodeOrText, TreeSink};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::translation::error::{TranslationError, TranslationResult};

use super::serializer::serialize_children;

/// 按给定编码把原始字节解码为字符串
///
/// 无法识别的编码名按 UTF-8 处理，非法字节替换为 U+FFFD。
pub fn decode_bytes(data: &[u8], document_encoding: &str) -> String {
    match Encoding::for_label(document_encoding.trim().as_bytes()) {
        Some(encoding) => encoding.decode(data).0.into_owned(),
        None => String::from_utf8_lossy(data).into_owned(),
    }
}

/// 将 HTML 字符串解析为完整文档（自动补全 html/head/body）
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(StrTendril::from(html))
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// `parent` 是 `Cell<Option<Weak>>`，读取时必须取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 检查元素的 class 属性是否包含指定类名
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

/// 检查任一祖先节点是否满足条件（不含自身）
pub fn has_ancestor<F>(node: &Handle, mut predicate: F) -> bool
where
    F: FnMut(&Handle) -> bool,
{
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        if predicate(&parent) {
            return true;
        }
        current = get_parent_node(&parent);
    }
    false
}

/// 按文档顺序（先序）访问所有元素节点
pub fn walk_elements<F>(node: &Handle, visit: &mut F)
where
    F: FnMut(&Handle),
{
    for child in node.children.borrow().iter() {
        if let NodeData::Element { .. } = child.data {
            visit(child);
        }
        walk_elements(child, visit);
    }
}

/// 收集节点下的全部文本
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, text: &mut String) {
    match &node.data {
        NodeData::Text { contents } => text.push_str(&contents.borrow()),
        NodeData::Element { name, .. }
            if matches!(name.local.as_ref(), "script" | "style" | "noscript" | "template") => {}
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, text);
            }
        }
    }
}

/// 节点的直接文本子节点（不递归）
pub fn direct_text_children(node: &Handle) -> Vec<String> {
    node.children
        .borrow()
        .iter()
        .filter_map(|child| match &child.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        })
        .collect()
}

/// 下一个兄弟节点（任意类型）
pub fn next_sibling(node: &Handle) -> Option<Handle> {
    let parent = get_parent_node(node)?;
    let siblings = parent.children.borrow();
    let index = siblings.iter().position(|s| Rc::ptr_eq(s, node))?;
    siblings.get(index + 1).cloned()
}

/// 下一个元素兄弟节点，跳过文本和注释
pub fn next_element_sibling(node: &Handle) -> Option<Handle> {
    let parent = get_parent_node(node)?;
    let siblings = parent.children.borrow();
    let index = siblings.iter().position(|s| Rc::ptr_eq(s, node))?;
    siblings
        .iter()
        .skip(index + 1)
        .find(|s| matches!(s.data, NodeData::Element { .. }))
        .cloned()
}

/// 创建 HTML 命名空间下的新元素
pub fn create_html_element(dom: &RcDom, tag_name: &str, attrs: &[(&str, &str)]) -> Handle {
    let attributes = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: format_tendril!("{}", value),
        })
        .collect();

    create_element(
        dom,
        QualName::new(None, ns!(html), LocalName::from(tag_name)),
        attributes,
    )
}

/// 在 `node` 之后插入 `new_node`，两者成为兄弟节点
pub fn insert_after(dom: &RcDom, node: &Handle, new_node: Handle) -> TranslationResult<()> {
    let parent = get_parent_node(node)
        .ok_or_else(|| TranslationError::ParseError("目标节点没有父节点，无法插入".to_string()))?;

    match next_sibling(node) {
        Some(next) => dom.append_before_sibling(&next, NodeOrText::AppendNode(new_node)),
        None => dom.append(&parent, NodeOrText::AppendNode(new_node)),
    }

    Ok(())
}

/// 在 `reference` 之前插入 `new_node`
pub fn insert_before(dom: &RcDom, reference: &Handle, new_node: Handle) -> TranslationResult<()> {
    if get_parent_node(reference).is_none() {
        return Err(TranslationError::ParseError("目标节点没有父节点，无法插入".to_string()));
    }

    dom.append_before_sibling(reference, NodeOrText::AppendNode(new_node));
    Ok(())
}

/// 把节点从父节点中移除，之后可以重新挂到别处
pub fn detach(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// 追加元素子节点
pub fn append_child(dom: &RcDom, parent: &Handle, child: Handle) {
    dom.append(parent, NodeOrText::AppendNode(child));
}

/// 追加文本子节点
pub fn append_text(dom: &RcDom, parent: &Handle, text: &str) {
    dom.append(parent, NodeOrText::AppendText(StrTendril::from(text)));
}

/// 取出节点的全部子节点，返回的节点都已脱离父节点
pub fn take_children(node: &Handle) -> Vec<Handle> {
    let children = node.children.take();
    for child in &children {
        child.parent.set(None);
    }
    children
}

/// 用一段 HTML 标记替换元素的内部内容
///
/// 标记先在独立文档的 body 中解析，再把得到的节点移动到目标元素下。
pub fn replace_inner_html(dom: &RcDom, node: &Handle, markup: &str) {
    take_children(node);
    append_inner_html(dom, node, markup);
}

/// 将一段 HTML 标记解析后追加为元素的子节点
pub fn append_inner_html(dom: &RcDom, node: &Handle, markup: &str) {
    for child in parse_fragment(markup) {
        dom.append(node, NodeOrText::AppendNode(child));
    }
}

/// 解析 HTML 片段，返回已脱离父节点的顶层节点
pub fn parse_fragment(markup: &str) -> Vec<Handle> {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{}</body></html>", markup);
    let fragment = parse_html(&wrapped);

    let body = get_child_node_by_name(&fragment.document, "html")
        .and_then(|html| get_child_node_by_name(&html, "body"));

    body.map(|body| take_children(&body)).unwrap_or_default()
}

/// 单次管道调用独占的已解析文档
///
/// 每次翻译都基于一次新的解析；抽取器与重组器通过 `&Document` 修改同一棵树，
/// 结束后序列化 body 并释放。
pub struct Document {
    dom: RcDom,
}

impl Document {
    /// 解析 HTML 字符串
    pub fn parse(html: &str) -> Self {
        Self {
            dom: parse_html(html),
        }
    }

    /// 底层 DOM
    pub fn dom(&self) -> &RcDom {
        &self.dom
    }

    /// 文档的 body 元素
    pub fn body(&self) -> TranslationResult<Handle> {
        get_child_node_by_name(&self.dom.document, "html")
            .and_then(|html| get_child_node_by_name(&html, "body"))
            .ok_or_else(|| TranslationError::ParseError("文档缺少 body 元素".to_string()))
    }

    /// 序列化 body 的内部标记
    pub fn body_html(&self) -> TranslationResult<String> {
        serialize_children(&self.body()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(doc: &Document, tag: &str) -> Handle {
        let mut found = None;
        walk_elements(&doc.dom().document, &mut |node| {
            if found.is_none() && get_node_name(node) == Some(tag) {
                found = Some(node.clone());
            }
        });
        found.expect("element should exist")
    }

    #[test]
    fn body_html_strips_document_shell() {
        let doc = Document::parse("<p>Hello</p><p>World</p>");
        assert_eq!(doc.body_html().unwrap(), "<p>Hello</p><p>World</p>");
    }

    #[test]
    fn get_parent_node_does_not_detach() {
        let doc = Document::parse("<div><p>x</p></div>");
        let p = first_element(&doc, "p");

        let parent = get_parent_node(&p).expect("p has a parent");
        assert_eq!(get_node_name(&parent), Some("div"));
        // 第二次读取仍然可以拿到父节点
        assert!(get_parent_node(&p).is_some());
    }

    #[test]
    fn insert_after_places_sibling() {
        let doc = Document::parse("<p>a</p><p>c</p>");
        let a = first_element(&doc, "p");
        let b = create_html_element(doc.dom(), "p", &[("class", "translated-text")]);
        append_text(doc.dom(), &b, "b");

        insert_after(doc.dom(), &a, b).unwrap();

        assert_eq!(
            doc.body_html().unwrap(),
            "<p>a</p><p class=\"translated-text\">b</p><p>c</p>"
        );
    }

    #[test]
    fn detach_and_insert_before_move_nodes() {
        let doc = Document::parse("<div><img src=\"a.png\"></div><p>text</p>");
        let img = first_element(&doc, "img");
        let p = first_element(&doc, "p");

        detach(&img);
        assert!(get_parent_node(&img).is_none());
        insert_before(doc.dom(), &p, img).unwrap();

        assert_eq!(doc.body_html().unwrap(), "<div></div><img src=\"a.png\"><p>text</p>");
    }

    #[test]
    fn insert_before_requires_parent() {
        let doc = Document::parse("<p>x</p>");
        let orphan = create_html_element(doc.dom(), "p", &[]);
        let other = create_html_element(doc.dom(), "span", &[]);
        assert!(insert_before(doc.dom(), &orphan, other).is_err());
    }

    #[test]
    fn replace_inner_html_parses_markup() {
        let doc = Document::parse("<p>old <em>text</em></p>");
        let p = first_element(&doc, "p");

        replace_inner_html(doc.dom(), &p, "new <strong>markup</strong>");

        assert_eq!(doc.body_html().unwrap(), "<p>new <strong>markup</strong></p>");
    }

    #[test]
    fn has_class_matches_whole_tokens() {
        let doc = Document::parse("<p class=\"a translated-text b\">x</p><p class=\"translated\">y</p>");
        let mut marked = Vec::new();
        walk_elements(&doc.dom().document, &mut |node| {
            if get_node_name(node) == Some("p") {
                marked.push(has_class(node, "translated-text"));
            }
        });
        assert_eq!(marked, vec![true, false]);
    }

    #[test]
    fn text_content_skips_scripts() {
        let doc = Document::parse("<div>Hello <script>var x;</script><b>World</b></div>");
        assert_eq!(text_content(&doc.body().unwrap()), "Hello World");
    }

    #[test]
    fn decode_bytes_honours_charset() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("<p>caf\u{e9}</p>");
        assert_eq!(decode_bytes(&bytes, "windows-1252"), "<p>caf\u{e9}</p>");
        assert_eq!(decode_bytes("<p>é</p>".as_bytes(), "not-a-charset"), "<p>é</p>");
    }
}
