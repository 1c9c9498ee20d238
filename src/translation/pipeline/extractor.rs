//! 翻译单元抽取
//!
//! 按文档顺序找出可翻译的块级元素。块元素里嵌套了别的块时，外层块自己的文本
//! 按嵌套块切成若干段，每段单独成为一个单元。主扫描什么都没找到时依次尝试回退策略：
//!
//! 1. 直接包含较长文本的 `div`
//! 2. 按行重建为多个段落
//! 3. 超长单块，按固定长度切片翻译
//! 4. 整个 body 作为一个单元
//!
//! 回退 2~4 在一棵游离的节点树上重建段落，原 body 不动，由重组阶段决定怎么写回。
//! 文档里已有译文节点时跳过这几步。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::dom::{
    append_child, append_text, create_html_element, direct_text_children, get_node_name,
    has_ancestor, has_class, next_element_sibling, text_content, walk_elements,
};
use crate::parsers::html::{serialize_children, serialize_nodes, Document};
use crate::translation::config::constants;
use crate::translation::error::TranslationResult;

/// 单元的切分方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// 整体一次请求
    Whole,
    /// 超过单次请求上限，交给切分器按边界切块
    Chunked,
    /// 按固定字符数切片，顺序翻译后直接拼接
    FixedSlices(usize),
}

/// 单元在文档中对应的位置
#[derive(Debug, Clone)]
pub enum UnitTarget {
    /// 整个块级元素
    Element(Handle),
    /// 外层块元素里夹在嵌套块之间的一段连续节点，非空
    Run(Vec<Handle>),
    /// 回退策略重建的段落。`root` 是持有全部重建段落的游离 `div`，
    /// 子节点只保存到它的弱引用，所以由单元持有
    Rebuilt { paragraph: Handle, root: Handle },
}

/// 一个翻译单元
#[derive(Debug, Clone)]
pub struct TranslatableUnit {
    /// 文档顺序中的位置，从 0 开始连续编号
    pub sequence_index: usize,
    /// 单元原始的标记，抽取后不再修改
    pub source_markup: String,
    pub target: UnitTarget,
    pub split: SplitStrategy,
}

impl TranslatableUnit {
    pub fn is_chunked(&self) -> bool {
        !matches!(self.split, SplitStrategy::Whole)
    }
}

/// 抽取参数
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_chunk_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: constants::DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// 从文档中抽取翻译单元
pub fn extract(doc: &Document, options: &ExtractOptions) -> TranslationResult<Vec<TranslatableUnit>> {
    let body = doc.body()?;

    let blocks = collect_targets(&body, &|node: &Handle| {
        get_node_name(node).map_or(false, |name| constants::BLOCK_TAGS.contains(&name))
    });
    let units = build_units(blocks, options)?;
    if !units.is_empty() {
        tracing::debug!("主扫描找到 {} 个翻译单元", units.len());
        return Ok(units);
    }

    // 回退 1：直接包含较长文本的 div
    let divs = collect_targets(&body, &|node: &Handle| {
        get_node_name(node) == Some("div")
            && direct_text_children(node)
                .iter()
                .any(|text| text.trim().chars().count() > constants::DIV_FALLBACK_MIN_TEXT)
    });
    let units = build_units(divs, options)?;
    if !units.is_empty() {
        tracing::debug!("回退到 div 扫描，找到 {} 个翻译单元", units.len());
        return Ok(units);
    }

    if contains_translated_marker(&body) {
        tracing::debug!("文档已包含译文节点，跳过按文本重建的回退策略");
        return Ok(Vec::new());
    }

    let text = text_content(&body);
    let trimmed = text.trim();

    // 回退 2：按行重建段落
    let long_lines = trimmed
        .lines()
        .filter(|line| line.trim().chars().count() > constants::LINE_FALLBACK_MIN_LINE)
        .count();
    if long_lines >= 2 {
        let units = rebuild_as_lines(doc, trimmed, options)?;
        tracing::debug!("回退到按行拆分，找到 {} 个翻译单元", units.len());
        return Ok(units);
    }

    let length = trimmed.chars().count();

    // 回退 3：超长单块按固定长度切片
    if length > constants::COARSE_FALLBACK_THRESHOLD {
        tracing::debug!("回退到整块切片翻译，共 {} 个字符", length);
        let unit = rebuild_as_single(doc, trimmed, SplitStrategy::FixedSlices(constants::COARSE_SLICE_SIZE))?;
        return Ok(vec![unit]);
    }

    // 回退 4：整个 body 作为一个单元
    if length >= constants::MIN_FALLBACK_TEXT {
        tracing::debug!("回退到整体翻译，共 {} 个字符", length);
        let unit = rebuild_as_single(doc, trimmed, split_for(trimmed, options))?;
        return Ok(vec![unit]);
    }

    tracing::debug!("没有可翻译的内容");
    Ok(Vec::new())
}

fn collect_targets(body: &Handle, is_block: &dyn Fn(&Handle) -> bool) -> Vec<UnitTarget> {
    let mut collector = TargetCollector {
        is_block,
        targets: Vec::new(),
    };
    collector.visit_children(body);
    collector.targets
}

/// 按文档顺序收集单元位置
struct TargetCollector<'a> {
    is_block: &'a dyn Fn(&Handle) -> bool,
    targets: Vec<UnitTarget>,
}

impl TargetCollector<'_> {
    fn visit_children(&mut self, node: &Handle) {
        for child in node.children.borrow().iter() {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: &Handle) {
        if !matches!(node.data, NodeData::Element { .. }) {
            return;
        }

        if !self.is_candidate(node) {
            self.visit_children(node);
        } else if self.has_nested_block(node) {
            self.split_runs(node);
        } else {
            self.targets.push(UnitTarget::Element(node.clone()));
        }
    }

    fn is_candidate(&self, node: &Handle) -> bool {
        (self.is_block)(node) && !should_skip(node)
    }

    fn has_nested_block(&self, node: &Handle) -> bool {
        node.children
            .borrow()
            .iter()
            .any(|child| self.is_or_contains_block(child))
    }

    fn is_or_contains_block(&self, node: &Handle) -> bool {
        matches!(node.data, NodeData::Element { .. })
            && (has_class(node, constants::TRANSLATED_CLASS)
                || self.is_candidate(node)
                || self.has_nested_block(node))
    }

    /// 外层块的子节点按嵌套块切段，嵌套块照常访问
    fn split_runs(&mut self, block: &Handle) {
        let mut run: Vec<Handle> = Vec::new();

        for child in block.children.borrow().iter() {
            if has_class(child, constants::TRANSLATED_CLASS) {
                // 这一段已经带着上一次的译文
                run.clear();
            } else if self.is_or_contains_block(child) {
                self.flush(&mut run);
                self.visit(child);
            } else {
                run.push(child.clone());
            }
        }

        self.flush(&mut run);
    }

    fn flush(&mut self, run: &mut Vec<Handle>) {
        let nodes = std::mem::take(run);
        if nodes.iter().any(|node| !text_content(node).trim().is_empty()) {
            self.targets.push(UnitTarget::Run(nodes));
        }
    }
}

fn should_skip(node: &Handle) -> bool {
    if has_class(node, constants::TRANSLATED_CLASS) {
        return true;
    }

    let inside_skipped = has_ancestor(node, |ancestor| {
        has_class(ancestor, constants::TRANSLATED_CLASS)
            || get_node_name(ancestor).map_or(false, |name| constants::SKIP_ELEMENTS.contains(&name))
    });
    if inside_skipped {
        return true;
    }

    // 上一次双语翻译留下的译文紧跟在原文之后
    next_element_sibling(node).map_or(false, |sibling| has_class(&sibling, constants::TRANSLATED_CLASS))
}

fn contains_translated_marker(body: &Handle) -> bool {
    let mut found = false;
    walk_elements(body, &mut |node| {
        if !found && has_class(node, constants::TRANSLATED_CLASS) {
            found = true;
        }
    });
    found
}

fn split_for(markup: &str, options: &ExtractOptions) -> SplitStrategy {
    if markup.chars().count() > options.max_chunk_size {
        SplitStrategy::Chunked
    } else {
        SplitStrategy::Whole
    }
}

fn build_units(targets: Vec<UnitTarget>, options: &ExtractOptions) -> TranslationResult<Vec<TranslatableUnit>> {
    let mut units = Vec::with_capacity(targets.len());

    for target in targets {
        let markup = match &target {
            UnitTarget::Run(nodes) => serialize_nodes(nodes)?,
            UnitTarget::Element(node) | UnitTarget::Rebuilt { paragraph: node, .. } => serialize_children(node)?,
        };
        if markup.trim().is_empty() {
            continue;
        }

        units.push(TranslatableUnit {
            sequence_index: units.len(),
            split: split_for(&markup, options),
            source_markup: markup,
            target,
        });
    }

    Ok(units)
}

/// 每个非空行重建为一个段落，较长的行成为翻译单元
fn rebuild_as_lines(doc: &Document, text: &str, options: &ExtractOptions) -> TranslationResult<Vec<TranslatableUnit>> {
    let dom = doc.dom();
    let root = create_html_element(dom, "div", &[]);

    let mut targets = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let paragraph = create_html_element(dom, "p", &[]);
        append_text(dom, &paragraph, line);
        append_child(dom, &root, paragraph.clone());

        if line.chars().count() > constants::LINE_FALLBACK_MIN_LINE {
            targets.push(UnitTarget::Rebuilt {
                paragraph,
                root: root.clone(),
            });
        }
    }

    build_units(targets, options)
}

/// 全部文本放进一个段落，作为唯一的翻译单元
fn rebuild_as_single(doc: &Document, text: &str, split: SplitStrategy) -> TranslationResult<TranslatableUnit> {
    let dom = doc.dom();
    let root = create_html_element(dom, "div", &[]);
    let paragraph = create_html_element(dom, "p", &[]);
    append_text(dom, &paragraph, text);
    append_child(dom, &root, paragraph.clone());

    Ok(TranslatableUnit {
        sequence_index: 0,
        source_markup: serialize_children(&paragraph)?,
        target: UnitTarget::Rebuilt { paragraph, root },
        split,
    })
}
