//! 纯文本/Markdown 内容格式化
//!
//! 把非 HTML 的订阅内容渲染成 HTML，之后与 HTML 输入走同一条管道。

use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};

/// 把 Markdown 渲染成 HTML
///
/// 单个换行渲染为 `<br />`，订阅摘要里的换行通常就是作者想要的换行。
/// `images` 中尚未出现在文本里的图片地址追加为独立段落。
pub fn format_markdown(text: &str, images: &[String]) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        event => event,
    });

    let missing_images = images
        .iter()
        .map(|image| image.trim())
        .filter(|image| !image.is_empty() && !text.contains(*image))
        .flat_map(image_paragraph);

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser.chain(missing_images));
    output
}

fn image_paragraph(url: &str) -> [Event<'_>; 4] {
    [
        Event::Start(Tag::Paragraph),
        Event::Start(Tag::Image {
            link_type: LinkType::Inline,
            dest_url: CowStr::Borrowed(url),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }),
        Event::End(TagEnd::Image),
        Event::End(TagEnd::Paragraph),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_and_line_breaks() {
        let html = format_markdown("First line\nsecond line\n\nNext paragraph", &[]);
        assert_eq!(
            html,
            "<p>First line<br />\nsecond line</p>\n<p>Next paragraph</p>\n"
        );
    }

    #[test]
    fn inline_markup() {
        let html = format_markdown("Some **bold** and `code`", &[]);
        assert_eq!(html, "<p>Some <strong>bold</strong> and <code>code</code></p>\n");
    }

    #[test]
    fn image_urls_are_escaped() {
        let html = format_markdown("Caption text", &["https://example.com/a.png?q=\"x\"".to_string()]);
        assert!(html.contains("<img src=\"https://example.com/a.png?q=%22x%22\" alt=\"\" />"));
    }

    #[test]
    fn appends_missing_images_only() {
        let images = vec![
            "https://example.com/a.png".to_string(),
            "https://example.com/b.png?x=1&y=2".to_string(),
        ];
        let html = format_markdown("See https://example.com/a.png for details", &images);

        assert_eq!(html.matches("<img").count(), 1);
        assert!(html.ends_with("<p><img src=\"https://example.com/b.png?x=1&amp;y=2\" alt=\"\" /></p>\n"));
    }
}
