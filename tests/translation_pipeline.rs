//! 翻译管道集成测试
//!
//! 通过模拟翻译服务测试从原始内容到译文 HTML 的完整流程

mod common;

use feedtrans::translation::pipeline::{chunk, run_batched};
use feedtrans::translation::{constants, DisplayMode, TranslateRequest};

use common::{paragraphs, request, service_with, BracketTranslator, DelayedTranslator, FailingTranslator};

#[tokio::test]
async fn translated_mode_replaces_each_paragraph() {
    let service = service_with(BracketTranslator::new());

    let outcome = service
        .translate_html("<p>Hello</p><p>World</p>", &request(DisplayMode::Translated))
        .await;

    assert_eq!(outcome.html, "<p>[Hello]</p><p>[World]</p>");
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn bilingual_mode_interleaves_translations() {
    let service = service_with(BracketTranslator::new());

    let outcome = service
        .translate_html("<p>Hello</p><p>World</p>", &request(DisplayMode::Bilingual))
        .await;

    assert_eq!(
        outcome.html,
        "<p>Hello</p><div class=\"translated-text\">[Hello]</div>\
         <p>World</p><div class=\"translated-text\">[World]</div>"
    );
}

#[tokio::test]
async fn failed_unit_keeps_original_markup() {
    let service = service_with(FailingTranslator::network_error_on("second"));
    let input = paragraphs(&["first", "<b>second</b> unit", "third"]);

    let outcome = service.translate_html(&input, &request(DisplayMode::Translated)).await;

    assert_eq!(outcome.error, None);
    assert_eq!(
        outcome.html,
        "<p>[first]</p><p><b>second</b> unit</p><p>[third]</p>"
    );
    assert_eq!(service.get_stats().snapshot().units_failed, 1);
}

#[tokio::test]
async fn long_paragraph_is_chunked_in_order() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());

    let sentences: Vec<String> = (0..25)
        .map(|i| format!("Sentence {:02} {}.", i, "abcd ".repeat(38).trim_end()))
        .collect();
    let paragraph = sentences.join(" ");
    assert!(paragraph.chars().count() >= 5000);

    let outcome = service
        .translate_html(&format!("<p>{}</p>", paragraph), &request(DisplayMode::Translated))
        .await;

    let calls = translator.calls();
    assert!(calls.len() >= 2);
    assert!(calls
        .iter()
        .all(|c| c.chars().count() <= constants::DEFAULT_MAX_CHUNK_SIZE));
    assert_eq!(calls, chunk(&paragraph, constants::DEFAULT_MAX_CHUNK_SIZE));

    let expected: Vec<String> = calls.iter().map(|c| format!("[{}]", c)).collect();
    assert_eq!(outcome.html, format!("<p>{}</p>", expected.join(" ")));
}

#[tokio::test]
async fn results_keep_document_order_across_windows() {
    // 单元 1 比下一个窗口里的单元 2、3 都慢
    let translator = DelayedTranslator::new(&[("u1", 60)], 5);
    let service = service_with(translator.clone());
    let input = paragraphs(&["u0", "u1", "u2", "u3", "u4"]);

    let outcome = service
        .translate_html(
            &input,
            &TranslateRequest::new("zh")
                .with_mode(DisplayMode::Translated)
                .with_concurrency(2),
        )
        .await;

    assert_eq!(
        outcome.html,
        "<p>[u0]</p><p>[u1]</p><p>[u2]</p><p>[u3]</p><p>[u4]</p>"
    );
    assert!(translator.peak_in_flight() <= 2);

    // 窗口整体完成后才开始下一个窗口
    let order = translator.completion_order();
    let position = |text: &str| order.iter().position(|t| t == text).unwrap();
    assert!(position("u1") < position("u2"));
    assert!(position("u1") < position("u3"));
}

#[tokio::test]
async fn scheduler_indices_ignore_completion_timing() {
    let delays = [40u64, 5, 30, 1, 10];
    let results = run_batched(delays.to_vec(), 2, |index, delay| async move {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        Ok(format!("unit {}", index))
    })
    .await;

    let indices: Vec<usize> = results.iter().map(|r| r.unit_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(results[2].translated_text.as_deref(), Some("unit 2"));
}

#[tokio::test]
async fn bilingual_output_is_not_translated_again() {
    let first = service_with(BracketTranslator::new());
    let input = "<h1>Title</h1><p>Hello</p><ul><li>Item</li></ul>";
    let once = first.translate_html(input, &request(DisplayMode::Bilingual)).await;

    let translator = BracketTranslator::new();
    let second = service_with(translator.clone());
    let twice = second.translate_html(&once.html, &request(DisplayMode::Bilingual)).await;

    assert!(translator.calls().is_empty());
    assert_eq!(twice.html, once.html);
}

#[tokio::test]
async fn bilingual_line_fallback_is_idempotent() {
    let first = service_with(BracketTranslator::new());
    let input = "<span>First line of the feed\nSecond line of the feed</span>";
    let once = first.translate_html(input, &request(DisplayMode::Bilingual)).await;
    assert_eq!(
        once.html,
        format!(
            "{}<div class=\"translated-text\">[First line of the feed]</div>\
             <div class=\"translated-text\">[Second line of the feed]</div>",
            input
        )
    );

    let translator = BracketTranslator::new();
    let second = service_with(translator.clone());
    second.translate_html(&once.html, &request(DisplayMode::Bilingual)).await;
    assert!(translator.calls().is_empty());
}

#[tokio::test]
async fn content_without_units_is_returned_unchanged() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());
    let input = "<div><img src=\"cover.png\"></div>";

    let outcome = service.translate_html(input, &request(DisplayMode::Bilingual)).await;

    assert_eq!(outcome.html, input);
    assert_eq!(outcome.error, None);
    assert!(translator.calls().is_empty());
}

#[tokio::test]
async fn short_plain_text_is_returned_unchanged() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());

    for input in ["", "   ", "short"] {
        let outcome = service.translate_html(input, &request(DisplayMode::Translated)).await;
        assert_eq!(outcome.html, input);
        assert!(outcome.is_ok());
    }
    assert!(translator.calls().is_empty());
}

#[tokio::test]
async fn markdown_content_is_formatted_then_translated() {
    let service = service_with(BracketTranslator::new());
    let images = vec!["https://example.com/cover.png".to_string()];

    let outcome = service
        .translate_content(
            "Weekly **release** notes\nwith a second line",
            &images,
            &request(DisplayMode::Translated),
        )
        .await;

    assert!(outcome
        .html
        .contains("<p>[Weekly <strong>release</strong> notes<br>\nwith a second line]</p>"));
    assert!(outcome.html.contains("src=\"https://example.com/cover.png\""));
}

#[tokio::test]
async fn div_fallback_translates_text_divs() {
    let service = service_with(BracketTranslator::new());
    let input = "<div>An article body written directly in a div.</div><div><img src=\"a.png\"></div>";

    let outcome = service.translate_html(input, &request(DisplayMode::Bilingual)).await;

    assert_eq!(
        outcome.html,
        "<div>An article body written directly in a div.</div>\
         <div class=\"translated-text\">[An article body written directly in a div.]</div>\
         <div><img src=\"a.png\"></div>"
    );
}

#[tokio::test]
async fn coarse_fallback_translates_fixed_slices() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());
    let text = "x".repeat(6000);

    let outcome = service
        .translate_html(&format!("<span>{}</span>", text), &request(DisplayMode::Translated))
        .await;

    let calls = translator.calls();
    assert_eq!(
        calls.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![2500, 2500, 1000]
    );
    assert_eq!(
        outcome.html,
        format!("<p>[{}][{}][{}]</p>", "x".repeat(2500), "x".repeat(2500), "x".repeat(1000))
    );
}

#[tokio::test]
async fn single_block_fallback_keeps_images_and_links() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());
    let input = "<img src=\"cover.png\"><span>A single line summary with a <a href=\"/x\">link</a></span>";

    let bilingual = service.translate_html(input, &request(DisplayMode::Bilingual)).await;
    assert_eq!(
        bilingual.html,
        format!("{}<div class=\"translated-text\">[A single line summary with a link]</div>", input)
    );

    let translated = service.translate_html(input, &request(DisplayMode::Translated)).await;
    assert_eq!(
        translated.html,
        "<img src=\"cover.png\"><p>[A single line summary with a link]</p>"
    );
    assert_eq!(translator.calls().len(), 2);
}

#[tokio::test]
async fn nested_list_translates_parent_text_and_children() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());

    let outcome = service
        .translate_html(
            "<ul><li>Parent item text<ul><li>child</li></ul></li></ul>",
            &request(DisplayMode::Translated),
        )
        .await;

    assert_eq!(translator.calls(), vec!["Parent item text".to_string(), "child".to_string()]);
    assert_eq!(
        outcome.html,
        "<ul><li>[Parent item text]<ul><li>[child]</li></ul></li></ul>"
    );
}

#[tokio::test]
async fn nested_list_bilingual_output_is_stable() {
    let first = service_with(BracketTranslator::new());
    let input = "<ul><li>Parent item text<ul><li>child</li></ul></li></ul>\
                 <table><tr><td>Cell text</td></tr></table>";
    let once = first.translate_html(input, &request(DisplayMode::Bilingual)).await;
    assert_eq!(
        once.html,
        "<ul><li>Parent item text<div class=\"translated-text\">[Parent item text]</div>\
         <ul><li>child</li><li class=\"translated-text\">[child]</li></ul></li></ul>\
         <table><tbody><tr><td>Cell text<div class=\"translated-text\">[Cell text]</div></td></tr></tbody></table>"
    );

    let translator = BracketTranslator::new();
    let second = service_with(translator.clone());
    let twice = second.translate_html(&once.html, &request(DisplayMode::Bilingual)).await;
    assert!(translator.calls().is_empty());
    assert_eq!(twice.html, once.html);
}

#[tokio::test]
async fn auto_translation_only_handles_english_articles() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());
    let request = request(DisplayMode::Translated);

    let chinese = "<p>这是一篇中文文章，讲述了今天发生的事情。</p>";
    assert!(service
        .translate_if_english(chinese, Some("中文标题"), &[], &request)
        .await
        .is_none());
    assert!(translator.calls().is_empty());

    let english = "<p>The release ships a faster parser and better error messages.</p>";
    let auto = service
        .translate_if_english(english, Some("Release notes"), &[], &request)
        .await
        .expect("english content is translated");
    assert_eq!(
        auto.outcome.html,
        "<p>[The release ships a faster parser and better error messages.]</p>"
    );
    assert_eq!(auto.title.as_deref(), Some("[Release notes]"));
}

#[tokio::test]
async fn skipped_regions_are_left_alone() {
    let translator = BracketTranslator::new();
    let service = service_with(translator.clone());
    let input = "<p>Run this:</p><pre><code>cargo run</code></pre><script>var p = 1;</script>";

    let outcome = service.translate_html(input, &request(DisplayMode::Translated)).await;

    assert_eq!(translator.calls(), vec!["Run this:".to_string()]);
    assert_eq!(
        outcome.html,
        "<p>[Run this:]</p><pre><code>cargo run</code></pre><script>var p = 1;</script>"
    );
}
