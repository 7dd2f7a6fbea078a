//! Snapshot tests for HtmlWriter output.
//!
//! Most cases go through the parser first, since that is how documents
//! normally reach the writer; a few build the document through the format
//! API instead.

use insta::assert_snapshot;

use super::to_html;
use crate::attributes::Attributes;
use crate::document::Document;
use crate::format::TextFormat;
use crate::marker::AlignmentApproach;
use crate::parser::parse;

fn round(html: &str) -> String {
    to_html(&parse(html).expect("parse failed"))
}

#[test]
fn test_paragraphs() {
    assert_snapshot!(round("<p>one</p><p>two</p>"), @"<p>one</p><p>two</p>");
}

#[test]
fn test_nested_inline() {
    assert_snapshot!(round("a <b>bold <i>both</i></b> c"), @"a <b>bold <i>both</i></b> c");
}

#[test]
fn test_misnested_tags_are_split() {
    assert_snapshot!(round("<b>x<i>y</b>z</i>"), @"<b>x<i>y</i></b><i>z</i>");
}

#[test]
fn test_unknown_tags_keep_their_nesting() {
    assert_snapshot!(round("<b><span>x</span></b>"), @"<b><span>x</span></b>");
    assert_snapshot!(round("<span><b>x</b></span>"), @"<span><b>x</b></span>");
    assert_snapshot!(
        round(r#"<a href="/x"><span class="c">x</span></a>"#),
        @r#"<a href="/x"><span class="c">x</span></a>"#
    );
}

#[test]
fn test_strike_aliases_write_del() {
    assert_snapshot!(
        round("<s>a</s> <strike>b</strike> <del>c</del>"),
        @"<del>a</del> <del>b</del> <del>c</del>"
    );
}

#[test]
fn test_hidden_blocks_keep_attributes() {
    assert_snapshot!(
        round(r#"<div class="a"><div class="b">text</div></div>"#),
        @r#"<div class="a"><div class="b">text</div></div>"#
    );
}

#[test]
fn test_unterminated_hidden_block() {
    assert_snapshot!(round("<div>text"), @"<div>text</div>");
}

#[test]
fn test_empty_markup_disappears() {
    assert_snapshot!(round("<b></b>"), @"");
}

#[test]
fn test_objects() {
    assert_snapshot!(
        round(r#"a<img src="x.png" alt="pic">b<!-- note -->"#),
        @r#"a<img src="x.png" alt="pic"/>b<!-- note -->"#
    );
    assert_snapshot!(
        round(r#"<input type="checkbox" checked>"#),
        @r#"<input type="checkbox" checked=""/>"#
    );
}

#[test]
fn test_horizontal_rule_between_text() {
    assert_snapshot!(round("a<hr>b"), @"a<hr/>b");
}

#[test]
fn test_lists() {
    assert_snapshot!(
        round("<ol><li>a</li><li>b</li></ol><ul><li>c</li></ul>"),
        @"<ol><li>a</li><li>b</li></ol><ul><li>c</li></ul>"
    );
}

#[test]
fn test_nested_list() {
    assert_snapshot!(
        round("<ul><li>a<ul><li>b</li></ul></li></ul>"),
        @"<ul><li>a<ul><li>b</li></ul></li></ul>"
    );
}

#[test]
fn test_list_split_by_hidden_close() {
    assert_snapshot!(
        round("<div>a<ul><li>b</div>c</li></ul>"),
        @"<div>a<ul><li>b</li></ul></div><ul><li>c</li></ul>"
    );
}

#[test]
fn test_long_list_shares_one_wrapper() {
    let items: String = (0..500).map(|i| format!("<li>{i}</li>")).collect();
    let html = format!("<ol>{items}</ol>");
    assert_eq!(round(&html), html);
}

#[test]
fn test_line_breaks() {
    assert_snapshot!(round("a<br>b<br><br>c"), @"a<br>b<br><br>c");
}

#[test]
fn test_preformatted_keeps_newlines() {
    assert_snapshot!(round("<pre>x\n  y</pre>"), @r"
    <pre>x
      y</pre>
    ");
}

#[test]
fn test_trailing_break_in_block_is_dropped() {
    assert_snapshot!(round("<p>a<br></p>"), @"<p>a</p>");
    assert_snapshot!(round("<pre>x\n</pre>"), @"<pre>x</pre>");
}

#[test]
fn test_text_escaping() {
    assert_snapshot!(
        round("<p>a &amp; b &lt;c&gt; \"q\"</p>"),
        @r#"<p>a &amp; b &lt;c&gt; "q"</p>"#
    );
}

#[test]
fn test_attribute_escaping() {
    assert_snapshot!(
        round(r#"<a href="/x?a=1&amp;b=2" title="say &quot;hi&quot;">l</a>"#),
        @r#"<a href="/x?a=1&amp;b=2" title="say &quot;hi&quot;">l</a>"#
    );
}

#[test]
fn test_heading_and_paragraph() {
    assert_snapshot!(
        round("<h1>Title</h1>\n<p>body</p>"),
        @"<h1>Title</h1><p>body</p>"
    );
}

#[test]
fn test_block_goes_outside_inline_on_equal_range() {
    assert_snapshot!(round("<b><p>x</p></b>"), @"<p><b>x</b></p>");
}

#[test]
fn test_formatted_document() {
    let mut doc = Document::from_plain_text("hello world");
    doc.apply_format(TextFormat::Bold, 0..5, None).unwrap();
    let href: Attributes = [("href", "https://x.example")].into_iter().collect();
    doc.apply_format(TextFormat::Link, 6..11, Some(href)).unwrap();
    assert_snapshot!(
        to_html(&doc),
        @r#"<b>hello</b> <a href="https://x.example">world</a>"#
    );
}

#[test]
fn test_formatted_list() {
    let mut doc = Document::from_plain_text("one\ntwo");
    doc.apply_format(TextFormat::OrderedList, 0..7, None).unwrap();
    assert_snapshot!(to_html(&doc), @"<ol><li>one</li><li>two</li></ol>");
}

#[test]
fn test_span_level_alignment() {
    let mut doc = Document::from_plain_text("text")
        .with_alignment_approach(AlignmentApproach::SpanLevel);
    doc.apply_format(TextFormat::Paragraph, 0..4, None).unwrap();
    doc.apply_format(TextFormat::AlignCenter, 0..4, None).unwrap();
    assert_snapshot!(to_html(&doc), @r#"<p style="text-align: center;">text</p>"#);
}

#[test]
fn test_edit_then_write() {
    let mut doc = parse("<p>ab</p>").unwrap();
    doc.insert_text(1, "X").unwrap();
    assert_snapshot!(to_html(&doc), @"<p>aXb</p>");
    doc.delete(0..5).unwrap();
    assert_snapshot!(to_html(&doc), @"");
}
