//! Markdown and HTML conversion.
//!
//! Markdown is parsed with `pulldown-cmark` and HTML with `scraper`, so nested
//! lists, code blocks and tables survive in both directions. The HTML to
//! Markdown direction is still lossy: attributes other than `href`, `src`,
//! `alt` and the code language are dropped.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Parser extensions enabled everywhere in this crate.
#[must_use]
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Render Markdown to HTML.
#[must_use]
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, parser_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Kind of a top-level block, as needed by block-based editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    List { ordered: bool },
    Image,
    Code,
    Quote,
    Table,
    Separator,
    Html,
}

/// A top-level block rendered to HTML on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlBlock {
    pub kind: BlockKind,
    pub html: String,
}

/// Render Markdown to HTML one top-level block at a time.
///
/// A paragraph that contains nothing but a single image is reported as
/// [`BlockKind::Image`].
#[must_use]
pub fn html_blocks(markdown: &str) -> Vec<HtmlBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<Event<'_>> = Vec::new();
    let mut kind = BlockKind::Html;
    let mut depth = 0usize;

    for event in Parser::new_ext(markdown, parser_options()) {
        if depth == 0 {
            if let Event::Start(tag) = &event {
                kind = block_kind(tag);
            }
        }

        match event {
            Event::Start(_) => {
                depth += 1;
                current.push(event);
            }
            Event::End(_) => {
                current.push(event);
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    blocks.push(render_block(kind, std::mem::take(&mut current)));
                }
            }
            Event::Rule if depth == 0 => blocks.push(HtmlBlock {
                kind: BlockKind::Separator,
                html: "<hr />\n".to_string(),
            }),
            other if depth == 0 => {
                blocks.push(render_block(BlockKind::Html, vec![other]));
            }
            other => current.push(other),
        }
    }

    if !current.is_empty() {
        blocks.push(render_block(kind, current));
    }

    blocks
}

fn block_kind(tag: &Tag<'_>) -> BlockKind {
    match tag {
        Tag::Paragraph => BlockKind::Paragraph,
        Tag::Heading { level, .. } => BlockKind::Heading(*level as u8),
        Tag::List(start) => BlockKind::List {
            ordered: start.is_some(),
        },
        Tag::CodeBlock(_) => BlockKind::Code,
        Tag::BlockQuote(_) => BlockKind::Quote,
        Tag::Table(_) => BlockKind::Table,
        _ => BlockKind::Html,
    }
}

fn render_block(kind: BlockKind, events: Vec<Event<'_>>) -> HtmlBlock {
    let kind = if kind == BlockKind::Paragraph && is_lone_image(&events) {
        BlockKind::Image
    } else {
        kind
    };

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    HtmlBlock { kind, html: out }
}

/// `Start(Paragraph), Start(Image), .., End(Image), End(Paragraph)` with a
/// single image and no text around it.
fn is_lone_image(events: &[Event<'_>]) -> bool {
    let inner = match events {
        [_, inner @ .., _] => inner,
        _ => return false,
    };
    let starts_image = matches!(inner.first(), Some(Event::Start(Tag::Image { .. })));
    let ends_image = matches!(inner.last(), Some(Event::End(TagEnd::Image)));
    let image_count = inner
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::Image { .. })))
        .count();
    starts_image && ends_image && image_count == 1
}

/// Number of paragraphs, counted the same way link and image positions are.
#[must_use]
pub fn paragraph_count(markdown: &str) -> usize {
    Parser::new_ext(markdown, parser_options())
        .filter(|e| matches!(e, Event::End(TagEnd::Paragraph)))
        .count()
}

/// Strip all Markdown formatting, leaving the readable text.
///
/// Block boundaries become blank lines; fenced and indented code blocks are
/// dropped, inline code is kept.
#[must_use]
pub fn to_plain_text(markdown: &str) -> String {
    let mut out = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown, parser_options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) | Event::Code(text) if !in_code_block => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak if !in_code_block => out.push(' '),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::TableRow,
            ) => out.push_str("\n\n"),
            Event::End(TagEnd::TableCell) => out.push(' '),
            _ => {}
        }
    }

    EXCESS_NEWLINES.replace_all(out.trim(), "\n\n").into_owned()
}

/// Convert an HTML fragment back to Markdown.
///
/// HTML comments (including editor block markers) are ignored.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let raw = render_children(fragment.root_element(), 0);

    let trimmed_lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let joined = trimmed_lines.join("\n");
    EXCESS_NEWLINES
        .replace_all(joined.trim(), "\n\n")
        .into_owned()
}

fn render_children(element: ElementRef<'_>, depth: usize) -> String {
    let mut out = String::new();
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            out.push_str(&render_element(child_element, depth));
        } else if let Node::Text(text) = child.value() {
            let collapsed = WHITESPACE_RUN.replace_all(text, " ");
            if collapsed == " " && (out.is_empty() || out.ends_with('\n')) {
                continue;
            }
            out.push_str(&collapsed);
        }
    }
    out
}

fn render_element(element: ElementRef<'_>, depth: usize) -> String {
    let name = element.value().name();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level: usize = name[1..].parse().unwrap_or(1);
            let text = render_children(element, depth);
            format!("\n\n{} {}\n\n", "#".repeat(level), text.trim())
        }
        "p" => format!("\n\n{}\n\n", render_children(element, depth).trim()),
        "strong" | "b" => wrap_inline(element, depth, "**"),
        "em" | "i" => wrap_inline(element, depth, "*"),
        "del" | "s" | "strike" => wrap_inline(element, depth, "~~"),
        "code" => format!("`{}`", element.text().collect::<String>()),
        "pre" => render_pre(element),
        "a" => {
            let text = render_children(element, depth);
            match element.value().attr("href") {
                Some(href) if !href.is_empty() => format!("[{}]({href})", text.trim()),
                _ => text,
            }
        }
        "img" => {
            let alt = element.value().attr("alt").unwrap_or_default();
            let src = element.value().attr("src").unwrap_or_default();
            format!("![{alt}]({src})")
        }
        "br" => "\n".to_string(),
        "hr" => "\n\n---\n\n".to_string(),
        "ul" => render_list(element, depth, false),
        "ol" => render_list(element, depth, true),
        "blockquote" => {
            let inner = render_children(element, depth);
            let quoted: Vec<String> = inner
                .trim()
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect();
            format!("\n\n{}\n\n", quoted.join("\n"))
        }
        "table" => render_table(element),
        "script" | "style" | "head" => String::new(),
        _ => render_children(element, depth),
    }
}

fn wrap_inline(element: ElementRef<'_>, depth: usize, marker: &str) -> String {
    let text = render_children(element, depth);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{marker}{trimmed}{marker}")
    }
}

fn render_pre(element: ElementRef<'_>) -> String {
    let language = element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code")
        .and_then(|code| code.value().attr("class"))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
        })
        .unwrap_or_default()
        .to_string();
    let code: String = element.text().collect();
    format!("\n\n```{language}\n{}\n```\n\n", code.trim_end_matches('\n'))
}

fn render_list(element: ElementRef<'_>, depth: usize, ordered: bool) -> String {
    let indent = "  ".repeat(depth);
    let mut out = String::from(if depth == 0 { "\n\n" } else { "\n" });
    let mut index = 1usize;

    for item in element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
    {
        let marker = if ordered {
            format!("{index}.")
        } else {
            "-".to_string()
        };
        index += 1;

        let body = render_children(item, depth + 1);
        let mut lines = body.lines().filter(|line| !line.trim().is_empty());

        let first = lines.next().map(str::trim).unwrap_or_default();
        out.push_str(&format!("{indent}{marker} {first}\n"));
        for line in lines {
            if line.starts_with(' ') {
                out.push_str(line);
            } else {
                out.push_str(&format!("{indent}  {line}"));
            }
            out.push('\n');
        }
    }

    if depth == 0 {
        out.push('\n');
    }
    out
}

fn render_table(element: ElementRef<'_>) -> String {
    let rows: Vec<Vec<String>> = element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                .map(|cell| render_children(cell, 0).trim().replace('|', "\\|"))
                .collect()
        })
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    let Some(header) = rows.first() else {
        return String::new();
    };

    let mut out = String::from("\n\n");
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!(
        "|{}|\n",
        header.iter().map(|_| " --- ").collect::<Vec<_>>().join("|")
    ));
    for row in rows.iter().skip(1) {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out.push('\n');
    out
}

/// Lower-case, dash-separated identifier for URLs and heading anchors.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Truncate to at most `max_chars` characters, preferring a word boundary and
/// appending an ellipsis when anything was cut.
#[must_use]
pub fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars - 1;
    let cut: String = text.chars().take(budget).collect();
    let ends_on_boundary = text.chars().nth(budget).is_some_and(char::is_whitespace);
    let at_word = match cut.rfind(char::is_whitespace) {
        _ if ends_on_boundary => cut.as_str(),
        Some(idx) if idx > budget / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", at_word.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_html_renders_nested_lists_and_code() {
        let md = "- one\n  - nested\n- two\n\n```rust\nfn main() {}\n```\n";
        let html = to_html(md);
        assert!(html.contains("<ul>\n<li>one\n<ul>\n<li>nested</li>"));
        assert!(html.contains("<pre><code class=\"language-rust\">fn main() {}"));
    }

    #[test]
    fn test_html_blocks_kinds() {
        let md = "# Title\n\nIntro text.\n\n![cat](cat.png)\n\n1. a\n2. b\n\n---\n\n> quoted\n";
        let kinds: Vec<BlockKind> = html_blocks(md).into_iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading(1),
                BlockKind::Paragraph,
                BlockKind::Image,
                BlockKind::List { ordered: true },
                BlockKind::Separator,
                BlockKind::Quote,
            ]
        );
    }

    #[test]
    fn test_paragraph_count_includes_list_items() {
        assert_eq!(paragraph_count("One.\n\nTwo.\n\n- item\n\n- loose item\n"), 4);
        assert_eq!(paragraph_count("# Only a heading"), 0);
    }

    #[test]
    fn test_image_with_text_stays_paragraph() {
        let blocks = html_blocks("See ![cat](cat.png) here.");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_plain_text_strips_formatting_and_code() {
        let md = "# Title\n\nSome **bold** and *italic* `code`.\n\n```\nhidden\n```\n";
        let text = to_plain_text(md);
        assert_eq!(text, "Title\n\nSome bold and italic code.");
    }

    #[test]
    fn test_html_to_markdown_basic_structure() {
        let html = "<!-- wp:heading --><h2>Intro</h2><!-- /wp:heading -->\
                    <p>Read <a href=\"https://example.com\">this <strong>guide</strong></a>.</p>\
                    <p><img src=\"a.png\" alt=\"A\"></p>";
        let md = html_to_markdown(html);
        assert_eq!(
            md,
            "## Intro\n\nRead [this **guide**](https://example.com).\n\n![A](a.png)"
        );
    }

    #[test]
    fn test_html_to_markdown_nested_list() {
        let html = "<ul><li>one<ul><li>nested</li></ul></li><li>two</li></ul><ol><li>first</li><li>second</li></ol>";
        let md = html_to_markdown(html);
        assert_eq!(md, "- one\n  - nested\n- two\n\n1. first\n2. second");
    }

    #[test]
    fn test_html_to_markdown_code_block() {
        let html = "<pre><code class=\"language-rust\">let x = 1;\n</code></pre>";
        assert_eq!(html_to_markdown(html), "```rust\nlet x = 1;\n```");
    }

    #[test]
    fn test_markdown_survives_round_trip() {
        let md = "## Setup\n\nInstall the *CLI* first.\n\n- step one\n- step two\n\n> note";
        assert_eq!(html_to_markdown(&to_html(md)), md);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust & Tokio 101 "), "rust-tokio-101");
        assert_eq!(slugify("Ünïcode Title"), "ünïcode-title");
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("short", 10), "short");
        assert_eq!(
            truncate_words("the quick brown fox jumps", 16),
            "the quick brown…"
        );
        assert_eq!(truncate_words("anything", 0), "");
        assert_eq!(truncate_words("", 0), "");
        assert_eq!(truncate_words("two words", 1), "…");
    }
}
