//! Structure extraction from a Markdown body.
//!
//! One pass over the `pulldown-cmark` event stream collects headings, images,
//! links and the first paragraph. Offsets refer to byte positions in the
//! Markdown source.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::ops::Range;
use url::Url;

use crate::markdown::{parser_options, slugify, to_plain_text, truncate_words};
use crate::model::{
    ContentHeading, ContentImage, ExternalLink, ImagePosition, LinkIntent, LinkOpportunity,
    LinkPosition,
};

/// Everything pulled out of one body.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub headings: Vec<ContentHeading>,
    pub images: Vec<ContentImage>,
    pub internal_links: Vec<LinkOpportunity>,
    pub external_links: Vec<ExternalLink>,
    /// Plain text of the first paragraph, if the body has one.
    pub first_paragraph: Option<String>,
}

/// Settings the extractor needs from the scoring policy.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub link_relevance: f64,
    pub context_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            link_relevance: 0.8,
            context_chars: 200,
        }
    }
}

struct PendingLink {
    url: String,
    anchor: String,
    offset: usize,
}

struct PendingImage {
    url: String,
    title: String,
    alt: String,
}

/// Returns true for absolute web URLs, the only links treated as external.
pub fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Host part of an absolute URL, without a leading `www.`.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

#[allow(clippy::too_many_lines)]
pub fn extract(markdown: &str, options: ExtractOptions) -> Extracted {
    let mut out = Extracted::default();

    // Heading currently being read, and the body text of the open section.
    let mut heading: Option<(u8, String)> = None;
    let mut section_text = String::new();

    let mut image: Option<PendingImage> = None;
    let mut link: Option<PendingLink> = None;

    // Source ranges of the enclosing text blocks, innermost last.
    let mut blocks: Vec<Range<usize>> = Vec::new();
    let mut paragraphs_done = 0usize;

    let flush_section = |out: &mut Extracted, text: &mut String| {
        if let Some(last) = out.headings.last_mut() {
            last.word_count = text.split_whitespace().count();
        }
        text.clear();
    };

    for (event, range) in Parser::new_ext(markdown, parser_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush_section(&mut out, &mut section_text);
                heading = Some((level as u8, String::new()));
                blocks.push(range);
            }
            Event::End(TagEnd::Heading(_)) => {
                blocks.pop();
                if let Some((level, text)) = heading.take() {
                    let text = text.trim().to_string();
                    out.headings.push(ContentHeading {
                        level,
                        id: slugify(&text),
                        text,
                        word_count: 0,
                        subsections: Vec::new(),
                    });
                }
            }
            Event::Start(Tag::Paragraph | Tag::Item | Tag::TableCell) => {
                blocks.push(range);
            }
            Event::End(TagEnd::Paragraph) => {
                if let Some(block) = blocks.pop() {
                    if out.first_paragraph.is_none() {
                        let text = to_plain_text(&markdown[block]);
                        if !text.is_empty() {
                            out.first_paragraph = Some(text);
                        }
                    }
                }
                paragraphs_done += 1;
                section_text.push(' ');
            }
            Event::End(TagEnd::Item | TagEnd::TableCell) => {
                blocks.pop();
                section_text.push(' ');
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                image = Some(PendingImage {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::End(TagEnd::Image) => {
                if let Some(pending) = image.take() {
                    out.images.push(ContentImage {
                        url: pending.url,
                        alt_text: pending.alt.trim().to_string(),
                        caption: Some(pending.title).filter(|t| !t.trim().is_empty()),
                        position: ImagePosition {
                            paragraph_index: paragraphs_done,
                            ..Default::default()
                        },
                        optimization: Default::default(),
                    });
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some(PendingLink {
                    url: dest_url.to_string(),
                    anchor: String::new(),
                    offset: range.start,
                });
            }
            Event::End(TagEnd::Link) => {
                if let Some(pending) = link.take() {
                    let block = blocks.last().cloned().unwrap_or(0..markdown.len());
                    push_link(
                        &mut out,
                        markdown,
                        &block,
                        pending,
                        paragraphs_done,
                        options,
                    );
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(pending) = image.as_mut() {
                    pending.alt.push_str(&text);
                    continue;
                }
                if let Some(pending) = link.as_mut() {
                    pending.anchor.push_str(&text);
                }
                if let Some((_, heading_text)) = heading.as_mut() {
                    heading_text.push_str(&text);
                } else {
                    section_text.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if heading.is_none() {
                    section_text.push(' ');
                }
            }
            Event::End(TagEnd::CodeBlock) => section_text.push(' '),
            _ => {}
        }
    }

    flush_section(&mut out, &mut section_text);
    out
}

fn push_link(
    out: &mut Extracted,
    markdown: &str,
    block: &Range<usize>,
    pending: PendingLink,
    paragraph: usize,
    options: ExtractOptions,
) {
    let context = truncate_words(&to_plain_text(&markdown[block.clone()]), options.context_chars);
    let before = markdown
        .get(block.start..pending.offset.max(block.start))
        .unwrap_or_default();
    let position = LinkPosition {
        paragraph,
        sentence: sentence_index(before),
        character: pending.offset,
    };
    let anchor_text = pending.anchor.trim().to_string();

    if is_external(&pending.url) {
        out.external_links.push(ExternalLink {
            anchor_text,
            domain: domain_of(&pending.url),
            url: pending.url,
            relevance_score: options.link_relevance,
            position,
            context,
            intent: LinkIntent::Informational,
            nofollow: false,
        });
    } else {
        out.internal_links.push(LinkOpportunity {
            anchor_text,
            target_url: pending.url,
            relevance_score: options.link_relevance,
            position,
            context,
            intent: LinkIntent::Navigational,
        });
    }
}

/// Number of sentence ends in `text`.
fn sentence_index(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .windows(2)
        .filter(|w| matches!(w[0], '.' | '!' | '?') && w[1].is_whitespace())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_with_section_word_counts() {
        let md = "# Intro\nHello world with keyword.\n\n## Details\n\nOne two three.\n\nFour.\n";
        let out = extract(md, ExtractOptions::default());

        assert_eq!(out.headings.len(), 2);
        assert_eq!(out.headings[0].level, 1);
        assert_eq!(out.headings[0].text, "Intro");
        assert_eq!(out.headings[0].id, "intro");
        assert_eq!(out.headings[0].word_count, 4);
        assert_eq!(out.headings[1].level, 2);
        assert_eq!(out.headings[1].word_count, 4);
    }

    #[test]
    fn test_setext_heading_recognised() {
        let out = extract("Title\n=====\n\nBody.\n", ExtractOptions::default());
        assert_eq!(out.headings.len(), 1);
        assert_eq!(out.headings[0].level, 1);
        assert_eq!(out.headings[0].text, "Title");
    }

    #[test]
    fn test_images_are_not_links() {
        let md = "First paragraph.\n\n![A cat](https://cdn.example.com/cat.png \"Our cat\")\n";
        let out = extract(md, ExtractOptions::default());

        assert!(out.external_links.is_empty());
        assert_eq!(out.images.len(), 1);
        let image = &out.images[0];
        assert_eq!(image.alt_text, "A cat");
        assert_eq!(image.caption.as_deref(), Some("Our cat"));
        assert_eq!(image.position.paragraph_index, 1);
        assert!(image.optimization.lazy_load);
    }

    #[test]
    fn test_links_split_internal_and_external() {
        let md = "Read [the docs](/docs/start). Then see [Rust](https://www.rust-lang.org/learn).\n";
        let out = extract(md, ExtractOptions::default());

        assert_eq!(out.internal_links.len(), 1);
        let internal = &out.internal_links[0];
        assert_eq!(internal.anchor_text, "the docs");
        assert_eq!(internal.target_url, "/docs/start");
        assert_eq!(internal.intent, LinkIntent::Navigational);
        assert_eq!(internal.position.sentence, 0);
        assert!((internal.relevance_score - 0.8).abs() < f64::EPSILON);

        assert_eq!(out.external_links.len(), 1);
        let external = &out.external_links[0];
        assert_eq!(external.domain, "rust-lang.org");
        assert_eq!(external.intent, LinkIntent::Informational);
        assert_eq!(external.position.sentence, 1);
        assert_eq!(external.context, "Read the docs. Then see Rust.");
    }

    #[test]
    fn test_first_paragraph_skips_headings() {
        let out = extract("# Title\n\nThe *first* one.\n\nSecond.", ExtractOptions::default());
        assert_eq!(out.first_paragraph.as_deref(), Some("The first one."));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.example.com/a"), "example.com");
        assert_eq!(domain_of("not a url"), "");
    }
}
