//! Markdown rendering for extra pages.
//!
//! The Bindery pipeline consumes pre-rendered content; this crate is the
//! thin collaborator that produces it for extra pages (README, guides).
//! It renders GFM markdown to HTML with [`pulldown_cmark`], assigns every
//! heading a slug-derived anchor id, extracts the first H1 as the page
//! title, and returns the level-2 heading list consumed by the navigation
//! index.

use bindery_nodes::{Header, SlugCounter, slugify};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

/// Result of rendering one markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Rendered HTML with anchor ids on every heading.
    pub html: String,
    /// Text of the first H1 heading, if any.
    pub title: Option<String>,
    /// Level-2 headings with non-empty anchors, in document order.
    pub headers: Vec<Header>,
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Render a markdown document to HTML.
///
/// Heading anchors are slugified from the heading text and disambiguated
/// within the document (`section`, `section-2`, …). Headings whose text
/// slugifies to nothing keep no id attribute and are left out of the
/// returned header list.
#[must_use]
pub fn render(markdown: &str) -> RenderedPage {
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, parser_options()).collect();

    let mut title = None;
    let mut headers = Vec::new();
    let mut counter = SlugCounter::new();
    // Anchor for each Start(Heading) event, keyed by event index.
    let mut anchors: Vec<(usize, Option<String>)> = Vec::new();

    let mut heading_start: Option<(usize, u8)> = None;
    let mut heading_text = String::new();

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading_start = Some((index, *level as u8));
                heading_text.clear();
            }
            Event::Text(text) | Event::Code(text) if heading_start.is_some() => {
                heading_text.push_str(text);
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((start_index, level)) = heading_start.take() else {
                    continue;
                };
                let slug = slugify(&heading_text);
                let anchor = if slug.is_empty() {
                    None
                } else {
                    Some(counter.disambiguate(&slug))
                };

                if level == 1 && title.is_none() {
                    title = Some(heading_text.clone());
                }
                if level == 2 && let Some(anchor) = &anchor {
                    headers.push(Header {
                        anchor: anchor.clone(),
                        text: heading_text.clone(),
                    });
                }
                anchors.push((start_index, anchor));
            }
            _ => {}
        }
    }

    // Second pass: splice the computed anchors into the heading start tags.
    let mut anchors = anchors.into_iter().peekable();
    let events = events.into_iter().enumerate().map(|(index, event)| {
        match (anchors.next_if(|(site, _)| *site == index), event) {
            (
                Some((_, anchor)),
                Event::Start(Tag::Heading {
                    level,
                    classes,
                    attrs,
                    ..
                }),
            ) => Event::Start(Tag::Heading {
                level,
                id: anchor.map(CowStr::from),
                classes,
                attrs,
            }),
            (_, event) => event,
        }
    });

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events);

    RenderedPage {
        html: out,
        title,
        headers,
    }
}
