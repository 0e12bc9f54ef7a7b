//! HTML rendering of parsed chat text.

use maud::{Markup, Render, html};

use crate::parse::{Block, Inline, ListItem, ListKind, parse};

/// Class marking the copy-to-clipboard control of a code block.
pub const COPY_MARKER: &str = "copy-btn";

/// Attribute on the copy control holding the (escaped) raw code.
pub const COPY_ATTRIBUTE: &str = "data-code";

/// Label prefix shown in front of the code block language.
const LANGUAGE_PREFIX: &str = "\u{27e8} \u{27e9} ";

/// Format chat text as an HTML fragment.
///
/// All text taken from `input` is escaped, so the output is safe to insert
/// into a page even when `input` contains markup.
#[must_use]
pub fn to_html(input: &str) -> String {
    let blocks = parse(input);

    html! {
        @for block in &blocks {
            (block)
        }
    }
    .into_string()
}

impl Render for Block {
    fn render(&self) -> Markup {
        match self {
            Self::Paragraph(content) => html! {
                p { (Inlines(content)) }
            },
            Self::Code { language, code } => html! {
                div.code-block {
                    pre {
                        code {
                            @if let Some(language) = language {
                                span.code-lang { (LANGUAGE_PREFIX) (language) }
                            }
                            (code)
                        }
                    }
                    button class=(COPY_MARKER) type="button" data-code=(code) { "Copy" }
                }
            },
            Self::List {
                kind: ListKind::Unordered,
                items,
            } => html! {
                ul.chat-list {
                    @for item in items { (item) }
                }
            },
            Self::List {
                kind: ListKind::Ordered,
                items,
            } => html! {
                ol.chat-list {
                    @for item in items { (item) }
                }
            },
        }
    }
}

impl Render for ListItem {
    fn render(&self) -> Markup {
        html! {
            li {
                @if let Some(number) = &self.number {
                    strong { (number) "." } " "
                }
                (Inlines(&self.content))
            }
        }
    }
}

impl Render for Inline {
    fn render(&self) -> Markup {
        match self {
            Self::Text(text) => html! { (text) },
            Self::Code(code) => html! { code.inline-code { (code) } },
            Self::Bold(content) => html! { strong { (Inlines(content)) } },
        }
    }
}

struct Inlines<'a>(&'a [Inline]);

impl Render for Inlines<'_> {
    fn render(&self) -> Markup {
        html! {
            @for inline in self.0 {
                (inline)
            }
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
