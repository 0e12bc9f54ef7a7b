//! Converts the small markdown-like dialect used in chat replies to HTML.
//!
//! The input is tokenized into [`Block`]s and [`Inline`]s in a single linear
//! scan, and rendered with all literal text escaped. Supported syntax:
//!
//! - fenced code blocks, with an optional language label
//! - `inline code`
//! - `**bold**`
//! - unordered (`* item`) and ordered (`1. item`) list items
//! - everything else as one paragraph per line

mod parse;
mod render;

pub use parse::{Block, FenceType, Inline, ListItem, ListKind, parse};
pub use render::{COPY_ATTRIBUTE, COPY_MARKER, to_html};
