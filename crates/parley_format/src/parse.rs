//! Single-pass tokenizer for the chat dialect.

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// One line of regular text.
    Paragraph(Vec<Inline>),

    /// A fenced code block.
    Code {
        /// The first token of the fence info string, if any.
        language: Option<String>,

        /// The raw code, without the fences.
        code: String,
    },

    /// A run of list items of the same kind.
    List { kind: ListKind, items: Vec<ListItem> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `* item`
    Unordered,

    /// `1. item`
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// The number of an ordered item, exactly as written.
    pub number: Option<String>,
    pub content: Vec<Inline>,
}

/// An inline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Bold(Vec<Inline>),
}

/// Represents the type of fence character used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceType {
    /// \`
    Backtick,

    /// ~
    Tilde,
}

impl FenceType {
    /// Returns the character corresponding to this fence type.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Backtick => '`',
            Self::Tilde => '~',
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    kind: FenceType,
    length: usize,
}

/// Tokenize `input` into blocks.
///
/// Never fails. Unclosed fences run to the end of the input and unmatched
/// inline markers are kept as literal text.
#[must_use]
pub fn parse(input: &str) -> Vec<Block> {
    let mut blocks = vec![];
    let mut lines = input.lines();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((fence, info)) = fenced_code_start(line) {
            if let Some(inner) = strip_closing_fence(info, fence) {
                blocks.push(single_line_code(inner));
                continue;
            }

            let mut body = vec![];
            for line in lines.by_ref() {
                if is_fenced_code_end(line.trim(), fence) {
                    break;
                }

                body.push(line);
            }

            blocks.push(Block::Code {
                language: info.split_whitespace().next().map(str::to_owned),
                code: join_code(&body),
            });

            continue;
        }

        if let Some(content) = unordered_item(line) {
            push_item(&mut blocks, ListKind::Unordered, ListItem {
                number: None,
                content: parse_inline(content),
            });
        } else if let Some((number, content)) = ordered_item(line) {
            push_item(&mut blocks, ListKind::Ordered, ListItem {
                number: Some(number.to_owned()),
                content: parse_inline(content),
            });
        } else {
            blocks.push(Block::Paragraph(parse_inline(line)));
        }
    }

    blocks
}

/// Tokenize a single line of text into inline nodes.
pub(crate) fn parse_inline(text: &str) -> Vec<Inline> {
    let mut nodes = vec![];
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find(['`', '*']) {
        let (before, tail) = rest.split_at(pos);
        literal.push_str(before);

        if let Some(after) = tail.strip_prefix('`') {
            match after.find('`') {
                Some(end) if end > 0 => {
                    flush_text(&mut nodes, &mut literal);
                    nodes.push(Inline::Code(after[..end].trim().to_owned()));
                    rest = &after[end + 1..];
                }
                _ => {
                    literal.push('`');
                    rest = after;
                }
            }
        } else if let Some(after) = tail.strip_prefix("**") {
            match closing_bold(after) {
                Some(end) if !after[..end].trim().is_empty() => {
                    flush_text(&mut nodes, &mut literal);
                    nodes.push(Inline::Bold(parse_inline(after[..end].trim())));
                    rest = &after[end + 2..];
                }
                _ => {
                    literal.push_str("**");
                    rest = after;
                }
            }
        } else {
            literal.push('*');
            rest = &tail[1..];
        }
    }

    literal.push_str(rest);
    flush_text(&mut nodes, &mut literal);
    nodes
}

fn flush_text(nodes: &mut Vec<Inline>, literal: &mut String) {
    if !literal.is_empty() {
        nodes.push(Inline::Text(std::mem::take(literal)));
    }
}

/// Find the `**` closing a bold span, skipping over code spans.
fn closing_bold(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => match s[i + 1..].find('`') {
                Some(end) => i += end + 2,
                None => i += 1,
            },
            b'*' if bytes.get(i + 1) == Some(&b'*') => return Some(i),
            _ => i += 1,
        }
    }

    None
}

/// Checks if a (trimmed) line opens a fenced code block.
///
/// Returns the fence and the remaining info string.
fn fenced_code_start(line: &str) -> Option<(Fence, &str)> {
    let kind = match line.chars().next()? {
        '`' => FenceType::Backtick,
        '~' => FenceType::Tilde,
        _ => return None,
    };

    let length = line.chars().take_while(|&c| c == kind.as_char()).count();
    if length < 3 {
        return None;
    }

    let info = &line[length..];
    let fence = Fence { kind, length };

    // Info string for backticks cannot contain backticks, unless the block
    // is closed on the same line.
    if kind == FenceType::Backtick
        && info.contains('`')
        && strip_closing_fence(info, fence).is_none()
    {
        return None;
    }

    Some((fence, info))
}

fn strip_closing_fence(info: &str, fence: Fence) -> Option<&str> {
    let info = info.trim_end();
    let count = info
        .chars()
        .rev()
        .take_while(|&c| c == fence.kind.as_char())
        .count();

    (count >= 3).then(|| &info[..info.len() - count])
}

fn is_fenced_code_end(line: &str, fence: Fence) -> bool {
    let count = line
        .chars()
        .take_while(|&c| c == fence.kind.as_char())
        .count();

    count >= fence.length && count == line.len()
}

/// A code block opened and closed on one line: `` ```lang code``` ``.
///
/// The first token is only treated as a language label when more code
/// follows it.
fn single_line_code(inner: &str) -> Block {
    let inner = inner.trim();

    match inner.split_once(char::is_whitespace) {
        Some((language, code)) => Block::Code {
            language: Some(language.to_owned()),
            code: code.trim().to_owned(),
        },
        None => Block::Code {
            language: None,
            code: inner.to_owned(),
        },
    }
}

/// Join code lines, dropping blank lines around the code.
fn join_code(lines: &[&str]) -> String {
    let is_blank = |line: &&str| line.trim().is_empty();

    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);

    lines[start..end].join("\n").trim_end().to_owned()
}

fn unordered_item(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('*')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    Some(rest.trim()).filter(|s| !s.is_empty())
}

fn ordered_item(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }

    let (number, rest) = line.split_at(digits);
    let rest = rest.strip_prefix('.')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    Some((number, rest.trim())).filter(|(_, s)| !s.is_empty())
}

fn push_item(blocks: &mut Vec<Block>, kind: ListKind, item: ListItem) {
    if let Some(Block::List { kind: last, items }) = blocks.last_mut() {
        if *last == kind {
            items.push(item);
            return;
        }
    }

    blocks.push(Block::List {
        kind,
        items: vec![item],
    });
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
