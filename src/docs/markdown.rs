//! Markdown block splitting
//!
//! A line-oriented splitter, just precise enough for merging: it finds the
//! units a reader would call "one statement" (paragraph, list item, code
//! fence, table, quote) and the heading each one sits under.

use std::sync::LazyLock;

use regex::Regex;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})\s+(.*?)\s*#*\s*$").expect("valid regex literal"));

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(?:[-*+]|\d{1,9}[.)])(?:\s+|$)").expect("valid regex literal"));

static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").expect("valid regex literal")
});

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("valid regex literal"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
    Code,
    Table,
    Quote,
    Rule,
}

/// One block of a markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Source lines of the block, verbatim
    pub text: String,
    /// Title of the nearest heading above the block
    pub heading: Option<String>,
}

impl Block {
    /// Block text without a leading list marker
    pub fn body(&self) -> &str {
        match self.kind {
            BlockKind::ListItem => strip_list_marker(&self.text),
            _ => &self.text,
        }
    }

    /// Blocks that carry content (not headings or rules)
    pub fn is_content(&self) -> bool {
        !matches!(self.kind, BlockKind::Heading | BlockKind::Rule)
    }
}

/// Split a document into blocks.
///
/// Lines listed in `skip_lines` (section markers) are dropped. A heading whose
/// title is in `reset_headings` clears the heading context for what follows.
pub fn parse_blocks(text: &str, skip_lines: &[&str], reset_headings: &[&str]) -> Vec<Block> {
    let mut parser = BlockParser::default();

    for line in text.lines() {
        if parser.in_fence() {
            parser.push_fence_line(line);
            continue;
        }

        if skip_lines.contains(&line.trim()) {
            parser.flush();
            continue;
        }

        if line.trim().is_empty() {
            parser.flush();
            continue;
        }

        if let Some(caps) = FENCE.captures(line) {
            parser.flush();
            parser.open_fence(line, &caps[1]);
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            parser.flush();
            let title = caps[2].to_string();
            parser.blocks.push(Block {
                kind: BlockKind::Heading,
                text: line.to_string(),
                heading: parser.heading.clone(),
            });
            parser.heading = if reset_headings.contains(&title.as_str()) {
                None
            } else {
                Some(title)
            };
            continue;
        }

        if THEMATIC_BREAK.is_match(line) {
            parser.flush();
            parser.blocks.push(Block {
                kind: BlockKind::Rule,
                text: line.to_string(),
                heading: parser.heading.clone(),
            });
            continue;
        }

        if LIST_MARKER.is_match(line) {
            parser.flush();
            parser.start(BlockKind::ListItem, line);
            continue;
        }

        let trimmed = line.trim_start();
        let kind = if trimmed.starts_with('|') {
            BlockKind::Table
        } else if trimmed.starts_with('>') {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        };

        match parser.current_kind() {
            // continuation lines, indented or lazy
            Some(BlockKind::ListItem) => parser.append(line),
            Some(current) if current == kind => parser.append(line),
            _ => {
                parser.flush();
                parser.start(kind, line);
            }
        }
    }

    parser.flush();
    parser.blocks
}

#[derive(Default)]
struct BlockParser {
    blocks: Vec<Block>,
    heading: Option<String>,
    current: Option<(BlockKind, Vec<String>)>,
    fence: Option<String>,
}

impl BlockParser {
    fn in_fence(&self) -> bool {
        self.fence.is_some()
    }

    fn current_kind(&self) -> Option<BlockKind> {
        self.current.as_ref().map(|(kind, _)| *kind)
    }

    fn start(&mut self, kind: BlockKind, line: &str) {
        self.current = Some((kind, vec![line.to_string()]));
    }

    fn append(&mut self, line: &str) {
        if let Some((_, lines)) = self.current.as_mut() {
            lines.push(line.to_string());
        }
    }

    fn open_fence(&mut self, line: &str, marker: &str) {
        self.fence = Some(marker.to_string());
        self.start(BlockKind::Code, line);
    }

    fn push_fence_line(&mut self, line: &str) {
        self.append(line);
        let closes = self.fence.as_deref().is_some_and(|marker| {
            let trimmed = line.trim();
            trimmed.starts_with(marker) && trimmed.trim_start_matches(&marker[..1]).is_empty()
        });
        if closes {
            self.fence = None;
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Some((kind, lines)) = self.current.take() {
            self.blocks.push(Block {
                kind,
                text: lines.join("\n"),
                heading: self.heading.clone(),
            });
        }
        // An unterminated fence ends with the document.
        self.fence = None;
    }
}

/// Remove a leading list marker from the first line
pub fn strip_list_marker(text: &str) -> &str {
    match LIST_MARKER.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Collapse all whitespace runs to single spaces
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a marker-delimited section (markers included).
///
/// A start marker without an end removes everything after it.
pub fn strip_section(text: &str, start: &str, end: &str) -> String {
    let mut kept = Vec::new();
    let mut inside = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if !inside && trimmed == start {
            inside = true;
            continue;
        }
        if inside {
            if trimmed == end {
                inside = false;
            }
            continue;
        }
        kept.push(line);
    }

    kept.join("\n")
}

/// Drop a leading level-one title line
pub fn strip_title(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("# ") {
        match trimmed.find('\n') {
            Some(pos) => trimmed[pos + 1..].trim_start(),
            None => "",
        }
    } else {
        trimmed
    }
}

/// First paragraph of a document, whitespace-collapsed
pub fn first_paragraph(text: &str) -> Option<String> {
    parse_blocks(text, &[], &[])
        .into_iter()
        .find(|b| b.kind == BlockKind::Paragraph)
        .map(|b| normalize(&b.text))
}

/// Truncate to at most `max_chars` characters at a word boundary, marking the
/// cut with an ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    if let Some(pos) = cut.rfind(char::is_whitespace) {
        cut.truncate(pos);
    }
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}
