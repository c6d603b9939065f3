//! Merge Engine
//!
//! Combines an existing document, freshly generated text and the immediate
//! child documents into the text that gets written.
//!
//! ## Layout
//!
//! ```text
//! <generated text>
//!
//! <!-- treedoc:retained:start -->
//! ## Retained from previous documentation
//! ### <original heading>
//! <prior blocks missing from the generated text>
//! ### Differing descriptions
//! - *(previous documentation)* `x.py`: old
//! - *(current analysis)* `x.py`: new
//! <!-- treedoc:retained:end -->
//!
//! <!-- treedoc:children:start -->
//! ## Subdirectories
//! - [`child`](child/README.md): excerpt
//! <!-- treedoc:children:end -->
//! ```
//!
//! The children section is derived and rebuilt on every merge. Everything
//! else from the prior document is either already present in the generated
//! text or carried into the retained section, so no prior block is lost.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::ai::{ChildSummary, MergeStrategy};
use crate::constants::{analysis, docs};

use super::markdown::{self, BlockKind};
use super::store::ExistingDocument;

static KEYED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(`[^`\n]+`|\*\*[^*\n]+\*\*|\[[^\]\n]+\]\([^)\n]*\))\s*(?::|-|–|—)\s+(\S.*)$")
        .expect("valid regex literal")
});

static BOLD_COLON_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(\*\*[^*\n]+?:\*\*)\s+(\S.*)$").expect("valid regex literal")
});

const RETAINED_MARKERS: &[&str] = &[docs::RETAINED_START, docs::RETAINED_END];

/// Final document text with merge statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    pub text: String,
    /// Prior blocks carried into the retained section
    pub retained: usize,
    /// Keys described differently by the prior and generated text
    pub conflicts: usize,
}

/// Deterministic, lossless document merge
#[derive(Debug, Clone)]
pub struct MergeEngine {
    file_name: String,
    excerpt_chars: usize,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(docs::FILE_NAME, analysis::EXCERPT_CHARS)
    }
}

impl MergeEngine {
    pub fn new(file_name: impl Into<String>, excerpt_chars: usize) -> Self {
        Self {
            file_name: file_name.into(),
            excerpt_chars,
        }
    }

    pub fn merge(
        &self,
        existing: Option<&ExistingDocument>,
        generated: &str,
        children: &[ChildSummary],
        strategy: MergeStrategy,
    ) -> MergedDocument {
        let generated = strip_children_section(generated);
        let generated = generated.trim();

        let prior = existing
            .filter(|doc| doc.had_prior_content)
            .map(|doc| strip_children_section(&doc.text))
            .filter(|text| !text.trim().is_empty());

        let (body, retained, conflicts) = match (prior, strategy) {
            (None, _) => (generated.to_string(), 0, 0),
            (Some(prior), MergeStrategy::Preserve) => self.preserve(&prior, generated),
            (Some(prior), MergeStrategy::AppendOnly) => (append_only(&prior, generated), 0, 0),
        };

        let mut text = body;
        if let Some(section) = self.children_section(children) {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&section);
        }
        text.push('\n');

        MergedDocument {
            text,
            retained,
            conflicts,
        }
    }

    fn preserve(&self, prior: &str, generated: &str) -> (String, usize, usize) {
        let generated_bodies = content_bodies(generated);
        let generated_keys = keyed_items(generated);

        let blocks = markdown::parse_blocks(prior, RETAINED_MARKERS, &[docs::RETAINED_HEADING]);

        let mut groups = Groups::default();
        let mut conflicts = 0;

        for block in blocks.iter().filter(|b| b.is_content()) {
            let body_norm = markdown::normalize(block.body());
            if body_norm.is_empty() || generated_bodies.contains(&body_norm) {
                continue;
            }

            if block.kind == BlockKind::ListItem
                && let Some((key, description)) = item_key(block.body())
                && let Some(current) = generated_keys.get(&key)
                && markdown::normalize(&description) != markdown::normalize(&current.description)
            {
                let added_previous = groups.push(
                    Some(docs::CONFLICTS_HEADING),
                    attributed(docs::PREVIOUS_LABEL, block.body()),
                );
                groups.push(
                    Some(docs::CONFLICTS_HEADING),
                    attributed(docs::CURRENT_LABEL, &current.body),
                );
                if added_previous {
                    conflicts += 1;
                }
                continue;
            }

            groups.push(block.heading.as_deref(), block.text.clone());
        }

        let retained = groups.block_count();
        let mut text = generated.to_string();
        if let Some(section) = groups.render() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&section);
        }

        (text, retained, conflicts)
    }

    /// The derived reference section for immediate children
    fn children_section(&self, children: &[ChildSummary]) -> Option<String> {
        if children.is_empty() {
            return None;
        }

        let mut lines = vec![
            docs::CHILDREN_START.to_string(),
            format!("## {}", docs::CHILDREN_HEADING),
            String::new(),
        ];

        for child in children {
            let link = format!("- [`{}`]({}/{})", child.name, child.name, self.file_name);
            match markdown::first_paragraph(&child.text) {
                Some(excerpt) if !excerpt.is_empty() => lines.push(format!(
                    "{}: {}",
                    link,
                    markdown::truncate_chars(&excerpt, self.excerpt_chars)
                )),
                _ => lines.push(link),
            }
        }

        lines.push(docs::CHILDREN_END.to_string());
        Some(lines.join("\n"))
    }
}

/// Drop any derived children section
pub fn strip_children_section(text: &str) -> String {
    markdown::strip_section(text, docs::CHILDREN_START, docs::CHILDREN_END)
}

/// Keep the prior text verbatim, append generated blocks it lacks.
fn append_only(prior: &str, generated: &str) -> String {
    let prior = prior.trim_end();
    let mut present = content_bodies(prior);
    let mut headings: HashSet<String> = markdown::parse_blocks(prior, &[], &[])
        .iter()
        .filter(|b| b.kind == BlockKind::Heading)
        .map(|b| markdown::normalize(&b.text))
        .collect();

    let mut appended: Vec<String> = Vec::new();
    let mut pending_heading: Option<String> = None;

    for block in markdown::parse_blocks(generated, &[], &[]) {
        match block.kind {
            BlockKind::Heading => {
                pending_heading = Some(block.text);
            }
            BlockKind::Rule => {}
            _ => {
                let body_norm = markdown::normalize(block.body());
                if body_norm.is_empty() || !present.insert(body_norm) {
                    continue;
                }
                if let Some(heading) = pending_heading.take()
                    && headings.insert(markdown::normalize(&heading))
                {
                    appended.push(heading);
                }
                appended.push(block.text);
            }
        }
    }

    if appended.is_empty() {
        return prior.to_string();
    }
    format!("{}\n\n{}", prior, appended.join("\n\n"))
}

/// Whitespace-normalized bodies of every content block
fn content_bodies(text: &str) -> HashSet<String> {
    markdown::parse_blocks(text, RETAINED_MARKERS, &[])
        .iter()
        .filter(|b| b.is_content())
        .map(|b| markdown::normalize(b.body()))
        .filter(|body| !body.is_empty())
        .collect()
}

struct KeyedItem {
    description: String,
    body: String,
}

/// Generated list items by key; the first description of a key wins
fn keyed_items(text: &str) -> HashMap<String, KeyedItem> {
    let mut items = HashMap::new();
    for block in markdown::parse_blocks(text, &[], &[]) {
        if block.kind != BlockKind::ListItem {
            continue;
        }
        if let Some((key, description)) = item_key(block.body()) {
            items.entry(key).or_insert_with(|| KeyedItem {
                description,
                body: block.body().to_string(),
            });
        }
    }
    items
}

/// Split "`name`: description" style items into (name, description)
fn item_key(body: &str) -> Option<(String, String)> {
    let body = body.trim();
    if let Some(caps) = KEYED_ITEM.captures(body) {
        return Some((key_name(&caps[1]), caps[2].to_string()));
    }
    BOLD_COLON_ITEM
        .captures(body)
        .map(|caps| (key_name(&caps[1]), caps[2].to_string()))
}

fn key_name(token: &str) -> String {
    let inner = if let Some(rest) = token.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        token.trim_matches(|c| c == '`' || c == '*')
    };
    inner.trim_end_matches(':').trim().to_lowercase()
}

fn attributed(label: &str, body: &str) -> String {
    format!("- *({})* {}", label, body.trim_end())
}

/// Retained blocks grouped by original heading, in first-seen order
#[derive(Default)]
struct Groups {
    order: Vec<Option<String>>,
    blocks: HashMap<Option<String>, Vec<String>>,
    seen: HashSet<String>,
}

impl Groups {
    /// Returns false for a duplicate block
    fn push(&mut self, heading: Option<&str>, text: String) -> bool {
        if !self.seen.insert(markdown::normalize(&text)) {
            return false;
        }
        let key = heading.map(str::to_string);
        if !self.blocks.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.blocks.entry(key).or_default().push(text);
        true
    }

    fn block_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }

    fn render(&self) -> Option<String> {
        if self.blocks.is_empty() {
            return None;
        }

        // Blocks without a heading go first so they stay unheaded on re-read.
        // The conflicts group goes last.
        let unheaded: Option<String> = None;
        let conflicts = Some(docs::CONFLICTS_HEADING.to_string());
        let mut keys: Vec<&Option<String>> = Vec::new();
        if self.blocks.contains_key(&unheaded) {
            keys.push(&unheaded);
        }
        keys.extend(
            self.order
                .iter()
                .filter(|k| k.is_some() && **k != conflicts),
        );
        if self.blocks.contains_key(&conflicts) {
            keys.push(&conflicts);
        }

        let mut parts = vec![
            docs::RETAINED_START.to_string(),
            format!("## {}", docs::RETAINED_HEADING),
        ];
        for key in keys {
            if let Some(heading) = key {
                parts.push(format!("### {}", heading));
            }
            if let Some(blocks) = self.blocks.get(key) {
                parts.extend(blocks.iter().cloned());
            }
        }
        parts.push(docs::RETAINED_END.to_string());

        Some(parts.join("\n\n"))
    }
}
