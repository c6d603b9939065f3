//! Prompt Builder
//!
//! Standardized prompt construction for README generation.
//!
//! ## Structure
//!
//! 1. **Role Definition**: writer persona and task
//! 2. **Objectives**: numbered goals, strategy-specific
//! 3. **Context**: directory name, path and folder tree
//! 4. **Inputs**: file excerpts, child documents, existing document
//! 5. **Focus**: output restrictions

use super::analyzer::{AnalysisInput, MergeStrategy};

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Ordered key-value pairs
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Code block with language
    Code { language: String, content: String },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add a context item, extending the first context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        for section in &mut self.sections {
            if let PromptSection::Context(ctx) = section {
                ctx.push((key.to_string(), value.to_string()));
                return self;
            }
        }
        self.sections.push(PromptSection::Context(vec![(
            key.to_string(),
            value.to_string(),
        )]));
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add code block
    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add focus enforcement section
    pub fn focus(mut self, target: &str, restrictions: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(ctx) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in ctx {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// System instruction shared by every README request
pub const SYSTEM_PROMPT: &str = "You are an expert technical writer. Write GitHub-flavored \
Markdown. Return only the README content, with no commentary and no outer code fences.";

/// Prompt for one directory's README
pub fn readme_prompt(input: &AnalysisInput, summary_chars: usize) -> String {
    let relative = input.relative_path.display().to_string();

    let mut builder = PromptBuilder::new().role(
        "technical writer",
        "concise README files for source directories",
    );

    builder = match (input.strategy, input.existing.is_some()) {
        (MergeStrategy::AppendOnly, true) => builder.objectives(vec![
            "Write ONLY new sections that the existing README lacks",
            "Do not repeat, rewrite or reorganize existing content",
            "Start each new section with a second-level heading (##)",
            "Cover gaps such as architecture, file overview, setup or testing",
        ]),
        _ => builder.objectives(vec![
            "Start with a level-one title and a one-paragraph overview",
            "Describe each source file as a list item: - `name`: purpose",
            "Summarize how the subdirectories fit together",
            "Keep every fact from the existing README; improve structure only",
            "Mention build, usage or configuration details visible in the files",
        ]),
    };

    builder = builder
        .context_item("Folder", &input.name)
        .context_item("Path", &relative)
        .section("Folder Structure", &input.folder_tree);

    for file in &input.files {
        let language = file
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("");
        let mut content = file.content.clone();
        if file.truncated {
            content.push_str("\n... (truncated)");
        }
        builder = builder
            .section(&format!("File: {}", file.name), "")
            .code(language, &content);
    }

    if !input.child_summaries.is_empty() {
        let summaries = input
            .child_summaries
            .iter()
            .map(|child| {
                let excerpt: String = child.text.chars().take(summary_chars).collect();
                let ellipsis = if child.text.chars().count() > summary_chars {
                    "..."
                } else {
                    ""
                };
                format!("## {} (subfolder)\n{}{}", child.name, excerpt, ellipsis)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        builder = builder.section("Subfolder READMEs", &summaries);
    }

    if let Some(existing) = &input.existing {
        builder = builder.section("Existing README", existing);
    }

    builder
        .focus(
            &format!("the `{}` directory", relative),
            vec![
                "Do NOT describe files or folders that are not listed",
                "Do NOT invent APIs, commands or behavior you cannot see",
                "Do NOT wrap the answer in a code fence",
            ],
        )
        .build()
}
