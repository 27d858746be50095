//! Defensive parser for generative task batches.
//!
//! The input is free text with no schema guarantee. Parsing is
//! line-oriented: each line either yields a well-formed [`Task`] or is
//! dropped with a named reason. A bad line never fails the batch and is
//! never substituted with a placeholder.
//!
//! Accepted line grammar (segments separated by `" - "`):
//!
//! ```text
//! Task 1: Explore routing - Look at the router setup - Type: explore - File: router.ts
//! ```
//!
//! `Type:` and `File:` are optional, matched case-insensitively, and may
//! appear in any order after the title.

use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::task::{Task, TaskKind};

/// Why a line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSkip {
    /// Empty or whitespace-only line.
    Blank,
    /// No usable title before the first delimiter.
    MissingTitle,
}

fn title_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^task\s*\d+\s*[:.)]\s*").expect("static regex"))
}

/// Parse a whole batch. Never fails; unparseable lines are dropped.
///
/// Accepted tasks get ids `ai-generated-{n}` numbered by accepted
/// position (1-based), independent of any numbering in the input.
pub fn parse(raw: &str) -> Vec<Task> {
    let mut tasks = Vec::new();
    for line in raw.lines() {
        match parse_line(line) {
            Ok(parsed) => {
                let id = format!("ai-generated-{}", tasks.len() + 1);
                tasks.push(parsed.into_task(id));
            }
            Err(LineSkip::Blank) => {}
            Err(reason) => {
                tracing::warn!(?reason, line, "dropping unparseable task line");
            }
        }
    }
    tasks
}

/// One successfully parsed line, before id assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedLine {
    title: String,
    description: String,
    declared: Option<TaskKind>,
    file: Option<String>,
}

impl ParsedLine {
    fn into_task(self, id: String) -> Task {
        // A file reference overrides the declared type: the task is an
        // exploration of that file no matter what the text claimed.
        let kind = if self.file.is_some() {
            TaskKind::Explore
        } else {
            self.declared.unwrap_or(TaskKind::Qa)
        };
        let mut task = Task::new(id, self.title, self.description, kind);
        task.file = self.file;
        task
    }
}

fn parse_line(line: &str) -> Result<ParsedLine, LineSkip> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LineSkip::Blank);
    }

    let mut segments = line.split(" - ");
    let head = segments.next().unwrap_or_default();
    let title = title_prefix().replace(head, "").trim().to_string();
    if title.is_empty() || !title.chars().any(|c| c.is_alphanumeric()) {
        return Err(LineSkip::MissingTitle);
    }

    let mut declared = None;
    let mut file = None;
    let mut description_parts: Vec<&str> = Vec::new();

    for segment in segments {
        let segment = segment.trim();
        let lower = segment.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("type:") {
            declared = parse_kind(value.trim());
        } else if lower.starts_with("file:") {
            let value = segment[5..].trim();
            if !value.is_empty() {
                file = Some(value.to_string());
            }
        } else if !segment.is_empty() {
            description_parts.push(segment);
        }
    }

    let description = if description_parts.is_empty() {
        title.clone()
    } else {
        description_parts.join(" - ")
    };

    Ok(ParsedLine {
        title,
        description,
        declared,
        file,
    })
}

/// Map a declared type string to a kind; unknown strings fall through to
/// the `Qa` default in [`ParsedLine::into_task`].
fn parse_kind(value: &str) -> Option<TaskKind> {
    match value {
        "terminal" => Some(TaskKind::Terminal),
        "explore" => Some(TaskKind::Explore),
        "qa" => Some(TaskKind::Qa),
        "quiz" => Some(TaskKind::Quiz),
        "interactive" => Some(TaskKind::Interactive),
        "code-challenge" => Some(TaskKind::CodeChallenge),
        _ => None,
    }
}
