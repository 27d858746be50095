//! Task data model — curriculum units, status state machine, payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of curriculum content a task carries.
///
/// The kind determines which payload fields are meaningful and which
/// completion predicate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Run a command in the simulated terminal.
    Terminal,
    /// Open and read a file in the code viewer.
    Explore,
    /// Answer a free-text question.
    Qa,
    /// Write code against a starter and tests (payload carried, not evaluated).
    CodeChallenge,
    /// Multiple-choice quiz with one correct option.
    Quiz,
    /// Guided walkthrough step, completed by acknowledgement.
    Interactive,
}

/// Lifecycle status of a task.
///
/// Forward-only: `Pending → InProgress → {Completed | Skipped}`. A task in
/// a terminal status is never revisited except by a full session restart,
/// which rebuilds the catalog from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl TaskStatus {
    /// Check if this status allows transitioning to another status.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, target),
            (Pending, InProgress) | (InProgress, Completed) | (InProgress, Skipped)
        )
    }

    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// Informational difficulty rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Multiple-choice quiz payload: one question, four options, one correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_answer: usize,
    /// Canonical explanation shown after any submission.
    pub explanation: String,
}

/// Code-challenge payload. Carried for display; the engine never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChallenge {
    pub prompt: String,
    pub starter: String,
    pub tests: String,
}

/// A single curriculum unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable unique id, used as the graph key for prerequisites.
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: TaskKind,
    #[serde(default)]
    pub status: TaskStatus,
    /// Positive estimate in minutes, used only for aggregate reporting.
    pub estimated_minutes: u32,
    pub difficulty: Difficulty,
    /// Ids that must all be in the session's completed set before this
    /// task may start. Empty = no gating.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    /// File to open (explore tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Command to run (terminal tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Substring expected in the command output (terminal tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// Free-text question (qa tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Model answer for the free-text question (qa tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<CodeChallenge>,
    /// Incremented on every submission, correct or not.
    #[serde(default)]
    pub attempts: u32,
    /// Set exactly once, on first activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Set exactly once, on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task with default difficulty and estimate.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: TaskKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            kind,
            status: TaskStatus::Pending,
            estimated_minutes: 10,
            difficulty: Difficulty::Medium,
            prerequisites: Vec::new(),
            file: None,
            command: None,
            expected_output: None,
            question: None,
            answer: None,
            quiz: None,
            code_challenge: None,
            attempts: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// Builder: set the time estimate in minutes.
    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    /// Builder: set the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Builder: set the prerequisite ids.
    pub fn with_prerequisites<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the file reference (explore tasks).
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Builder: set the terminal command and expected output substring.
    pub fn with_command(
        mut self,
        command: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        self.command = Some(command.into());
        self.expected_output = Some(expected_output.into());
        self
    }

    /// Builder: set the free-text question and model answer.
    pub fn with_question(
        mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        self.question = Some(question.into());
        self.answer = Some(answer.into());
        self
    }

    /// Builder: set the quiz payload.
    pub fn with_quiz(mut self, quiz: Quiz) -> Self {
        self.quiz = Some(quiz);
        self
    }

    /// Builder: set the code-challenge payload.
    pub fn with_code_challenge(mut self, challenge: CodeChallenge) -> Self {
        self.code_challenge = Some(challenge);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_valid() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Skipped));
    }

    #[test]
    fn status_transitions_invalid() {
        // Backwards
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::Skipped.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Skipped.can_transition_to(TaskStatus::InProgress));
        // Skipping the in-progress stage
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Skipped));
        // Self-transition
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::InProgress));
        // Between terminals
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Skipped));
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Skipped.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn status_display_matches_serde() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Skipped,
        ] {
            let display = format!("{status}");
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }

    #[test]
    fn kind_serde_kebab_case() {
        let json = serde_json::to_string(&TaskKind::CodeChallenge).unwrap();
        assert_eq!(json, "\"code-challenge\"");

        let parsed: TaskKind = serde_json::from_str("\"terminal\"").unwrap();
        assert_eq!(parsed, TaskKind::Terminal);
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new("t1", "Title", "Desc", TaskKind::Explore);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.estimated_minutes, 10);
        assert!(task.prerequisites.is_empty());
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn task_builder_methods() {
        let task = Task::new("q1", "Quiz", "Try it", TaskKind::Quiz)
            .with_estimate(5)
            .with_difficulty(Difficulty::Hard)
            .with_prerequisites(["setup-environment"])
            .with_quiz(Quiz {
                question: "2+2?".into(),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                correct_answer: 3,
                explanation: "Arithmetic.".into(),
            });
        assert_eq!(task.estimated_minutes, 5);
        assert_eq!(task.difficulty, Difficulty::Hard);
        assert_eq!(task.prerequisites, vec!["setup-environment".to_string()]);
        assert_eq!(task.quiz.as_ref().unwrap().correct_answer, 3);
    }

    #[test]
    fn task_serde_roundtrip() {
        let task = Task::new("explore-router", "Explore routing", "Read it", TaskKind::Explore)
            .with_file("src/router.ts")
            .with_prerequisites(["setup-environment"]);
        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "explore-router");
        assert_eq!(parsed.kind, TaskKind::Explore);
        assert_eq!(parsed.file.as_deref(), Some("src/router.ts"));
        assert_eq!(parsed.status, TaskStatus::Pending);
    }

    #[test]
    fn task_optional_fields_omitted() {
        let task = Task::new("t", "T", "D", TaskKind::Interactive);
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("\"file\""));
        assert!(!json.contains("\"command\""));
        assert!(!json.contains("\"quiz\""));
        assert!(!json.contains("\"prerequisites\""));
        assert!(!json.contains("\"started_at\""));
    }
}
