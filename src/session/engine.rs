//! Session state machine — all mutation of the session aggregate.
//!
//! External components never touch `tasks` or `completed_tasks` directly;
//! every write goes through the operations here, which enforce the task
//! status transition table and keep `current_task_index` consistent with
//! the prerequisite gating.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::catalog::task::{Task, TaskStatus};
use crate::error::SessionError;
use crate::session::evaluate::Evaluation;
use crate::session::model::OnboardingSession;
use crate::terminal::CommandReport;

/// Quiz progression policy.
///
/// After `reveal_threshold` failed attempts the correct option's text is
/// surfaced as a hint. Whether the reveal also completes the task is
/// configurable; the default keeps the task open until the user skips it
/// or answers correctly.
#[derive(Debug, Clone, Copy)]
pub struct QuizPolicy {
    pub reveal_threshold: u32,
    pub auto_complete_on_reveal: bool,
}

impl Default for QuizPolicy {
    fn default() -> Self {
        Self {
            reveal_threshold: 3,
            auto_complete_on_reveal: false,
        }
    }
}

/// Aggregate progress over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    /// Sum of estimates over tasks still `Pending`. A task counts as
    /// spent the moment it goes in-progress.
    pub estimated_minutes_remaining: u32,
}

/// End-of-session statistics for the closing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub elapsed_minutes: i64,
    /// Titles of tasks that took more than two attempts.
    pub struggled: Vec<String>,
}

/// Result of a quiz submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct {
        explanation: String,
    },
    Incorrect {
        explanation: String,
        /// The correct option's text, present once the reveal threshold
        /// is reached.
        revealed_answer: Option<String>,
        attempts: u32,
    },
}

/// Partial field update for [`SessionEngine::update_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub attempts: Option<u32>,
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// Owns the session aggregate and exposes its transition operations.
pub struct SessionEngine {
    session: OnboardingSession,
    policy: QuizPolicy,
}

impl SessionEngine {
    pub fn new(session: OnboardingSession, policy: QuizPolicy) -> Self {
        Self { session, policy }
    }

    pub fn session(&self) -> &OnboardingSession {
        &self.session
    }

    pub fn policy(&self) -> QuizPolicy {
        self.policy
    }

    /// Replace the aggregate wholesale (restart / rehydration).
    pub fn replace_session(&mut self, session: OnboardingSession) {
        self.session = session;
    }

    /// True iff every prerequisite id is in the completed set.
    pub fn can_start(task: &Task, completed: &BTreeSet<String>) -> bool {
        task.prerequisites.iter().all(|id| completed.contains(id))
    }

    /// First pending task in catalog order whose prerequisites are met.
    pub fn next_available<'a>(
        tasks: &'a [Task],
        completed: &BTreeSet<String>,
    ) -> Option<&'a Task> {
        tasks
            .iter()
            .find(|t| t.status == TaskStatus::Pending && Self::can_start(t, completed))
    }

    /// Merge a partial update into a task, enforcing the transition table.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<(), SessionError> {
        let task = self
            .session
            .task_mut(id)
            .ok_or_else(|| SessionError::TaskNotFound { id: id.to_string() })?;

        if let Some(target) = patch.status {
            if !task.status.can_transition_to(target) {
                return Err(SessionError::InvalidTransition {
                    id: id.to_string(),
                    from: task.status,
                    to: target,
                });
            }
            task.status = target;
            match target {
                TaskStatus::InProgress => {
                    task.started_at.get_or_insert_with(Utc::now);
                }
                TaskStatus::Completed => {
                    task.completed_at.get_or_insert_with(Utc::now);
                }
                _ => {}
            }
        }
        if let Some(attempts) = patch.attempts {
            task.attempts = attempts;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        Ok(())
    }

    /// Mark the task at the current index in-progress. A task is
    /// considered started the moment it is displayed.
    pub fn activate_current(&mut self) -> Option<&Task> {
        let id = self.session.current_task()?.id.clone();
        // Already in progress or terminal: leave untouched.
        if self.session.task(&id).map(|t| t.status) == Some(TaskStatus::Pending) {
            let _ = self.update_task(&id, TaskPatch::status(TaskStatus::InProgress));
        }
        self.session.task(&id)
    }

    /// Complete a task and advance the session pointer.
    ///
    /// Idempotent: completing an already-completed id changes nothing.
    pub fn complete_task(&mut self, id: &str) -> Result<(), SessionError> {
        if self.session.completed_tasks.contains(id) {
            return Ok(());
        }
        self.ensure_in_progress(id)?;
        self.update_task(id, TaskPatch::status(TaskStatus::Completed))?;
        self.session.completed_tasks.insert(id.to_string());
        self.advance_pointer();
        Ok(())
    }

    /// Skip a task. The id never enters the completed set, so tasks
    /// gated on it stay blocked.
    pub fn skip_task(&mut self, id: &str) -> Result<(), SessionError> {
        if self.session.task(id).map(|t| t.status) == Some(TaskStatus::Skipped) {
            return Ok(());
        }
        self.ensure_in_progress(id)?;
        self.update_task(id, TaskPatch::status(TaskStatus::Skipped))?;
        self.advance_pointer();
        Ok(())
    }

    /// React to a command execution. Appends to the audit trail; a
    /// successful report while a terminal task is current completes it —
    /// the only completion path for terminal tasks. Returns whether a
    /// task completed.
    pub fn handle_command(&mut self, report: &CommandReport) -> bool {
        let verdict = if report.succeeded { "ok" } else { "failed" };
        let line = format!("$ {} ({verdict})", report.command);
        self.session.note_command(&line);

        if !report.succeeded {
            return false;
        }
        let current = match self.session.current_task() {
            Some(task) if task.kind == crate::catalog::task::TaskKind::Terminal => {
                task.id.clone()
            }
            _ => return false,
        };
        self.complete_task(&current).is_ok()
    }

    /// Submit a quiz answer. Increments `attempts` on every submission.
    pub fn submit_quiz_answer(
        &mut self,
        id: &str,
        selected: usize,
    ) -> Result<QuizOutcome, SessionError> {
        let task = self
            .session
            .task(id)
            .ok_or_else(|| SessionError::TaskNotFound { id: id.to_string() })?;
        let quiz = task
            .quiz
            .clone()
            .ok_or_else(|| SessionError::NotAQuiz { id: id.to_string() })?;
        let prior_attempts = task.attempts;

        // Resubmission after completion is a no-op beyond the canonical
        // explanation.
        if self.session.completed_tasks.contains(id) {
            return Ok(QuizOutcome::Correct {
                explanation: quiz.explanation,
            });
        }

        self.ensure_in_progress(id)?;
        let attempts = prior_attempts + 1;
        self.update_task(id, TaskPatch::default().with_attempts(attempts))?;

        if selected == quiz.correct_answer {
            self.complete_task(id)?;
            return Ok(QuizOutcome::Correct {
                explanation: quiz.explanation,
            });
        }

        let revealed_answer = (attempts >= self.policy.reveal_threshold)
            .then(|| quiz.options.get(quiz.correct_answer).cloned())
            .flatten();
        if revealed_answer.is_some() && self.policy.auto_complete_on_reveal {
            self.complete_task(id)?;
        }
        Ok(QuizOutcome::Incorrect {
            explanation: quiz.explanation,
            revealed_answer,
            attempts,
        })
    }

    /// Record a free-text evaluation result against a qa task. The score
    /// is recorded whatever it is; only a passing evaluation completes.
    pub fn record_evaluation(
        &mut self,
        id: &str,
        evaluation: &Evaluation,
    ) -> Result<(), SessionError> {
        let task = self
            .session
            .task(id)
            .ok_or_else(|| SessionError::TaskNotFound { id: id.to_string() })?;
        if task.question.is_none() {
            return Err(SessionError::NotAQuestion { id: id.to_string() });
        }
        let prior_attempts = task.attempts;
        if self.session.completed_tasks.contains(id) {
            return Ok(());
        }
        self.ensure_in_progress(id)?;
        let attempts = prior_attempts + 1;
        self.update_task(id, TaskPatch::default().with_attempts(attempts))?;
        if evaluation.is_correct {
            self.complete_task(id)?;
        }
        Ok(())
    }

    /// Aggregate progress over the catalog.
    pub fn progress(&self) -> Progress {
        let tasks = &self.session.tasks;
        let total = tasks.len();
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let percentage = if total == 0 {
            0
        } else {
            (100.0 * completed as f64 / total as f64).round() as u32
        };
        let estimated_minutes_remaining = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.estimated_minutes)
            .sum();
        Progress {
            completed,
            total,
            percentage,
            estimated_minutes_remaining,
        }
    }

    /// Statistics for the closing message.
    pub fn stats(&self) -> SessionStats {
        let elapsed_minutes = Utc::now()
            .signed_duration_since(self.session.started_at)
            .num_minutes()
            .max(0);
        let struggled = self
            .session
            .tasks
            .iter()
            .filter(|t| t.attempts > 2)
            .map(|t| t.title.clone())
            .collect();
        SessionStats {
            elapsed_minutes,
            struggled,
        }
    }

    /// Activate a pending task so a status-bearing operation can land on
    /// it. Tasks already in progress pass through; terminal tasks fail
    /// the subsequent transition check with a typed error.
    fn ensure_in_progress(&mut self, id: &str) -> Result<(), SessionError> {
        let status = self
            .session
            .task(id)
            .ok_or_else(|| SessionError::TaskNotFound { id: id.to_string() })?
            .status;
        if status == TaskStatus::Pending {
            self.update_task(id, TaskPatch::status(TaskStatus::InProgress))?;
        }
        Ok(())
    }

    /// Recompute the session pointer: position of the next available
    /// task, or one past the end when none remains (terminal signal).
    fn advance_pointer(&mut self) {
        let next = Self::next_available(&self.session.tasks, &self.session.completed_tasks)
            .map(|t| t.id.clone());
        self.session.current_task_index = match next {
            Some(id) => self
                .session
                .tasks
                .iter()
                .position(|t| t.id == id)
                .unwrap_or(self.session.tasks.len()),
            None => self.session.tasks.len(),
        };
    }
}
