//! Onboarding session aggregate.
//!
//! One `OnboardingSession` per (user, repository-set) engagement. The
//! aggregate is plain data; all mutation goes through the engine in
//! [`crate::session::engine`]. The whole aggregate serializes for the
//! persistence boundary (timestamps as RFC 3339 via chrono's serde).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::task::Task;
use crate::catalog::CatalogRequest;

/// The inputs a session is personalized from. Kept verbatim so a restart
/// can rebuild the catalog from identical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInputs {
    pub user_id: String,
    pub repository_name: String,
    pub user_role: String,
    pub user_level: String,
    pub repositories: Vec<String>,
    /// Tone label threaded into generative prompts (e.g. `mentor`).
    pub ai_personality: String,
}

impl SessionInputs {
    pub fn catalog_request(&self) -> CatalogRequest {
        CatalogRequest {
            repository_name: self.repository_name.clone(),
            role: self.user_role.clone(),
            level: self.user_level.clone(),
            repositories: self.repositories.clone(),
        }
    }
}

/// The session aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingSession {
    /// Generated at creation, unique per session (restart gets a new one).
    pub id: String,
    pub user_id: String,
    pub repository_name: String,
    pub user_level: String,
    pub user_role: String,
    pub repositories: Vec<String>,
    pub started_at: DateTime<Utc>,
    /// Index into `tasks` of the current task; `tasks.len()` once the
    /// curriculum is exhausted.
    pub current_task_index: usize,
    /// Fixed order after creation; only statuses mutate.
    pub tasks: Vec<Task>,
    /// Ids that reached `Completed`. Skipped tasks never enter this set
    /// and therefore never satisfy a later prerequisite.
    pub completed_tasks: BTreeSet<String>,
    /// Append-only audit trail of command executions.
    pub session_notes: Vec<String>,
    pub ai_personality: String,
}

impl OnboardingSession {
    /// Create a fresh session over a built catalog.
    pub fn new(inputs: &SessionInputs, tasks: Vec<Task>) -> Self {
        let started_at = Utc::now();
        Self {
            id: format!("session-{}", started_at.timestamp_millis()),
            user_id: inputs.user_id.clone(),
            repository_name: inputs.repository_name.clone(),
            user_level: inputs.user_level.clone(),
            user_role: inputs.user_role.clone(),
            repositories: inputs.repositories.clone(),
            started_at,
            current_task_index: 0,
            tasks,
            completed_tasks: BTreeSet::new(),
            session_notes: Vec::new(),
            ai_personality: inputs.ai_personality.clone(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// The task at the current index, if the curriculum is not exhausted.
    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.current_task_index)
    }

    /// Terminal condition: every task resolved or unreachable.
    pub fn is_complete(&self) -> bool {
        self.current_task_index >= self.tasks.len()
    }

    /// Append a timestamped line to the audit trail. Not used for control
    /// flow.
    pub fn note_command(&mut self, line: &str) {
        self.session_notes
            .push(format!("[{}] {line}", Utc::now().to_rfc3339()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::task::TaskKind;

    fn inputs() -> SessionInputs {
        SessionInputs {
            user_id: "u1".into(),
            repository_name: "web-app".into(),
            user_role: "frontend".into(),
            user_level: "beginner".into(),
            repositories: vec!["web-app".into(), "api".into()],
            ai_personality: "mentor".into(),
        }
    }

    #[test]
    fn new_session_defaults() {
        let session = OnboardingSession::new(
            &inputs(),
            vec![Task::new("t1", "T", "D", TaskKind::Interactive)],
        );
        assert!(session.id.starts_with("session-"));
        assert_eq!(session.current_task_index, 0);
        assert!(session.completed_tasks.is_empty());
        assert!(session.session_notes.is_empty());
        assert!(!session.is_complete());
        assert_eq!(session.current_task().unwrap().id, "t1");
    }

    #[test]
    fn empty_catalog_is_immediately_complete() {
        let session = OnboardingSession::new(&inputs(), Vec::new());
        assert!(session.is_complete());
        assert!(session.current_task().is_none());
    }

    #[test]
    fn note_command_appends_timestamped_lines() {
        let mut session = OnboardingSession::new(&inputs(), Vec::new());
        session.note_command("$ npm install (ok)");
        session.note_command("$ npm test (failed)");
        assert_eq!(session.session_notes.len(), 2);
        assert!(session.session_notes[0].contains("$ npm install (ok)"));
        assert!(session.session_notes[0].starts_with('['));
    }

    #[test]
    fn session_serde_roundtrip() {
        let mut session = OnboardingSession::new(
            &inputs(),
            vec![Task::new("t1", "T", "D", TaskKind::Qa)],
        );
        session.completed_tasks.insert("t1".into());
        session.note_command("$ ls");

        let json = serde_json::to_string(&session).unwrap();
        let parsed: OnboardingSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, session.id);
        assert_eq!(parsed.started_at, session.started_at);
        assert_eq!(parsed.completed_tasks, session.completed_tasks);
        assert_eq!(parsed.tasks.len(), 1);
        assert_eq!(parsed.session_notes.len(), 1);
    }

    #[test]
    fn catalog_request_mirrors_inputs() {
        let req = inputs().catalog_request();
        assert_eq!(req.repository_name, "web-app");
        assert_eq!(req.role, "frontend");
        assert_eq!(req.level, "beginner");
        assert_eq!(req.repositories.len(), 2);
    }
}
