//! SessionManager — coordinates the engine, the generative client, and
//! the session store.
//!
//! The engine stays synchronous; everything that suspends (catalog
//! enrichment, hints, evaluation, closing feedback, persistence) runs
//! here. Store failures degrade to fresh-session / best-effort-save, and
//! generative failures degrade to static fallbacks — neither ever
//! propagates to the caller.

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::builder;
use crate::error::SessionError;
use crate::llm::{prompts, ChatMessage, CompletionRequest, GenerativeProvider};
use crate::session::engine::{Progress, QuizOutcome, QuizPolicy, SessionEngine};
use crate::session::evaluate::{self, Evaluation};
use crate::session::model::{OnboardingSession, SessionInputs};
use crate::store::SessionStore;
use crate::terminal::CommandReport;

/// Identity handle for an in-flight generative call.
///
/// There is no cancellation plumbing; instead every asynchronous call is
/// issued under a tag tied to the live session. A result whose tag no
/// longer matches (the user restarted or navigated away) must be
/// discarded by whoever holds it, not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub session_id: String,
    pub call_id: Uuid,
}

/// Coordinates one user's onboarding session.
pub struct SessionManager {
    engine: SessionEngine,
    inputs: SessionInputs,
    provider: Arc<dyn GenerativeProvider>,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Resume the stored session for the user, or build a fresh one.
    ///
    /// Any load error falls back to a fresh session; the failure is
    /// logged, never surfaced as blocking.
    pub async fn start_or_resume(
        inputs: SessionInputs,
        provider: Arc<dyn GenerativeProvider>,
        store: Arc<dyn SessionStore>,
        policy: QuizPolicy,
    ) -> Self {
        let session = match store.load(&inputs.user_id).await {
            Ok(Some(session)) => {
                tracing::info!(session = %session.id, "resumed stored session");
                session
            }
            Ok(None) => fresh_session(&inputs, provider.as_ref()).await,
            Err(e) => {
                tracing::warn!(error = %e, "session load failed, starting fresh");
                fresh_session(&inputs, provider.as_ref()).await
            }
        };

        let manager = Self {
            engine: SessionEngine::new(session, policy),
            inputs,
            provider,
            store,
        };
        manager.persist().await;
        manager
    }

    /// Discard the current session and rebuild from identical inputs.
    /// The new session has a fresh id and zeroed progress.
    pub async fn restart(&mut self) {
        let session = fresh_session(&self.inputs, self.provider.as_ref()).await;
        tracing::info!(session = %session.id, "session restarted");
        self.engine.replace_session(session);
        self.persist().await;
    }

    pub fn session(&self) -> &OnboardingSession {
        self.engine.session()
    }

    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    /// Tag for an asynchronous call issued against the live session.
    pub fn issue_tag(&self) -> RequestTag {
        RequestTag {
            session_id: self.session().id.clone(),
            call_id: Uuid::new_v4(),
        }
    }

    /// Whether a tag still refers to the live session.
    pub fn is_current(&self, tag: &RequestTag) -> bool {
        tag.session_id == self.session().id
    }

    /// Mark the current task in-progress (it is being displayed) and
    /// persist.
    pub async fn activate_current(&mut self) -> Option<String> {
        let id = self.engine.activate_current().map(|t| t.id.clone());
        if id.is_some() {
            self.persist().await;
        }
        id
    }

    /// A hint for the current task, falling back to static text when the
    /// generative service is unavailable or the response arrives stale.
    pub async fn hint_for_current(&self) -> String {
        let Some(task) = self.session().current_task().cloned() else {
            return "You're done — nothing left to hint at.".to_string();
        };
        let tag = self.issue_tag();
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::system_prompt(&self.session().ai_personality)),
            ChatMessage::user(prompts::hint_prompt(&self.session().ai_personality, &task)),
        ])
        .with_max_tokens(150);

        match self.provider.complete(request).await {
            Ok(response) if self.is_current(&tag) => response.content,
            Ok(_) => {
                tracing::debug!("discarding hint for a stale session");
                prompts::fallback_hint(&task)
            }
            Err(e) => {
                tracing::warn!(error = %e, "hint generation failed, using fallback");
                prompts::fallback_hint(&task)
            }
        }
    }

    /// Personalized closing message once the session is terminal; static
    /// fallback on any generative failure.
    pub async fn closing_message(&self) -> String {
        if !self.session().is_complete() {
            return prompts::CLOSING_FALLBACK.to_string();
        }
        let stats = self.engine.stats();
        let tag = self.issue_tag();
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::system_prompt(&self.session().ai_personality)),
            ChatMessage::user(prompts::closing_prompt(
                &self.session().ai_personality,
                stats.elapsed_minutes,
                &stats.struggled,
            )),
        ])
        .with_max_tokens(200);

        match self.provider.complete(request).await {
            Ok(response) if self.is_current(&tag) => response.content,
            Ok(_) | Err(_) => prompts::CLOSING_FALLBACK.to_string(),
        }
    }

    /// Route a command execution report into the engine and persist.
    pub async fn report_command(&mut self, report: &CommandReport) -> bool {
        let completed = self.engine.handle_command(report);
        self.persist().await;
        completed
    }

    /// Submit a quiz answer and persist.
    pub async fn submit_quiz(
        &mut self,
        task_id: &str,
        selected: usize,
    ) -> Result<QuizOutcome, SessionError> {
        let outcome = self.engine.submit_quiz_answer(task_id, selected)?;
        self.persist().await;
        Ok(outcome)
    }

    /// Evaluate a free-text answer for a qa task, record the result, and
    /// persist. Evaluator failure yields a zero-score evaluation; it is
    /// recorded like any other and never blocks.
    pub async fn answer_question(
        &mut self,
        task_id: &str,
        answer: &str,
    ) -> Result<Evaluation, SessionError> {
        let task = self
            .session()
            .task(task_id)
            .ok_or_else(|| SessionError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        let question = task
            .question
            .clone()
            .ok_or_else(|| SessionError::NotAQuestion {
                id: task_id.to_string(),
            })?;
        let expected = task.answer.clone().unwrap_or_default();

        let evaluation =
            evaluate::evaluate_free_text(self.provider.as_ref(), &question, &expected, answer)
                .await;
        self.engine.record_evaluation(task_id, &evaluation)?;
        self.persist().await;
        Ok(evaluation)
    }

    /// Manually mark a task complete (interactive walkthroughs, explore
    /// acknowledgements). Converges on the same completion path as the
    /// event-driven triggers.
    pub async fn acknowledge(&mut self, task_id: &str) -> Result<(), SessionError> {
        self.engine.complete_task(task_id)?;
        self.persist().await;
        Ok(())
    }

    /// Skip a task and persist.
    pub async fn skip(&mut self, task_id: &str) -> Result<(), SessionError> {
        self.engine.skip_task(task_id)?;
        self.persist().await;
        Ok(())
    }

    /// Best-effort save; store errors are logged, never surfaced.
    async fn persist(&self) {
        let session = self.session();
        if let Err(e) = self.store.save(&session.user_id, session).await {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }
}

async fn fresh_session(
    inputs: &SessionInputs,
    provider: &dyn GenerativeProvider,
) -> OnboardingSession {
    let tasks = builder::build(&inputs.catalog_request(), provider).await;
    OnboardingSession::new(inputs, tasks)
}
