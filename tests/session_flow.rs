//! End-to-end session walk: catalog build with AI enrichment, every task
//! kind completed through its own path, progress tracking, and the
//! closing message.

use std::sync::Arc;

use async_trait::async_trait;

use onboard::catalog::task::{TaskKind, TaskStatus};
use onboard::catalog::{SETUP_TASK_ID, WELCOME_TASK_ID};
use onboard::error::LlmError;
use onboard::llm::{CompletionRequest, CompletionResponse, GenerativeProvider};
use onboard::session::{QuizPolicy, SessionInputs, SessionManager};
use onboard::store::{MemoryStore, SessionStore};
use onboard::terminal::CommandReport;

/// Routes replies by prompt content, the way the real service would see
/// distinct prompts for batch generation, evaluation, hints, and closing.
struct RoutedProvider;

#[async_trait]
impl GenerativeProvider for RoutedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let content = if prompt.contains("Generate exactly 3 onboarding tasks") {
            "Task 1: Explore routing - Look at the router setup - Type: explore - File: router.ts\n\
             Task 2: Run the linter - Keep the tree clean - Type: terminal\n\
             Task 3: Ownership question - Find out who owns deploys"
                .to_string()
        } else if prompt.contains("Evaluate a new hire's answer") {
            "90/100 — clear and complete.".to_string()
        } else if prompt.contains("finished onboarding") {
            "You made it through — welcome to the team!".to_string()
        } else {
            "Here's a nudge in the right direction.".to_string()
        };
        Ok(CompletionResponse {
            content,
            total_tokens: 20,
        })
    }

    fn model_name(&self) -> &str {
        "routed"
    }
}

fn inputs() -> SessionInputs {
    SessionInputs {
        user_id: "new-hire".into(),
        repository_name: "web-app".into(),
        user_role: "backend developer".into(),
        user_level: "beginner".into(),
        repositories: vec!["web-app".into()],
        ai_personality: "mentor".into(),
    }
}

/// Complete whatever task is current through the path its kind demands.
async fn resolve_current(manager: &mut SessionManager) {
    manager.activate_current().await;
    let task = manager
        .session()
        .current_task()
        .expect("a current task")
        .clone();
    match task.kind {
        TaskKind::Terminal => {
            let issued = task.command.clone().unwrap_or_else(|| "make it so".into());
            let output = task.expected_output.clone().unwrap_or_else(|| "done".into());
            let report = CommandReport::for_task(&task, &issued, &output);
            assert!(report.succeeded, "simulated run should satisfy {}", task.id);
            assert!(manager.report_command(&report).await);
        }
        TaskKind::Qa if task.question.is_some() => {
            let evaluation = manager
                .answer_question(&task.id, "a thorough answer")
                .await
                .unwrap();
            assert!(evaluation.is_correct);
            assert_eq!(evaluation.score, 90);
        }
        TaskKind::Quiz => {
            let quiz = task.quiz.clone().unwrap();
            let outcome = manager
                .submit_quiz(&task.id, quiz.correct_answer)
                .await
                .unwrap();
            assert!(matches!(
                outcome,
                onboard::session::QuizOutcome::Correct { .. }
            ));
        }
        _ => manager.acknowledge(&task.id).await.unwrap(),
    }
}

#[tokio::test]
async fn full_session_walk() {
    let store = Arc::new(MemoryStore::new());
    let mut manager = SessionManager::start_or_resume(
        inputs(),
        Arc::new(RoutedProvider),
        store.clone(),
        QuizPolicy::default(),
    )
    .await;

    // Catalog shape: fixed pair, backend track, then the AI batch.
    let ids: Vec<String> = manager.session().tasks.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids[0], WELCOME_TASK_ID);
    assert_eq!(ids[1], SETUP_TASK_ID);
    assert!(ids.contains(&"ai-generated-1".to_string()));
    assert!(ids.contains(&"ai-generated-3".to_string()));

    let ai_explore = manager.session().task("ai-generated-1").unwrap();
    assert_eq!(ai_explore.kind, TaskKind::Explore);
    assert_eq!(ai_explore.file.as_deref(), Some("router.ts"));
    assert_eq!(ai_explore.prerequisites, vec![SETUP_TASK_ID.to_string()]);

    let total = manager.session().tasks.len();
    assert_eq!(manager.progress().total, total);
    assert_eq!(manager.progress().completed, 0);

    // A hint is available from the first task on.
    let hint = manager.hint_for_current().await;
    assert_eq!(hint, "Here's a nudge in the right direction.");

    // Walk the whole curriculum.
    while !manager.session().is_complete() {
        resolve_current(&mut manager).await;
    }

    let progress = manager.progress();
    assert_eq!(progress.completed, total);
    assert_eq!(progress.percentage, 100);
    assert_eq!(progress.estimated_minutes_remaining, 0);
    assert_eq!(manager.session().completed_tasks.len(), total);
    assert!(manager
        .session()
        .tasks
        .iter()
        .all(|t| t.status == TaskStatus::Completed));

    // The audit trail recorded the terminal runs.
    assert!(manager
        .session()
        .session_notes
        .iter()
        .any(|n| n.contains("(ok)")));

    // Personalized closing message from the service.
    let closing = manager.closing_message().await;
    assert_eq!(closing, "You made it through — welcome to the team!");

    // The finished session was persisted.
    let stored = store.load("new-hire").await.unwrap().unwrap();
    assert_eq!(stored.completed_tasks.len(), total);
}

#[tokio::test]
async fn skipping_a_chain_task_blocks_its_successors() {
    let mut manager = SessionManager::start_or_resume(
        inputs(),
        Arc::new(RoutedProvider),
        Arc::new(MemoryStore::new()),
        QuizPolicy::default(),
    )
    .await;

    // Skip the setup task: everything downstream is gated on it.
    manager.acknowledge(WELCOME_TASK_ID).await.unwrap();
    manager.skip(SETUP_TASK_ID).await.unwrap();

    // No startable pending task remains, which reads as the terminal
    // signal even though most of the catalog is still pending.
    assert!(manager.session().is_complete());
    assert!(!manager
        .session()
        .completed_tasks
        .contains(SETUP_TASK_ID));
    assert!(manager.progress().completed < manager.progress().total);
}

#[tokio::test]
async fn stale_generative_results_are_detectable_after_restart() {
    let mut manager = SessionManager::start_or_resume(
        inputs(),
        Arc::new(RoutedProvider),
        Arc::new(MemoryStore::new()),
        QuizPolicy::default(),
    )
    .await;

    // A caller issues a tag alongside a generative call, then the user
    // restarts before the response lands. The tag no longer matches, so
    // the caller must drop the result instead of applying it.
    let tag = manager.issue_tag();
    manager.restart().await;
    assert!(!manager.is_current(&tag));
}
