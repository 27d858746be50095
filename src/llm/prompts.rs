//! Prompt builders for the generative hint service.
//!
//! Every prompt threads the session's `ai_personality` label through for
//! tone; the label has no behavioral effect beyond wording. The static
//! fallback strings used when the service is unavailable also live here.

use crate::catalog::task::{Task, TaskKind};

/// System prompt establishing tone for all hint-service calls.
pub fn system_prompt(personality: &str) -> String {
    format!(
        "You are an onboarding {personality} for a new software engineer. \
         Be encouraging, concrete, and brief. Never reveal quiz answers \
         unless explicitly asked to."
    )
}

/// Prompt asking for a batch of three extra onboarding tasks.
///
/// The requested grammar matches what the batch parser accepts: one task
/// per line, segments separated by `" - "`, with optional `Type:` and
/// `File:` segments after the title and description.
pub fn task_batch_prompt(role: &str, level: &str, repository: &str) -> String {
    format!(
        "Generate exactly 3 onboarding tasks for a {level} {role} joining the \
         team that owns the \"{repository}\" repository.\n\
         Output one task per line, no other text, in this exact format:\n\
         Task 1: <title> - <description> - Type: <terminal|explore|qa|quiz> - File: <path>\n\
         The \"File:\" segment is optional and only for tasks that point at a \
         specific file. Keep titles under 8 words."
    )
}

/// Prompt for a hint on the current task.
pub fn hint_prompt(personality: &str, task: &Task) -> String {
    let nudge = match task.kind {
        TaskKind::Terminal => "They are stuck on which command to run.",
        TaskKind::Explore => "They are unsure what to look for in the file.",
        TaskKind::Qa | TaskKind::Quiz => "They need a nudge, not the answer.",
        TaskKind::CodeChallenge => "They need a pointer on where to start.",
        TaskKind::Interactive => "They want context on why this step matters.",
    };
    format!(
        "As their onboarding {personality}, give a 1-2 sentence hint for the \
         task \"{}\": {}. {nudge}",
        task.title, task.description
    )
}

/// Prompt scoring a free-text answer against the model answer.
pub fn evaluation_prompt(question: &str, expected: &str, answer: &str) -> String {
    format!(
        "Evaluate a new hire's answer.\n\
         Question: {question}\n\
         Model answer: {expected}\n\
         Their answer: {answer}\n\
         Reply with a score in the form \"NN/100\" on the first line, then \
         one sentence of feedback."
    )
}

/// Prompt for the personalized end-of-session message.
pub fn closing_prompt(personality: &str, elapsed_minutes: i64, struggled: &[String]) -> String {
    let struggles = if struggled.is_empty() {
        "none — they breezed through".to_string()
    } else {
        struggled.join(", ")
    };
    format!(
        "As their onboarding {personality}, write a short (2-3 sentence) \
         congratulations for a new hire who finished onboarding in \
         {elapsed_minutes} minutes. Tasks that took several attempts: \
         {struggles}. Mention one thing to revisit if any."
    )
}

/// Static hint used when the generative service is unavailable.
pub fn fallback_hint(task: &Task) -> String {
    match task.kind {
        TaskKind::Terminal => match &task.command {
            Some(command) => format!("Try running `{command}` in the terminal."),
            None => "Check the task description for the command to run.".to_string(),
        },
        TaskKind::Explore => match &task.file {
            Some(file) => format!("Open `{file}` and skim its top-level structure first."),
            None => "Start from the repository's entry point and follow the imports.".to_string(),
        },
        TaskKind::Qa => "Re-read the task description; the answer is in what you just explored."
            .to_string(),
        TaskKind::Quiz => "Eliminate the options that contradict what you saw in the code."
            .to_string(),
        TaskKind::CodeChallenge => "Start from the starter code and make the first test pass."
            .to_string(),
        TaskKind::Interactive => "Read through the step and mark it done when you are ready."
            .to_string(),
    }
}

/// Static closing message used when the generative service is unavailable.
pub const CLOSING_FALLBACK: &str =
    "Congratulations — you completed your onboarding session! You are ready \
     to pick up your first real task.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::task::Task;

    #[test]
    fn batch_prompt_embeds_inputs_and_grammar() {
        let prompt = task_batch_prompt("frontend", "beginner", "web-app");
        assert!(prompt.contains("beginner frontend"));
        assert!(prompt.contains("\"web-app\""));
        assert!(prompt.contains("Task 1:"));
        assert!(prompt.contains("Type:"));
        assert!(prompt.contains("File:"));
    }

    #[test]
    fn evaluation_prompt_embeds_all_three_strings() {
        let prompt = evaluation_prompt("Q?", "expected text", "their text");
        assert!(prompt.contains("Q?"));
        assert!(prompt.contains("expected text"));
        assert!(prompt.contains("their text"));
        assert!(prompt.contains("NN/100"));
    }

    #[test]
    fn hint_prompt_mentions_task() {
        let task = Task::new("t", "Explore routing", "Look at the router", TaskKind::Explore);
        let prompt = hint_prompt("mentor", &task);
        assert!(prompt.contains("Explore routing"));
        assert!(prompt.contains("mentor"));
    }

    #[test]
    fn fallback_hint_uses_payload() {
        let task = Task::new("t", "Run it", "Run the dev server", TaskKind::Terminal)
            .with_command("npm run dev", "ready");
        assert!(fallback_hint(&task).contains("npm run dev"));

        let task = Task::new("t", "Read it", "Read the router", TaskKind::Explore)
            .with_file("src/router.ts");
        assert!(fallback_hint(&task).contains("src/router.ts"));
    }

    #[test]
    fn closing_prompt_lists_struggles() {
        let prompt = closing_prompt("mentor", 42, &["Quiz: routing".to_string()]);
        assert!(prompt.contains("42 minutes"));
        assert!(prompt.contains("Quiz: routing"));

        let prompt = closing_prompt("mentor", 5, &[]);
        assert!(prompt.contains("breezed"));
    }
}
