//! Command-execution boundary.
//!
//! The simulated terminal UI reports executions to the engine. The
//! substring-match policy lives HERE, at the boundary: a report's
//! `succeeded` flag already accounts for "did this match the task's
//! expected command and output". The engine consumes the verdict as-is.

use serde::{Deserialize, Serialize};

use crate::catalog::task::Task;

/// One command execution as reported by the terminal surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReport {
    pub command: String,
    pub output: String,
    pub succeeded: bool,
}

impl CommandReport {
    /// Build a report for `task`, applying the match policy: the task's
    /// `command` must appear in the issued text and its `expected_output`
    /// in the produced output, both case-insensitively. A missing
    /// expectation is vacuously satisfied.
    pub fn for_task(task: &Task, issued: &str, output: &str) -> Self {
        Self {
            command: issued.to_string(),
            output: output.to_string(),
            succeeded: command_satisfies(task, issued, output),
        }
    }
}

/// The match policy itself, usable standalone by other surfaces.
pub fn command_satisfies(task: &Task, issued: &str, output: &str) -> bool {
    let command_ok = match &task.command {
        Some(expected) => contains_ignore_case(issued, expected),
        None => true,
    };
    let output_ok = match &task.expected_output {
        Some(expected) => contains_ignore_case(output, expected),
        None => true,
    };
    command_ok && output_ok
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::task::TaskKind;

    fn terminal_task() -> Task {
        Task::new("t", "Run tests", "Run the suite", TaskKind::Terminal)
            .with_command("npm test", "passing")
    }

    #[test]
    fn both_conditions_must_hold() {
        let task = terminal_task();
        assert!(command_satisfies(&task, "npm test", "12 passing"));
        assert!(!command_satisfies(&task, "npm test", "3 failing"));
        assert!(!command_satisfies(&task, "npm run dev", "12 passing"));
    }

    #[test]
    fn matching_is_case_insensitive_containment() {
        let task = terminal_task();
        assert!(command_satisfies(&task, "NPM TEST --watch", "All Passing!"));
        assert!(command_satisfies(&task, "cd app && npm test", "ok, passing"));
    }

    #[test]
    fn missing_expectations_are_vacuous() {
        let task = Task::new("t", "T", "D", TaskKind::Terminal);
        assert!(command_satisfies(&task, "anything", "whatever"));
    }

    #[test]
    fn report_carries_the_verdict() {
        let task = terminal_task();
        let report = CommandReport::for_task(&task, "npm test", "5 passing");
        assert!(report.succeeded);
        assert_eq!(report.command, "npm test");

        let report = CommandReport::for_task(&task, "ls", "README.md");
        assert!(!report.succeeded);
    }
}
