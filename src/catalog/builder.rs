//! Catalog construction — fixed tasks, role tracks, and AI enrichment.
//!
//! The fixed portion (welcome, environment setup, role track) is pure and
//! deterministic: identical inputs always produce an identical catalog.
//! The enrichment step appends an AI-generated batch when the generative
//! service cooperates and a static fallback pair when it does not; failure
//! of enrichment shrinks the curriculum but never aborts construction.

use crate::catalog::parser;
use crate::catalog::task::{Difficulty, Quiz, Task, TaskKind};
use crate::llm::{prompts, ChatMessage, CompletionRequest, GenerativeProvider};

/// Id of the fixed welcome task.
pub const WELCOME_TASK_ID: &str = "welcome";
/// Id of the fixed environment-setup task. Also the anchor every
/// enrichment chain (AI batch or fallback pair) hangs off.
pub const SETUP_TASK_ID: &str = "setup-environment";

/// Inputs the catalog is personalized from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub repository_name: String,
    pub role: String,
    pub level: String,
    pub repositories: Vec<String>,
}

/// The nine role tracks a normalized role string maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTrack {
    Frontend,
    Backend,
    FullStack,
    Devops,
    ProductManager,
    Designer,
    Qa,
    Mobile,
    General,
}

impl RoleTrack {
    /// Total mapping from a free-form role string to a track.
    ///
    /// Case-insensitive, tolerant of separators and the common synonyms
    /// ("frontend developer", "sre", "pm", "sdet", ...). Anything
    /// unrecognized, including an empty role, lands on `General`.
    pub fn from_role(role: &str) -> Self {
        let normalized = role.to_lowercase().replace(['-', '_', '/'], " ");
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        let has = |candidates: &[&str]| tokens.iter().any(|t| candidates.contains(t));

        if has(&["fullstack"]) || (has(&["full"]) && has(&["stack"])) {
            RoleTrack::FullStack
        } else if has(&["frontend", "front", "fe"]) {
            RoleTrack::Frontend
        } else if has(&["backend", "back", "be"]) {
            RoleTrack::Backend
        } else if has(&["devops", "sre", "platform", "infrastructure", "reliability"]) {
            RoleTrack::Devops
        } else if has(&["designer", "design", "ux", "ui"]) {
            RoleTrack::Designer
        } else if has(&["pm", "product", "owner"]) {
            RoleTrack::ProductManager
        } else if has(&["qa", "tester", "sdet", "quality"]) {
            RoleTrack::Qa
        } else if has(&["mobile", "ios", "android"]) {
            RoleTrack::Mobile
        } else {
            RoleTrack::General
        }
    }
}

impl std::fmt::Display for RoleTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::FullStack => "full-stack",
            Self::Devops => "devops",
            Self::ProductManager => "product-manager",
            Self::Designer => "designer",
            Self::Qa => "qa",
            Self::Mobile => "mobile",
            Self::General => "general",
        };
        write!(f, "{s}")
    }
}

/// Build the deterministic portion of the catalog: welcome, setup, track.
pub fn build_fixed_catalog(request: &CatalogRequest) -> Vec<Task> {
    let track = RoleTrack::from_role(&request.role);
    let mut tasks = vec![welcome_task(request), setup_task(track)];
    tasks.extend(track_tasks(track, &request.level, &request.repository_name));
    tasks
}

/// Build the full catalog: fixed portion plus enrichment.
///
/// This is the containment boundary for the generative service — no error
/// from it escapes. On any failure (or an empty parse) the fallback pair
/// is appended instead of the AI batch.
pub async fn build(request: &CatalogRequest, provider: &dyn GenerativeProvider) -> Vec<Task> {
    let mut tasks = build_fixed_catalog(request);
    let track = RoleTrack::from_role(&request.role);

    let prompt =
        prompts::task_batch_prompt(&request.role, &request.level, &request.repository_name);
    let completion = provider
        .complete(CompletionRequest::new(vec![ChatMessage::user(prompt)]).with_max_tokens(400))
        .await;

    match completion {
        Ok(response) => {
            let batch = parser::parse(&response.content);
            if batch.is_empty() {
                tracing::warn!("generative batch parsed to zero tasks, using fallback pair");
                tasks.extend(fallback_pair(track));
            } else {
                tasks.extend(chain_batch(batch));
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "generative batch failed, using fallback pair");
            tasks.extend(fallback_pair(track));
        }
    }

    validate(&mut tasks);
    tasks
}

/// Chain an accepted AI batch: first task hangs off the fixed anchor,
/// every later task off its predecessor.
fn chain_batch(mut batch: Vec<Task>) -> Vec<Task> {
    let mut previous = SETUP_TASK_ID.to_string();
    for task in &mut batch {
        task.prerequisites = vec![previous.clone()];
        previous = task.id.clone();
    }
    batch
}

/// Drop prerequisite references that cannot be satisfied: unknown ids
/// (e.g. an AI task whose line was dropped by the parser) and
/// self-references. Keeps `next_available` from stalling on a dangling
/// edge.
pub fn validate(tasks: &mut [Task]) {
    let ids: std::collections::BTreeSet<String> =
        tasks.iter().map(|t| t.id.clone()).collect();
    for task in tasks.iter_mut() {
        let before = task.prerequisites.len();
        let id = task.id.clone();
        task.prerequisites
            .retain(|p| p != &id && ids.contains(p));
        if task.prerequisites.len() != before {
            tracing::warn!(task = %id, "pruned unsatisfiable prerequisites");
        }
    }
}

fn welcome_task(request: &CatalogRequest) -> Task {
    let scope = if request.repositories.len() > 1 {
        format!(
            "the {} repository (one of {} you will work with)",
            request.repository_name,
            request.repositories.len()
        )
    } else {
        format!("the {} repository", request.repository_name)
    };
    Task::new(
        WELCOME_TASK_ID,
        "Welcome aboard",
        format!(
            "This guided session walks you through {scope}. Work through the \
             checklist on the left; each step unlocks the next."
        ),
        TaskKind::Interactive,
    )
    .with_estimate(5)
    .with_difficulty(Difficulty::Easy)
}

fn setup_task(track: RoleTrack) -> Task {
    let (command, expected, hint) = match track {
        RoleTrack::Devops => (
            "docker --version",
            "Docker version",
            "Confirm the container tooling is available before anything else.",
        ),
        RoleTrack::ProductManager | RoleTrack::General => (
            "git status",
            "On branch",
            "Make sure you can see the working tree before diving in.",
        ),
        RoleTrack::Mobile => (
            "npm install",
            "added",
            "Install the JS dependencies the mobile shell is built from.",
        ),
        _ => (
            "npm install",
            "added",
            "Install the project dependencies so the dev tooling works.",
        ),
    };
    Task::new(
        SETUP_TASK_ID,
        "Set up your environment",
        format!("{hint} Run the command in the terminal below."),
        TaskKind::Terminal,
    )
    .with_estimate(10)
    .with_difficulty(Difficulty::Easy)
    .with_command(command, expected)
}

/// Difficulty of the dense exploration task in each track. Beginners get
/// it rated harder; the content is the same.
fn exploration_difficulty(level: &str) -> Difficulty {
    if level.trim().eq_ignore_ascii_case("beginner") {
        Difficulty::Hard
    } else {
        Difficulty::Medium
    }
}

/// The role track: 2-4 tasks forming a linear prerequisite chain whose
/// head requires the setup task.
fn track_tasks(track: RoleTrack, level: &str, repository: &str) -> Vec<Task> {
    let explore_difficulty = exploration_difficulty(level);
    let tasks = match track {
        RoleTrack::Frontend => vec![
            Task::new(
                "frontend-components",
                "Tour the component tree",
                format!("Open the root component of {repository} and trace how the page is assembled from child components."),
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_difficulty(explore_difficulty)
            .with_file("src/components/App.tsx"),
            Task::new(
                "frontend-dev-server",
                "Start the dev server",
                "Bring up the local dev server and confirm it serves the app.",
                TaskKind::Terminal,
            )
            .with_estimate(10)
            .with_difficulty(Difficulty::Easy)
            .with_command("npm run dev", "Local:"),
            Task::new(
                "frontend-state-quiz",
                "Quiz: where does state live?",
                "Check your mental model of the app's state management.",
                TaskKind::Quiz,
            )
            .with_estimate(5)
            .with_quiz(Quiz {
                question: "Where does shared UI state live in this app?".into(),
                options: vec![
                    "In each component's local state".into(),
                    "In the central store under src/store".into(),
                    "In the router configuration".into(),
                    "In CSS custom properties".into(),
                ],
                correct_answer: 1,
                explanation: "Shared state is kept in the central store; components subscribe to slices of it.".into(),
            }),
        ],
        RoleTrack::Backend => vec![
            Task::new(
                "backend-routes",
                "Map the API surface",
                format!("Read the route definitions of {repository} and note which handlers touch the database."),
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_difficulty(explore_difficulty)
            .with_file("src/api/routes.ts"),
            Task::new(
                "backend-tests",
                "Run the API test suite",
                "Run the tests and confirm the suite is green before you change anything.",
                TaskKind::Terminal,
            )
            .with_estimate(10)
            .with_difficulty(Difficulty::Easy)
            .with_command("npm test", "passing"),
            Task::new(
                "backend-lifecycle",
                "Describe a request's lifecycle",
                "Explain what happens to a request between arrival and response.",
                TaskKind::Qa,
            )
            .with_estimate(10)
            .with_question(
                "Walk through what happens to an incoming request, from route matching to the response being sent.",
                "The router matches the path, middleware handles auth and validation, the handler calls the service layer, and the serialized result is written back.",
            ),
        ],
        RoleTrack::FullStack => vec![
            Task::new(
                "fullstack-frontend",
                "Tour the component tree",
                "Start on the client: trace how the root component assembles the page.",
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_difficulty(explore_difficulty)
            .with_file("src/components/App.tsx"),
            Task::new(
                "fullstack-backend",
                "Map the API surface",
                "Now the server: read the route definitions the client calls into.",
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_file("src/api/routes.ts"),
            Task::new(
                "fullstack-dev-server",
                "Run the whole stack",
                "Start the dev server, which runs client and API together.",
                TaskKind::Terminal,
            )
            .with_estimate(10)
            .with_difficulty(Difficulty::Easy)
            .with_command("npm run dev", "Local:"),
            Task::new(
                "fullstack-contract",
                "Describe the client/server contract",
                "Explain how the client and server stay in sync about request shapes.",
                TaskKind::Qa,
            )
            .with_estimate(10)
            .with_question(
                "How does the client know what shape of data each API endpoint returns?",
                "Request and response types are shared from a common types module, so both sides compile against the same contract.",
            ),
        ],
        RoleTrack::Devops => vec![
            Task::new(
                "devops-pipeline",
                "Read the CI pipeline",
                format!("Open the CI workflow for {repository} and identify its stages and their triggers."),
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_difficulty(explore_difficulty)
            .with_file(".github/workflows/ci.yml"),
            Task::new(
                "devops-image",
                "Build the container image",
                "Build the production image locally to confirm the Dockerfile works.",
                TaskKind::Terminal,
            )
            .with_estimate(15)
            .with_command("docker build -t app .", "Successfully"),
            Task::new(
                "devops-stages-quiz",
                "Quiz: pipeline order",
                "Check you have the pipeline stages in the right order.",
                TaskKind::Quiz,
            )
            .with_estimate(5)
            .with_quiz(Quiz {
                question: "Which stage runs first on every push?".into(),
                options: vec![
                    "Lint and typecheck".into(),
                    "Integration tests".into(),
                    "Image build".into(),
                    "Deploy to staging".into(),
                ],
                correct_answer: 0,
                explanation: "Lint and typecheck gate everything else; later stages only run once they pass.".into(),
            }),
        ],
        RoleTrack::ProductManager => vec![
            Task::new(
                "pm-readme",
                "Read the product overview",
                format!("The README of {repository} covers what the product does and who it serves."),
                TaskKind::Explore,
            )
            .with_estimate(10)
            .with_difficulty(explore_difficulty)
            .with_file("README.md"),
            Task::new(
                "pm-user-flows",
                "Identify the critical user flow",
                "Name the flow that must never break and why.",
                TaskKind::Qa,
            )
            .with_estimate(10)
            .with_question(
                "Which user flow is most critical to this product, and what breaks downstream if it fails?",
                "Sign-up and first-session onboarding; if it fails, activation drops and every downstream metric follows.",
            ),
        ],
        RoleTrack::Designer => vec![
            Task::new(
                "designer-tokens",
                "Explore the design tokens",
                "The token file is the single source of truth for color, spacing, and type.",
                TaskKind::Explore,
            )
            .with_estimate(10)
            .with_difficulty(explore_difficulty)
            .with_file("src/styles/tokens.css"),
            Task::new(
                "designer-consistency",
                "Explain token usage",
                "Describe how tokens keep the UI consistent.",
                TaskKind::Qa,
            )
            .with_estimate(10)
            .with_question(
                "Why do components reference design tokens instead of raw color values?",
                "Tokens centralize the palette so a theme change is one edit, and they keep spacing and color consistent across components.",
            ),
        ],
        RoleTrack::Qa => vec![
            Task::new(
                "qa-e2e-specs",
                "Read an end-to-end spec",
                "The login spec shows the house style for e2e tests.",
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_difficulty(explore_difficulty)
            .with_file("tests/e2e/login.spec.ts"),
            Task::new(
                "qa-run-suite",
                "Run the test suite",
                "Run everything once to see the shape of a green build.",
                TaskKind::Terminal,
            )
            .with_estimate(10)
            .with_difficulty(Difficulty::Easy)
            .with_command("npm test", "passing"),
            Task::new(
                "qa-pyramid-quiz",
                "Quiz: the test pyramid",
                "Check where most of the coverage should live.",
                TaskKind::Quiz,
            )
            .with_estimate(5)
            .with_quiz(Quiz {
                question: "Which layer should hold the largest number of tests?".into(),
                options: vec![
                    "End-to-end browser tests".into(),
                    "Manual exploratory passes".into(),
                    "Unit tests".into(),
                    "Staging smoke tests".into(),
                ],
                correct_answer: 2,
                explanation: "Unit tests form the base of the pyramid; e2e tests are few and reserved for critical flows.".into(),
            }),
        ],
        RoleTrack::Mobile => vec![
            Task::new(
                "mobile-entry",
                "Tour the mobile entry point",
                "Trace how the mobile shell boots and mounts the first screen.",
                TaskKind::Explore,
            )
            .with_estimate(15)
            .with_difficulty(explore_difficulty)
            .with_file("mobile/App.tsx"),
            Task::new(
                "mobile-simulator",
                "Run the app in the simulator",
                "Start the simulator build and confirm the app boots.",
                TaskKind::Terminal,
            )
            .with_estimate(15)
            .with_command("npm run ios", "Simulator"),
            Task::new(
                "mobile-native-bridge",
                "Describe the native bridge",
                "Explain where native capabilities enter the JS world.",
                TaskKind::Qa,
            )
            .with_estimate(10)
            .with_question(
                "How does the JS side call into native device capabilities?",
                "Through the bridge modules under mobile/native, which expose typed wrappers over the platform APIs.",
            ),
        ],
        RoleTrack::General => vec![
            Task::new(
                "general-readme",
                "Read the project README",
                format!("Start with the README of {repository}: what it does, how to run it."),
                TaskKind::Explore,
            )
            .with_estimate(10)
            .with_difficulty(explore_difficulty)
            .with_file("README.md"),
            Task::new(
                "general-structure",
                "Describe the repository layout",
                "Summarize what lives where at the top level.",
                TaskKind::Qa,
            )
            .with_estimate(10)
            .with_question(
                "Describe the top-level layout of the repository and what each directory is for.",
                "src holds application code, tests holds the suites, and the workflow files under .github drive CI.",
            ),
        ],
    };
    chain_track(tasks)
}

/// Link a track into a linear chain anchored at the setup task.
fn chain_track(mut tasks: Vec<Task>) -> Vec<Task> {
    let mut previous = SETUP_TASK_ID.to_string();
    for task in &mut tasks {
        task.prerequisites = vec![previous.clone()];
        previous = task.id.clone();
    }
    tasks
}

/// Two role-flavored tasks appended when enrichment fails entirely:
/// one exploration, one reflection question, chained to the setup task.
fn fallback_pair(track: RoleTrack) -> Vec<Task> {
    let (file, focus) = match track {
        RoleTrack::Frontend | RoleTrack::Designer => ("src/components", "the component layer"),
        RoleTrack::Backend => ("src/api", "the API layer"),
        RoleTrack::FullStack => ("src", "both sides of the stack"),
        RoleTrack::Devops => (".github/workflows", "the delivery pipeline"),
        RoleTrack::Qa => ("tests", "the test suites"),
        RoleTrack::Mobile => ("mobile", "the mobile shell"),
        RoleTrack::ProductManager | RoleTrack::General => (".", "the project at large"),
    };
    vec![
        Task::new(
            "fallback-explore",
            "Explore on your own",
            format!("Spend a few minutes in {file} getting a feel for {focus}."),
            TaskKind::Explore,
        )
        .with_estimate(10)
        .with_file(file)
        .with_prerequisites([SETUP_TASK_ID]),
        Task::new(
            "fallback-reflection",
            "Note your first impressions",
            "Capture what made sense and what didn't.",
            TaskKind::Qa,
        )
        .with_estimate(5)
        .with_question(
            "What part of what you just explored was least obvious, and what would have made it clearer?",
            "Any honest reflection is acceptable; this primes the first conversation with your onboarding buddy.",
        )
        .with_prerequisites(["fallback-explore"]),
    ]
}
