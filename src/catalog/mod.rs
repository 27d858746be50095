//! Curriculum catalog — the task model, the builder, and the batch parser.

pub mod builder;
pub mod parser;
pub mod task;

pub use builder::{build_fixed_catalog, CatalogRequest, RoleTrack, SETUP_TASK_ID, WELCOME_TASK_ID};
pub use task::{CodeChallenge, Difficulty, Quiz, Task, TaskKind, TaskStatus};
