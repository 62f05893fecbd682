use sqlx::SqlitePool;

use crate::config::Config;

pub mod extra_completion;
pub mod house;
pub mod task;
pub mod task_completion;
pub mod task_group;
pub mod task_swap;
pub mod user;
pub mod weekly_assignment;
pub mod weekly_config;
pub mod weekly_score;

pub use extra_completion::*;
pub use house::*;
pub use task::*;
pub use task_completion::*;
pub use task_group::*;
pub use task_swap::*;
pub use user::*;
pub use weekly_assignment::*;
pub use weekly_config::*;
pub use weekly_score::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}
