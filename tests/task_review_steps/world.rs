//! Shared world state for the task review scenarios.

use super::helpers::Harness;
use brigade::conversation::Replies;
use brigade::task::domain::{Task, TaskId};
use rstest::fixture;

/// Scenario world: the harness is assembled by the first Given step.
#[derive(Default)]
pub struct ReviewWorld {
    pub harness: Option<Harness>,
    pub task_id: Option<TaskId>,
    pub last_replies: Replies,
}

impl ReviewWorld {
    /// Returns the assembled harness.
    ///
    /// # Errors
    ///
    /// Returns an error when no Given step assembled the team.
    pub fn harness(&self) -> eyre::Result<&Harness> {
        self.harness
            .as_ref()
            .ok_or_else(|| eyre::eyre!("team not assembled in scenario world"))
    }

    /// Returns the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was created yet.
    pub fn task_id(&self) -> eyre::Result<TaskId> {
        self.task_id
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Reloads the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when the world is incomplete.
    pub fn task(&self) -> eyre::Result<Task> {
        let harness = self.harness()?;
        let id = self.task_id()?;
        Ok(run_async(harness.task(id)))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReviewWorld {
    ReviewWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
