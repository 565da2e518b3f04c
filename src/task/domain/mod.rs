//! Domain model for tasks, subtasks, and their audit trail.
//!
//! The [`Task`] aggregate owns its subtasks and enforces every lifecycle
//! precondition before a mutation is handed to storage.

mod assignment;
mod attachment;
mod comment;
mod error;
mod ids;
mod status;
mod subtask;
mod task;

pub use assignment::Assignment;
pub use attachment::{BlobKind, BlobRef};
pub use comment::{HistoryAction, HistoryRecord, NewComment, TaskComment, TaskHistoryEntry};
pub use error::{ParseBlobKindError, ParseHistoryActionError, ParseTaskStatusError, TaskDomainError};
pub use ids::{CommentId, HistoryId, NotificationInterval, SubtaskId, TaskId};
pub use status::{TaskAction, TaskStatus};
pub use subtask::{Progress, Subtask, normalize_subtask_title};
pub use task::{NewTask, PersistedTaskData, Task, TaskReport};
