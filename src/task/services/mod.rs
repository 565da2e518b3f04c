//! Application services for task ownership, access, and lifecycle.

mod access;
mod lifecycle;
mod resolver;

pub use access::{AccessDenied, AccessGuard, AccessRequirement, DeletePolicy, DenialReason};
pub use lifecycle::{
    CreateTaskRequest, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
pub use resolver::{AssignmentResolver, has_access};
