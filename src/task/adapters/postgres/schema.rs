//! Diesel schema for task persistence.

diesel::table! {
    /// Task records. A CHECK constraint keeps exactly one of
    /// `assignee_id` and `assigned_role_id` set.
    tasks (id) {
        /// Task identifier.
        id -> BigInt,
        /// Title.
        title -> Text,
        /// Optional description.
        description -> Nullable<Text>,
        /// Creator identity.
        creator_id -> Text,
        /// Direct assignee identity.
        assignee_id -> Nullable<Text>,
        /// Assigned role identifier.
        assigned_role_id -> Nullable<BigInt>,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Due instant.
        due_date -> Nullable<Timestamptz>,
        /// Reminder interval in minutes.
        notification_interval_minutes -> Nullable<Integer>,
        /// Last delivered interval reminder.
        last_notified_at -> Nullable<Timestamptz>,
        /// Denormalised `completed/total` counter.
        #[max_length = 32]
        progress -> Nullable<Varchar>,
        /// Task attachments as a JSON array of blob references.
        attachments -> Jsonb,
        /// Review report text.
        report_text -> Nullable<Text>,
        /// Review report attachments as a JSON array.
        report_attachments -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Completion timestamp.
        closed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Checklist items of a task.
    subtasks (id) {
        /// Subtask identifier.
        id -> BigInt,
        /// Owning task.
        task_id -> BigInt,
        /// Title.
        title -> Text,
        /// Completion flag.
        is_completed -> Bool,
        /// Completion timestamp, set exactly when the flag is.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Comments posted on tasks.
    task_comments (id) {
        /// Comment identifier.
        id -> BigInt,
        /// Owning task.
        task_id -> BigInt,
        /// Author identity.
        author_id -> Text,
        /// Comment body.
        body -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only task audit trail.
    task_history (id) {
        /// Entry identifier.
        id -> BigInt,
        /// Owning task.
        task_id -> BigInt,
        /// Actor identity.
        actor_id -> Text,
        /// Change kind.
        #[max_length = 32]
        action -> Varchar,
        /// Value before the change.
        old_value -> Nullable<Text>,
        /// Value after the change.
        new_value -> Nullable<Text>,
        /// Commit timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(subtasks -> tasks (task_id));
diesel::joinable!(task_comments -> tasks (task_id));
diesel::joinable!(task_history -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, subtasks, task_comments, task_history);
