//! Diesel schema for sessions.

diesel::table! {
    /// One row per user inside a wizard.
    sessions (user_id) {
        /// Owner identity.
        user_id -> Text,
        /// Wizard step tag.
        #[max_length = 64]
        state -> Varchar,
        /// Flow payload.
        payload -> Jsonb,
        /// Wizard start.
        created_at -> Timestamptz,
        /// Last write.
        updated_at -> Timestamptz,
    }
}
