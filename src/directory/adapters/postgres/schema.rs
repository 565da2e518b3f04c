//! Diesel schema for users and roles.

diesel::table! {
    /// Registered users.
    users (id) {
        /// Transport identity.
        id -> Text,
        /// Transport username.
        username -> Nullable<Text>,
        /// First name.
        first_name -> Nullable<Text>,
        /// Last name.
        last_name -> Nullable<Text>,
        /// Administrator flag.
        is_admin -> Bool,
        /// IANA timezone name.
        #[max_length = 64]
        timezone -> Varchar,
        /// First working hour.
        work_start -> SmallInt,
        /// First hour after work.
        work_end -> SmallInt,
        /// Local date of the latest digest.
        last_summary_sent_on -> Nullable<Date>,
        /// Onboarding tutorial flag.
        tutorial_finished -> Bool,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role-groups.
    roles (id) {
        /// Role identifier.
        id -> BigInt,
        /// Role name.
        name -> Text,
        /// Role description.
        description -> Text,
    }
}

diesel::table! {
    /// Many-to-many role memberships.
    user_roles (user_id, role_id) {
        /// Member identity.
        user_id -> Text,
        /// Role identifier.
        role_id -> BigInt,
    }
}

diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));
diesel::allow_tables_to_appear_in_same_query!(users, roles, user_roles);
