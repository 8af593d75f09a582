//! Diesel schema for task, code location, and implementation tables.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional free-form description.
        description -> Nullable<Text>,
        /// Priority from 1 to 5.
        priority -> Int4,
        /// Complexity from 1 to 5.
        complexity -> Int4,
        /// Lifecycle status in storage form.
        #[max_length = 50]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Source spans attributed to tasks.
    code_locations (id) {
        /// Code location identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Repository-relative file path.
        #[max_length = 1024]
        file_path -> Varchar,
        /// First line of the span.
        start_line -> Int4,
        /// Optional last line of the span.
        end_line -> Nullable<Int4>,
        /// Branch the span was recorded on.
        #[max_length = 200]
        branch_name -> Nullable<Varchar>,
        /// Commit the span was recorded at.
        #[max_length = 64]
        commit_ref -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recorded implementation attempts.
    implementations (id) {
        /// Implementation identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Free-text pattern label.
        #[max_length = 100]
        pattern_type -> Varchar,
        /// Free-text pattern payload.
        pattern_data -> Text,
        /// Optional rating from 0 to 1.
        success_rating -> Nullable<Float8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(code_locations -> tasks (task_id));
diesel::joinable!(implementations -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, code_locations, implementations);
