//! Diesel schema for work-assignment persistence.

diesel::table! {
    /// Worker rows restricted to the columns this core reads.
    workers (id) {
        /// Worker identifier.
        id -> Uuid,
        /// Weekly-hours display target.
        expected_weekly_hours -> Nullable<Int4>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Work assignments and their occupancy windows.
    work_assignments (id) {
        /// Assignment identifier.
        id -> Uuid,
        /// Attached worker, if any.
        worker_id -> Nullable<Uuid>,
        /// Window start.
        start_time -> Timestamptz,
        /// Window length in whole minutes.
        duration_minutes -> Int8,
        /// Lifecycle state.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(work_assignments -> workers (worker_id));
diesel::allow_tables_to_appear_in_same_query!(work_assignments, workers);
