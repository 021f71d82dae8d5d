//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Task records keyed by caller-supplied identity.
    tasks (id) {
        /// Caller-supplied opaque task identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Current lifecycle queue label.
        #[max_length = 100]
        queue -> Varchar,
        /// Priority class `P0`..`P3`; ascending sort puts `P0` first.
        #[max_length = 8]
        priority -> Varchar,
        /// Optional role classifier.
        #[max_length = 100]
        role -> Nullable<Varchar>,
        /// Optional type classifier.
        #[max_length = 100]
        task_type -> Nullable<Varchar>,
        /// Tenant partition key, indexed for visibility queries.
        #[max_length = 255]
        scope -> Varchar,
        /// Primary file the task concerns.
        file_path -> Text,
        /// Branch the task targets.
        #[max_length = 255]
        branch -> Varchar,
        /// Optional owning project.
        #[max_length = 255]
        project_id -> Nullable<Varchar>,
        /// Optional dependency that must reach `done` first.
        #[max_length = 255]
        blocked_by -> Nullable<Varchar>,
        /// Agent holding the current claim.
        #[max_length = 255]
        claimed_by -> Nullable<Varchar>,
        /// Claim grant timestamp.
        claimed_at -> Nullable<Timestamptz>,
        /// Fleet identity holding the current claim.
        #[max_length = 255]
        orchestrator_id -> Nullable<Varchar>,
        /// Absolute lease expiry.
        lease_expires_at -> Nullable<Timestamptz>,
        /// Optimistic-concurrency counter.
        version -> Int8,
        /// Submitted commit count.
        commits_count -> Nullable<Int8>,
        /// Submitted turn count.
        turns_used -> Nullable<Int8>,
        /// Submitted structured check results.
        check_results -> Nullable<Jsonb>,
        /// Submitted execution notes.
        execution_notes -> Nullable<Text>,
        /// Cumulative rejection tally.
        rejection_count -> Int8,
        /// Submission timestamp.
        submitted_at -> Nullable<Timestamptz>,
        /// Completion timestamp, set only via accept.
        completed_at -> Nullable<Timestamptz>,
        /// Pull request number surfaced in poll projections.
        pr_number -> Nullable<Int8>,
        /// Named sub-gates with per-gate status.
        hooks -> Jsonb,
        /// Declarative pipeline label.
        #[max_length = 100]
        flow -> Nullable<Varchar>,
        /// Per-task flow overrides.
        flow_overrides -> Nullable<Jsonb>,
        /// Whether review may be skipped by outer tooling.
        auto_accept -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only task event journal.
    task_history (id) {
        /// Surrogate row identifier.
        id -> Uuid,
        /// Task the entry belongs to; cascades on task deletion.
        #[max_length = 255]
        task_id -> Varchar,
        /// Recorded lifecycle event.
        #[max_length = 50]
        event -> Varchar,
        /// Agent or reviewer associated with the event.
        #[max_length = 255]
        agent -> Nullable<Varchar>,
        /// Structured event detail payload.
        details -> Nullable<Jsonb>,
        /// Append timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(task_history -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_history);
