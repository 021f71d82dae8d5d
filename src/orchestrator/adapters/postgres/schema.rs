//! Diesel schema for orchestrator directory persistence.

diesel::table! {
    /// Registered fleet members keyed by derived identifier.
    orchestrators (id) {
        /// Derived `<cluster>-<machine_id>` identifier.
        #[max_length = 255]
        id -> Varchar,
        /// Cluster name.
        #[max_length = 128]
        cluster -> Varchar,
        /// Machine identifier within the cluster.
        #[max_length = 128]
        machine_id -> Varchar,
        /// Scope the orchestrator operates in.
        #[max_length = 255]
        scope -> Varchar,
        /// Liveness status.
        #[max_length = 20]
        status -> Varchar,
        /// Last heartbeat timestamp.
        last_heartbeat -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
