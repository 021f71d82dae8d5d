//! Diesel schema for registry persistence.

diesel::table! {
    /// Registered agent roles keyed by name.
    roles (name) {
        /// Role name.
        #[max_length = 100]
        name -> Varchar,
        /// Default queue this role claims from.
        #[max_length = 100]
        claims_from -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Registered declarative pipelines keyed by name.
    flows (name) {
        /// Flow name.
        #[max_length = 100]
        name -> Varchar,
        /// Opaque flow configuration.
        config -> Jsonb,
    }
}
