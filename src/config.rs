//! Immutable engine configuration.
//!
//! All tunables are fixed after startup; no other cross-request state
//! exists outside the store.

use std::time::Duration;

/// Configuration for the coordination server core.
///
/// Values are expressed in seconds to match their wire representation and
/// converted to [`Duration`] at the call sites that need arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Lease length granted to a claim when the caller does not ask for
    /// one.
    pub default_lease_duration_seconds: u64,
    /// Upper bound on caller-requested lease lengths.
    pub max_lease_duration_seconds: u64,
    /// Cadence at which orchestrators are expected to heartbeat.
    pub heartbeat_interval_seconds: u64,
    /// Silence window after which an orchestrator is marked offline.
    pub stale_orchestrator_timeout_seconds: u64,
    /// Page size applied to list queries without an explicit limit.
    pub default_page_size: i64,
    /// Hard ceiling on caller-requested page sizes.
    pub max_page_size: i64,
    /// Turns-used threshold that, combined with zero commits, routes a
    /// submission to `needs_continuation`.
    pub burnout_turn_threshold: i64,
    /// Absolute turns-used ceiling that routes a submission to
    /// `needs_continuation` regardless of commits.
    pub max_turn_limit: i64,
    /// Cadence of the lease reconciler sweep.
    pub reconciler_interval_seconds: u64,
}

impl CoordinatorConfig {
    /// Returns the default lease duration as a [`Duration`].
    #[must_use]
    pub const fn default_lease_duration(&self) -> Duration {
        Duration::from_secs(self.default_lease_duration_seconds)
    }

    /// Returns the maximum lease duration as a [`Duration`].
    #[must_use]
    pub const fn max_lease_duration(&self) -> Duration {
        Duration::from_secs(self.max_lease_duration_seconds)
    }

    /// Returns the stale-orchestrator timeout as a [`Duration`].
    #[must_use]
    pub const fn stale_orchestrator_timeout(&self) -> Duration {
        Duration::from_secs(self.stale_orchestrator_timeout_seconds)
    }

    /// Returns the reconciler cadence as a [`Duration`].
    #[must_use]
    pub const fn reconciler_interval(&self) -> Duration {
        Duration::from_secs(self.reconciler_interval_seconds)
    }

    /// Clamps a caller-requested lease duration to the configured bounds,
    /// substituting the default when absent.
    #[must_use]
    pub fn clamp_lease_duration(&self, requested_seconds: Option<u64>) -> Duration {
        let seconds = requested_seconds
            .unwrap_or(self.default_lease_duration_seconds)
            .min(self.max_lease_duration_seconds);
        Duration::from_secs(seconds)
    }

    /// Clamps a caller-requested page size to the configured bounds,
    /// substituting the default when absent.
    #[must_use]
    pub fn clamp_page_size(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(limit) if limit > 0 => limit.min(self.max_page_size),
            _ => self.default_page_size,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_lease_duration_seconds: 300,
            max_lease_duration_seconds: 3600,
            heartbeat_interval_seconds: 30,
            stale_orchestrator_timeout_seconds: 120,
            default_page_size: 50,
            max_page_size: 500,
            burnout_turn_threshold: 80,
            max_turn_limit: 100,
            reconciler_interval_seconds: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinatorConfig;
    use std::time::Duration;

    #[test]
    fn defaults_match_documented_constants() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.default_lease_duration_seconds, 300);
        assert_eq!(config.max_lease_duration_seconds, 3600);
        assert_eq!(config.stale_orchestrator_timeout_seconds, 120);
        assert_eq!(config.burnout_turn_threshold, 80);
        assert_eq!(config.max_turn_limit, 100);
    }

    #[test]
    fn lease_duration_clamps_to_maximum() {
        let config = CoordinatorConfig::default();
        assert_eq!(
            config.clamp_lease_duration(Some(7200)),
            Duration::from_secs(3600)
        );
        assert_eq!(config.clamp_lease_duration(None), Duration::from_secs(300));
        assert_eq!(
            config.clamp_lease_duration(Some(1)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn page_size_clamps_to_bounds() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.clamp_page_size(None), 50);
        assert_eq!(config.clamp_page_size(Some(0)), 50);
        assert_eq!(config.clamp_page_size(Some(-3)), 50);
        assert_eq!(config.clamp_page_size(Some(200)), 200);
        assert_eq!(config.clamp_page_size(Some(10_000)), 500);
    }
}
