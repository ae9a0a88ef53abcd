//! Metric name and label definitions.
//!
//! Every metric emitted by the workspace is named here so the set of exported
//! series is documented in one place.

/// Bridge membership metrics
pub mod bridges {
    /// Total number of successful bridge joins
    pub const JOINS_TOTAL: &str = "bridgekeeper_bridge_joins_total";
    /// Total number of successful bridge leaves
    pub const LEAVES_TOTAL: &str = "bridgekeeper_bridge_leaves_total";
    /// Total number of successful bridge resets
    pub const RESETS_TOTAL: &str = "bridgekeeper_bridge_resets_total";
    /// Membership operations that ended in an error, labelled by kind
    pub const MEMBERSHIP_ERRORS_TOTAL: &str = "bridgekeeper_bridge_membership_errors_total";
}

/// Platform adapter metrics
pub mod adapters {
    /// Number of adapters currently registered
    pub const REGISTERED: &str = "bridgekeeper_adapters_registered";
    /// Duration of `create_senddata` calls in seconds
    pub const SENDDATA_DURATION_SECONDS: &str = "bridgekeeper_adapter_senddata_duration_seconds";
}

/// Delivery cache metrics
pub mod cache {
    /// Cache lookups that found a live entry
    pub const HITS_TOTAL: &str = "bridgekeeper_delivery_cache_hits_total";
    /// Cache lookups that found nothing or an expired entry
    pub const MISSES_TOTAL: &str = "bridgekeeper_delivery_cache_misses_total";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const PLATFORM: &str = "platform";
}
