use crate::store::SharedStore;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

/// Health check status for the load balancer
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub store_connected: bool,
    pub timestamp: i64,
}

impl HealthStatus {
    /// Only the store is probed; the moderation API being down degrades to
    /// `service_unavailable` verdicts rather than an unhealthy instance
    pub async fn check(store: &SharedStore) -> Self {
        let store_connected = match store.ping().await {
            Ok(up) => up,
            Err(e) => {
                warn!(error = %e, "Store health check failed");
                false
            }
        };

        Self {
            healthy: store_connected,
            store_connected,
            timestamp: Utc::now().timestamp(),
        }
    }
}
