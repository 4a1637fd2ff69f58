use crate::config::{Config, StoreBackend};
use crate::gate::{Denylist, NameGate};
use crate::moderation::{ModerationClient, OpenAiTransport};
use crate::store::{MemoryStore, RedisStore, SharedStore};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<NameGate>,
    pub store: SharedStore,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Connect the store and wire the gate from configuration
    pub async fn new(config: &Config, metrics: PrometheusHandle) -> Result<Self> {
        let store: SharedStore = match &config.store {
            StoreBackend::Redis { url } => Arc::new(RedisStore::connect(url).await?),
            StoreBackend::Memory => {
                warn!("Using in-memory store; decisions and cooldowns are lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let denylist = match &config.denylist_path {
            Some(path) => Denylist::from_file(path)?,
            None => Denylist::default(),
        };
        info!(words = denylist.len(), "Denylist loaded");

        let transport = OpenAiTransport::new(
            config.moderation.endpoint.clone(),
            config.moderation.api_key.clone(),
            config.moderation.model.clone(),
        );
        let moderation = ModerationClient::new(Arc::new(transport), config.moderation.retry.clone());

        let gate = NameGate::new(store.clone(), Arc::new(denylist), config.cooldown, moderation);
        Ok(Self::from_parts(gate, store, metrics))
    }

    pub fn from_parts(gate: NameGate, store: SharedStore, metrics: PrometheusHandle) -> Self {
        Self {
            gate: Arc::new(gate),
            store,
            metrics,
        }
    }
}
