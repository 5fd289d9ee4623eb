//! Provider registry abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use dnsflow_provider::DnsProvider;

/// Provider Registry Trait
///
/// Caches constructed vendor clients, indexed by provider id.
/// Entries must be dropped whenever the provider's credentials change.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// Register a client
    ///
    /// # Arguments
    /// * `provider_id` - Provider ID
    /// * `provider` - Vendor client
    async fn register(&self, provider_id: String, provider: Arc<dyn DnsProvider>);

    /// Drop a cached client
    ///
    /// # Arguments
    /// * `provider_id` - Provider ID
    async fn unregister(&self, provider_id: &str);

    /// Get a cached client
    async fn get(&self, provider_id: &str) -> Option<Arc<dyn DnsProvider>>;

    /// List all cached provider ids
    async fn list_provider_ids(&self) -> Vec<String>;
}

/// In-memory client cache
#[derive(Clone)]
pub struct InMemoryProviderRegistry {
    providers: Arc<RwLock<HashMap<String, Arc<dyn DnsProvider>>>>,
}

impl InMemoryProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderRegistry for InMemoryProviderRegistry {
    async fn register(&self, provider_id: String, provider: Arc<dyn DnsProvider>) {
        self.providers.write().await.insert(provider_id, provider);
    }

    async fn unregister(&self, provider_id: &str) {
        self.providers.write().await.remove(provider_id);
    }

    async fn get(&self, provider_id: &str) -> Option<Arc<dyn DnsProvider>> {
        self.providers.read().await.get(provider_id).cloned()
    }

    async fn list_provider_ids(&self) -> Vec<String> {
        self.providers.read().await.keys().cloned().collect()
    }
}
