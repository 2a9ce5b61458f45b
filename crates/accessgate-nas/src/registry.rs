//! Adapter selection by NAS device record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use accessgate_core::config::nas::NasConfig;
use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use accessgate_database::store::NasDeviceStore;

use crate::adapter::NasAdapter;
use crate::adapters::{HttpNasAdapter, SimulatedNasAdapter};
use crate::method::ConnectionMethod;

/// Maps connection methods to adapters and resolves the one for a NAS.
#[derive(Clone)]
pub struct NasAdapterRegistry {
    adapters: HashMap<ConnectionMethod, Arc<dyn NasAdapter>>,
    default_method: ConnectionMethod,
    devices: Arc<dyn NasDeviceStore>,
}

impl NasAdapterRegistry {
    /// Create an empty registry. The default method must be registered
    /// before the registry resolves anything.
    pub fn new(devices: Arc<dyn NasDeviceStore>, default_method: ConnectionMethod) -> Self {
        Self {
            adapters: HashMap::new(),
            default_method,
            devices,
        }
    }

    /// Build the registry described by the `nas` configuration section:
    /// the simulated adapter plus one HTTP bridge adapter per bridged method.
    pub fn from_config(config: &NasConfig, devices: Arc<dyn NasDeviceStore>) -> AppResult<Self> {
        let default_method: ConnectionMethod = config.default_method.parse()?;
        let mut registry = Self::new(devices, default_method);

        registry.register(
            ConnectionMethod::Simulated,
            Arc::new(SimulatedNasAdapter::new(&config.simulated)),
        );

        let timeout = Duration::from_millis(config.timeout_ms);
        for raw in &config.http.methods {
            let method: ConnectionMethod = raw.parse()?;
            registry.register(
                method,
                Arc::new(HttpNasAdapter::new(&config.http, method, timeout)?),
            );
        }

        if !registry.adapters.contains_key(&default_method) {
            return Err(AppError::configuration(format!(
                "No adapter available for default NAS method '{default_method}'"
            )));
        }

        info!(
            default_method = %default_method,
            methods = ?registry.methods(),
            "NAS adapter registry ready"
        );
        Ok(registry)
    }

    /// Bind an adapter to a method, replacing any previous binding.
    pub fn register(&mut self, method: ConnectionMethod, adapter: Arc<dyn NasAdapter>) {
        self.adapters.insert(method, adapter);
    }

    /// Registered methods.
    pub fn methods(&self) -> Vec<ConnectionMethod> {
        let mut methods: Vec<_> = self.adapters.keys().copied().collect();
        methods.sort_by_key(|m| m.as_str());
        methods
    }

    /// Resolve the adapter for the NAS at `nas_ip_address`.
    ///
    /// Unknown, disabled or malformed device records use the default method.
    /// A known device whose method has no adapter is an error, not a fallback.
    pub async fn resolve(
        &self,
        nas_ip_address: &str,
    ) -> AppResult<(ConnectionMethod, Arc<dyn NasAdapter>)> {
        let method = match self.devices.find_by_ip(nas_ip_address).await? {
            Some(device) if device.enabled => match device.connection_method.parse() {
                Ok(method) => method,
                Err(e) => {
                    warn!(
                        nas_ip = %nas_ip_address,
                        error = %e,
                        "Invalid connection method on NAS device, using default"
                    );
                    self.default_method
                }
            },
            _ => self.default_method,
        };

        self.adapters
            .get(&method)
            .cloned()
            .map(|adapter| (method, adapter))
            .ok_or_else(|| {
                AppError::adapter_rejected(format!(
                    "No NAS adapter registered for method '{method}'"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::config::nas::HttpBridgeConfig;
    use accessgate_database::MemoryStore;

    async fn store_with_devices() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_device("10.0.0.1", "lobby", "mikrotik", true)
            .await
            .expect("device");
        store
            .upsert_device("10.0.0.2", "pool", "ubiquiti", true)
            .await
            .expect("device");
        store
            .upsert_device("10.0.0.3", "old", "mikrotik", false)
            .await
            .expect("device");
        store
    }

    #[tokio::test]
    async fn test_resolves_by_device_method_with_default_fallback() {
        let store = store_with_devices().await;
        let config = NasConfig {
            http: HttpBridgeConfig {
                base_url: "http://bridge:9000".into(),
                methods: vec!["mikrotik".into()],
                auth_token: None,
            },
            ..NasConfig::default()
        };
        let registry = NasAdapterRegistry::from_config(&config, store).expect("registry");

        let (method, adapter) = registry.resolve("10.0.0.1").await.expect("resolve");
        assert_eq!(method, ConnectionMethod::Mikrotik);
        assert_eq!(adapter.name(), "mikrotik");

        let (method, _) = registry.resolve("192.168.1.1").await.expect("resolve");
        assert_eq!(method, ConnectionMethod::Simulated);

        let (method, _) = registry.resolve("10.0.0.3").await.expect("resolve");
        assert_eq!(method, ConnectionMethod::Simulated);

        let err = registry.resolve("10.0.0.2").await.err().expect("no ubiquiti adapter");
        assert_eq!(err.kind, accessgate_core::ErrorKind::AdapterRejected);
    }

    #[test]
    fn test_default_method_must_be_available() {
        let config = NasConfig {
            default_method: "direct".into(),
            ..NasConfig::default()
        };
        let store: Arc<dyn NasDeviceStore> = Arc::new(MemoryStore::new());
        assert!(NasAdapterRegistry::from_config(&config, store).is_err());
    }
}
