//! NAS adapter configuration.

use serde::{Deserialize, Serialize};

/// NAS adapter selection and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NasConfig {
    /// Upper bound for a single adapter call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connection method used when no device record matches the NAS address.
    #[serde(default = "default_method")]
    pub default_method: String,
    /// Known NAS devices.
    #[serde(default)]
    pub devices: Vec<NasDeviceSeed>,
    /// HTTP bridge adapter settings.
    #[serde(default)]
    pub http: HttpBridgeConfig,
    /// Simulated adapter settings.
    #[serde(default)]
    pub simulated: SimulatedAdapterConfig,
}

impl Default for NasConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            default_method: default_method(),
            devices: Vec::new(),
            http: HttpBridgeConfig::default(),
            simulated: SimulatedAdapterConfig::default(),
        }
    }
}

/// A NAS device declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NasDeviceSeed {
    /// NAS IP address as reported in accounting.
    pub nas_ip_address: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Connection method tag (e.g. `"mikrotik"`, `"simulated"`).
    pub connection_method: String,
    /// Disabled devices fall back to the default method.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Settings for forwarding control commands to an external adapter service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpBridgeConfig {
    /// Base URL of the adapter service. Empty disables the bridge.
    #[serde(default)]
    pub base_url: String,
    /// Connection methods routed through the bridge.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Bearer token sent with every bridge request.
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Outcome returned by the simulated adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedAdapterConfig {
    /// Whether the simulated NAS acknowledges commands.
    #[serde(default = "default_true")]
    pub acknowledge: bool,
    /// Artificial latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for SimulatedAdapterConfig {
    fn default() -> Self {
        Self {
            acknowledge: true,
            latency_ms: 0,
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_method() -> String {
    "simulated".to_string()
}

fn default_true() -> bool {
    true
}
