//! Endpoint resolution. The bus endpoints have compiled defaults, overridden
//! by environment settings (an `.env` file is loaded by the binary before
//! this runs). Resolution happens once at startup; nodes copy what they need
//! at construction and never look again.

use std::env;

pub const DEFAULT_PUB_ENDPOINT: &str = "tcp://localhost:5678";
pub const DEFAULT_PULL_ENDPOINT: &str = "tcp://localhost:1234";

pub const PUB_ENDPOINT_KEY: &str = "OTSIM_PUB_ENDPOINT";
pub const PULL_ENDPOINT_KEY: &str = "OTSIM_PULL_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Where the bus broadcasts; the inbound node's SUB socket connects here.
    pub pub_endpoint: String,
    /// Where the bus collects updates; the outbound node's PUSH socket
    /// connects here.
    pub pull_endpoint: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            pub_endpoint: DEFAULT_PUB_ENDPOINT.to_string(),
            pull_endpoint: DEFAULT_PULL_ENDPOINT.to_string(),
        }
    }
}

impl BridgeSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            pub_endpoint: get(PUB_ENDPOINT_KEY).unwrap_or(defaults.pub_endpoint),
            pull_endpoint: get(PULL_ENDPOINT_KEY).unwrap_or(defaults.pull_endpoint),
        }
    }
}
