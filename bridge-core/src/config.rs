// bridge-core/src/config.rs
// Bridge configuration: built-in defaults, optional bridge.toml, MT5_* environment

use crate::transport::endpoint::{Endpoint, DEFAULT_HOST, DEFAULT_PORT};
use bridge_common::errors::{BridgeError, BridgeResult};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BREAKER_THRESHOLD: u32 = 5;
pub const DEFAULT_BREAKER_RECOVERY_MS: u64 = 60_000;

/// Per-operation deadlines that differ from the default.
pub const OPERATION_TIMEOUTS_MS: &[(&str, u64)] = &[
    ("initialize", 180_000),
    ("login", 60_000),
    ("shutdown", 10_000),
    ("symbolsGet", 120_000),
    ("copyRatesFrom", 60_000),
    ("copyRatesFromPos", 60_000),
    ("copyRatesRange", 120_000),
    ("copyTicksFrom", 60_000),
    ("copyTicksRange", 120_000),
    ("orderSend", 60_000),
    ("historyOrdersTotal", 60_000),
    ("historyOrdersGet", 60_000),
    ("historyDealsTotal", 60_000),
    ("historyDealsGet", 60_000),
];

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TimeoutSettings {
    pub default_ms: u64,
    pub connect_ms: u64,
    pub health_ms: u64,
    /// Keyed by lower-cased wire name.
    #[serde(default)]
    pub per_operation: HashMap<String, u64>,
}

impl TimeoutSettings {
    /// Deadline for one contract call.
    pub fn for_operation(&self, operation: &str) -> Duration {
        let ms = self
            .per_operation
            .get(&operation.to_lowercase())
            .copied()
            .unwrap_or(self.default_ms);
        Duration::from_millis(ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn health(&self) -> Duration {
        Duration::from_millis(self.health_ms)
    }

    /// Same deadline for every call. Handy in tests.
    pub fn uniform(ms: u64) -> Self {
        Self {
            default_ms: ms,
            connect_ms: ms,
            health_ms: ms,
            per_operation: HashMap::new(),
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_CALL_TIMEOUT_MS,
            connect_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            health_ms: DEFAULT_HEALTH_TIMEOUT_MS,
            per_operation: OPERATION_TIMEOUTS_MS
                .iter()
                .map(|(op, ms)| (op.to_lowercase(), *ms))
                .collect(),
        }
    }
}

/// Consecutive transport failures before calls fail fast, and how long
/// they do so before one attempt is let through again.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub recovery_ms: u64,
}

impl BreakerSettings {
    pub fn recovery(&self) -> Duration {
        Duration::from_millis(self.recovery_ms)
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_BREAKER_THRESHOLD,
            recovery_ms: DEFAULT_BREAKER_RECOVERY_MS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Settings {
    pub endpoint: Endpoint,
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub breaker: BreakerSettings,
}

impl Settings {
    /// Defaults, then `bridge.toml` (if present), then `MT5_*` variables
    /// such as `MT5_ENDPOINT__PORT=18813`.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("bridge")
    }

    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("endpoint.host", DEFAULT_HOST)?
            .set_default("endpoint.port", DEFAULT_PORT as i64)?
            .set_default("timeouts.default_ms", DEFAULT_CALL_TIMEOUT_MS as i64)?
            .set_default("timeouts.connect_ms", DEFAULT_CONNECT_TIMEOUT_MS as i64)?
            .set_default("timeouts.health_ms", DEFAULT_HEALTH_TIMEOUT_MS as i64)?
            .set_default("breaker.failure_threshold", DEFAULT_BREAKER_THRESHOLD as i64)?
            .set_default("breaker.recovery_ms", DEFAULT_BREAKER_RECOVERY_MS as i64)?;

        for (op, ms) in OPERATION_TIMEOUTS_MS {
            builder = builder.set_default(
                format!("timeouts.per_operation.{}", op.to_lowercase()),
                *ms as i64,
            )?;
        }

        let s = builder
            .add_source(File::with_name(name).required(false))
            .add_source(
                Environment::with_prefix("MT5")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.timeouts.per_operation = settings
            .timeouts
            .per_operation
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(settings)
    }

    /// Loads and validates, mapping failures into the bridge error type.
    pub fn load() -> BridgeResult<Self> {
        let settings = Self::new().map_err(|e| BridgeError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> BridgeResult<()> {
        self.endpoint
            .validate()
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        let t = &self.timeouts;
        if t.default_ms == 0 || t.connect_ms == 0 || t.health_ms == 0 {
            return Err(BridgeError::Config("timeouts must be positive".into()));
        }
        if let Some((op, _)) = t.per_operation.iter().find(|(_, ms)| **ms == 0) {
            return Err(BridgeError::Config(format!("timeout for {} must be positive", op)));
        }
        if self.breaker.failure_threshold == 0 || self.breaker.recovery_ms == 0 {
            return Err(BridgeError::Config(
                "breaker threshold and recovery must be positive".into(),
            ));
        }
        Ok(())
    }
}
