//! Service configuration.
//!
//! One section per collaborator, mirroring what each real client needs:
//! addresses, connect/read/write timeouts, and pool sizes. The in-memory
//! collaborators used in tests ignore the network fields; the key, broker,
//! coordination, and buffer sections drive the core directly.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Opaque-key codec and counter-key settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Tag prepended to every issued key.
    pub tag: String,
    /// Shared secret the reversible key transform is derived from.
    pub secret: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            tag: "bv_".to_string(),
            secret: "binvault-dev-secret".to_string(),
        }
    }
}

/// Counter-service shard pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Address of the shard issuing even ids.
    pub even_addr: String,
    /// Address of the shard issuing odd ids.
    pub odd_addr: String,
    /// Connect timeout per call, milliseconds.
    pub conn_timeout_ms: u64,
    /// Read timeout per call, milliseconds.
    pub read_timeout_ms: u64,
    /// Write timeout per call, milliseconds.
    pub write_timeout_ms: u64,
    /// Idle connections kept per shard.
    pub min_conns: usize,
    /// Connection ceiling per shard.
    pub max_conns: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            even_addr: "127.0.0.1:6379".to_string(),
            odd_addr: "127.0.0.1:6380".to_string(),
            conn_timeout_ms: 200,
            read_timeout_ms: 200,
            write_timeout_ms: 200,
            min_conns: 2,
            max_conns: 16,
        }
    }
}

/// Document-store settings, shared shape for the dedup and cold-tier
/// collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Server addresses.
    pub servers: Vec<String>,
    /// Connect timeout, milliseconds.
    pub conn_timeout_ms: u64,
    /// Per-operation timeout, milliseconds.
    pub op_timeout_ms: u64,
    /// Connection pool ceiling.
    pub pool_size: usize,
    /// Database name.
    pub db_name: String,
    /// Collection name.
    pub collection: String,
    /// Write acknowledgment level.
    pub write_concern: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            servers: vec!["127.0.0.1:27017".to_string()],
            conn_timeout_ms: 500,
            op_timeout_ms: 1000,
            pool_size: 32,
            db_name: "binvault".to_string(),
            collection: "objects".to_string(),
            write_concern: 1,
        }
    }
}

/// Partitioned log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker addresses.
    pub servers: Vec<String>,
    /// Topic all records land on.
    pub topic: String,
    /// Capacity of the internal produce queue.
    pub queue_capacity: usize,
    /// Partition ranges excluded from writes, e.g. `"7"` or `"3-5"`.
    pub write_disabled_partitions: Vec<String>,
    /// Connect timeout, milliseconds.
    pub conn_timeout_ms: u64,
    /// Read timeout, milliseconds.
    pub read_timeout_ms: u64,
    /// Write timeout, milliseconds.
    pub write_timeout_ms: u64,
    /// Largest record accepted, bytes.
    pub max_message_size: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            servers: vec!["127.0.0.1:9092".to_string()],
            topic: "binvault".to_string(),
            queue_capacity: 64,
            write_disabled_partitions: Vec::new(),
            conn_timeout_ms: 1000,
            read_timeout_ms: 3000,
            write_timeout_ms: 3000,
            max_message_size: 4 * 1024 * 1024,
        }
    }
}

/// Coordination-service settings for the tier router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// Coordination service hosts.
    pub hosts: Vec<String>,
    /// Tree chroot prefix (may be empty).
    pub chroot: String,
    /// Consumer group the migration consumer commits under.
    pub consumer_name: String,
    /// Session timeout, milliseconds.
    pub session_timeout_ms: u64,
    /// Sleep between successful boundary refreshes, milliseconds.
    pub refresh_interval_ms: u64,
    /// Shorter sleep after a failed refresh, milliseconds.
    pub retry_interval_ms: u64,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["127.0.0.1:2181".to_string()],
            chroot: String::new(),
            consumer_name: "binvault".to_string(),
            session_timeout_ms: 10_000,
            refresh_interval_ms: 10_000,
            retry_interval_ms: 1_000,
        }
    }
}

/// Scratch-buffer pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity ceiling above which returned buffers are discarded.
    pub max_retained_size: usize,
    /// Maximum number of idle buffers kept.
    pub max_pooled: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_retained_size: 2 * 1024 * 1024,
            max_pooled: 64,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Key codec and counter-key settings.
    pub keys: KeyConfig,
    /// Counter shard settings.
    pub counters: CounterConfig,
    /// Dedup collection settings.
    pub dedup: StoreConfig,
    /// Cold-tier collection settings.
    pub store: StoreConfig,
    /// Partitioned log settings.
    pub broker: BrokerConfig,
    /// Coordination settings.
    pub coordination: CoordinationConfig,
    /// Scratch-buffer pool settings.
    pub buffers: BufferConfig,
}

impl ServiceConfig {
    /// Loads configuration from a TOML or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => {
                let config: ServiceConfig = toml::from_str(&contents)?;
                Ok(config)
            }
            "json" => {
                let config: ServiceConfig = serde_json::from_str(&contents)?;
                Ok(config)
            }
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        }
    }

    /// Boundary refresh interval as a duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.coordination.refresh_interval_ms)
    }

    /// Boundary refresh retry interval as a duration.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.coordination.retry_interval_ms)
    }
}
