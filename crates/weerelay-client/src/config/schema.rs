use serde::Deserialize;

use weerelay_proto::{RelayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub session: SessionSection,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.relay.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// `host:port` of the relay listener.
    #[serde(default = "default_address")]
    pub address: String,

    /// Pre-shared credential passed verbatim on the wire.
    #[serde(default)]
    pub password: String,

    /// Ask the relay to zlib-compress frames.
    #[serde(default = "default_compression")]
    pub compression: bool,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            address: default_address(),
            password: String::new(),
            compression: default_compression(),
            max_frame_bytes: default_max_frame_bytes(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl RelaySection {
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(RelayError::Config("relay.address must not be empty".into()));
        }
        if !(1024..=64 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(RelayError::Config(
                "relay.max_frame_bytes must be between 1 KiB and 64 MiB".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(RelayError::Config(
                "relay.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(RelayError::Config(
                "relay.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(RelayError::Config(
                "relay.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_address() -> String {
    "127.0.0.1:9000".into()
}
fn default_compression() -> bool {
    true
}
fn default_max_frame_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    /// Backlog lines requested per buffer during the handshake.
    #[serde(default = "default_lines_per_buffer")]
    pub lines_per_buffer: u32,

    /// Ring bound: oldest lines are evicted beyond this.
    #[serde(default = "default_max_lines_per_buffer")]
    pub max_lines_per_buffer: usize,

    /// Opaque resume blob, stored and passed through uninterpreted.
    #[serde(default)]
    pub resume_token: Option<String>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            lines_per_buffer: default_lines_per_buffer(),
            max_lines_per_buffer: default_max_lines_per_buffer(),
            resume_token: None,
        }
    }
}

impl SessionSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=100_000).contains(&self.max_lines_per_buffer) {
            return Err(RelayError::Config(
                "session.max_lines_per_buffer must be between 10 and 100000".into(),
            ));
        }
        if self.lines_per_buffer as usize > self.max_lines_per_buffer {
            return Err(RelayError::Config(
                "session.lines_per_buffer must not exceed max_lines_per_buffer".into(),
            ));
        }
        Ok(())
    }
}

fn default_lines_per_buffer() -> u32 {
    100
}
fn default_max_lines_per_buffer() -> usize {
    1000
}
