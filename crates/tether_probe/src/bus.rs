//! Probe identifiers: `<core>/<port>[<index>]`.

use tether_common::hier;
use tether_config::ProbeConfig;

/// Hard limit on probe indices and probe counts.
pub const MAX_PROBE_COUNT: u32 = 4096;

/// The probe bus of one debug core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeBus {
    core: String,
    port: String,
    prefix: String,
}

impl ProbeBus {
    /// Creates the bus for `port` on the debug core instance at `core`.
    pub fn new(core: impl Into<String>, port: impl Into<String>) -> Self {
        let core = core.into();
        let port = port.into();
        let prefix = format!("{}[", hier::join(&core, &port));
        Self { core, port, prefix }
    }

    /// The bus configured in `tether.toml`.
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.core, &config.port)
    }

    /// Hierarchical path of the debug core instance.
    pub fn core(&self) -> &str {
        &self.core
    }

    /// Name of the probe bus port.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Full name of probe `index`.
    pub fn probe_name(&self, index: u32) -> String {
        format!("{}{index}]", self.prefix)
    }

    /// Index of a probe name on this bus.
    ///
    /// Returns `None` unless `name` is exactly the bus prefix followed by a
    /// non-negative decimal index in brackets.
    pub fn parse_index(&self, name: &str) -> Option<u32> {
        let digits = name.strip_prefix(&self.prefix)?.strip_suffix(']')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}
