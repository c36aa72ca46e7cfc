//! Configuration types deserialized from `tether.toml`.

use serde::Deserialize;

/// Default hierarchical path of the debug core instance.
pub const DEFAULT_CORE_INSTANCE: &str = "top/u_ila_0";
/// Default name of the probe bus port on the debug core.
pub const DEFAULT_PROBE_PORT: &str = "probe0";
/// Default number of samples captured per probe.
pub const DEFAULT_PROBE_DEPTH: u32 = 4096;
/// Default sample clock net.
pub const DEFAULT_CLK_NET: &str = "clk_100MHz";
/// Default directory for intermediate checkpoints and metadata.
pub const DEFAULT_WORK_DIR: &str = ".iii";

/// The top-level configuration parsed from `tether.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TetherConfig {
    /// Where the debug core and its probe bus live in the design.
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Fallback values for parameters not given on the command line or in metadata.
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// External commands for the instrumentation and finalization stages.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Location of the debug core's probe bus.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Hierarchical instance path of the debug core.
    #[serde(default = "default_core")]
    pub core: String,
    /// Name of the probe bus port on the debug core.
    #[serde(default = "default_port")]
    pub port: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            core: default_core(),
            port: default_port(),
        }
    }
}

/// Parameter defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    /// Samples captured per probe.
    #[serde(default = "default_probe_depth")]
    pub probe_depth: u32,
    /// Sample clock net for the debug core.
    #[serde(default = "default_clk_net")]
    pub clk_net: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            probe_depth: DEFAULT_PROBE_DEPTH,
            clk_net: default_clk_net(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the instrumented checkpoint and `metadata.txt`.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
        }
    }
}

/// Argument vectors for the external toolchain.
///
/// Each entry is a program followed by its arguments. The placeholders
/// `{input}`, `{output}`, `{probe_count}`, `{probe_depth}` and `{clk_net}`
/// are substituted before the command runs; `{probes}` and `{ltx}` are also
/// available to `finalize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolchainConfig {
    /// Inserts the debug core into a routed checkpoint and places it.
    #[serde(default)]
    pub instrument: Vec<String>,
    /// Routes the rewired checkpoint and writes the probe description and bitstream.
    #[serde(default)]
    pub finalize: Vec<String>,
}

fn default_core() -> String {
    DEFAULT_CORE_INSTANCE.to_string()
}

fn default_port() -> String {
    DEFAULT_PROBE_PORT.to_string()
}

fn default_probe_depth() -> u32 {
    DEFAULT_PROBE_DEPTH
}

fn default_clk_net() -> String {
    DEFAULT_CLK_NET.to_string()
}

fn default_work_dir() -> String {
    DEFAULT_WORK_DIR.to_string()
}
