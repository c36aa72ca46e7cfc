//! The metadata file recording the parameters of the instrumented design.
//!
//! ```text
//! # This is a metadata file.
//! # Mappings: <key> -> <value>
//! probe_depth = 4096
//! clk_net = clk_100MHz
//! ```
//!
//! Reading is fail-safe: a missing or unreadable file, unknown keys and
//! unparsable values all read as "not recorded".

use std::path::Path;

use crate::error::BuildError;

/// Name of the metadata file inside the work directory.
pub const METADATA_FILE_NAME: &str = "metadata.txt";

const PROBE_DEPTH_KEY: &str = "probe_depth";
const CLK_NET_KEY: &str = "clk_net";
const NULL: &str = "null";

/// Parameters the instrumented checkpoint was built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMetadata {
    /// Sample depth of the debug core.
    pub probe_depth: Option<u32>,
    /// Sample clock net of the debug core.
    pub clk_net: Option<String>,
}

impl BuildMetadata {
    /// Parses metadata text.
    pub fn parse(text: &str) -> Self {
        let mut meta = Self::default();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value == NULL {
                continue;
            }
            match key.trim() {
                PROBE_DEPTH_KEY => meta.probe_depth = value.parse().ok(),
                CLK_NET_KEY => meta.clk_net = Some(value.to_string()),
                _ => {}
            }
        }
        meta
    }

    /// Renders metadata text.
    pub fn render(&self) -> String {
        let depth = self.probe_depth.map_or_else(|| NULL.to_string(), |d| d.to_string());
        let clk = self.clk_net.as_deref().unwrap_or(NULL);
        format!(
            "# This is a metadata file.\n# Mappings: <key> -> <value>\n{PROBE_DEPTH_KEY} = {depth}\n{CLK_NET_KEY} = {clk}\n"
        )
    }
}

/// Reads the metadata file at `path`; absent or unreadable reads as empty.
pub fn read_metadata(path: &Path) -> BuildMetadata {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), "reading metadata");
            BuildMetadata::parse(&text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no metadata found");
            BuildMetadata::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable metadata");
            BuildMetadata::default()
        }
    }
}

/// Writes `meta` to `path`, creating the parent directory.
pub fn write_metadata(path: &Path, meta: &BuildMetadata) -> Result<(), BuildError> {
    let io_err = |e| BuildError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, meta.render()).map_err(io_err)?;
    tracing::debug!(path = %path.display(), "wrote metadata");
    Ok(())
}
