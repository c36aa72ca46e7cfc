//! The design container and its on-disk checkpoint format.
//!
//! A checkpoint file is laid out as:
//!
//! ```text
//! [u32 LE header length][bincode CheckpointHeader][gzip(bincode Design)]
//! ```
//!
//! The header carries magic bytes, a format version and an XXH3-128 checksum
//! of the compressed payload, all validated before the payload is decoded.

use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tether_common::ContentHash;

use crate::error::CheckpointError;
use crate::ids::PhysNetId;
use crate::logical::LogicalNetlist;
use crate::physical::PhysicalDesign;

/// Magic bytes identifying a checkpoint.
const CHECKPOINT_MAGIC: [u8; 4] = *b"TTHR";

/// Current checkpoint format version.
const CHECKPOINT_FORMAT_VERSION: u32 = 1;

/// A logical netlist together with its physical implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// Design name.
    pub name: String,
    /// Hierarchical netlist.
    pub logical: LogicalNetlist,
    /// Placement and routing.
    pub physical: PhysicalDesign,
}

impl Design {
    /// Creates a design from its two halves.
    pub fn new(name: impl Into<String>, logical: LogicalNetlist, physical: PhysicalDesign) -> Self {
        Self {
            name: name.into(),
            logical,
            physical,
        }
    }

    /// Physical net implementing the flattened net that contains `hier_net`.
    pub fn physical_net_of(&self, hier_net: &str) -> Option<PhysNetId> {
        let parent = self.logical.parent_net_name(hier_net)?;
        self.physical.net_by_name(&parent)
    }

    /// Rebuilds every lookup index; required after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.logical.rebuild_indices();
        self.physical.rebuild_indices();
    }
}

/// Header prepended to every checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointHeader {
    /// Magic bytes: must be `b"TTHR"`.
    pub magic: [u8; 4],
    /// Checkpoint format version.
    pub format_version: u32,
    /// Version of the tool that wrote the checkpoint.
    pub tool_version: String,
    /// Name of the stored design.
    pub design_name: String,
    /// Checksum of the compressed payload.
    pub checksum: ContentHash,
}

fn serialization(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Serialization {
        reason: e.to_string(),
    }
}

/// Writes `design` to `path`, creating parent directories as needed.
pub fn save_checkpoint(design: &Design, path: &Path) -> Result<(), CheckpointError> {
    let io_err = |e| CheckpointError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    let raw = bincode::serde::encode_to_vec(design, bincode::config::standard()).map_err(serialization)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).map_err(io_err)?;
    let payload = encoder.finish().map_err(io_err)?;

    let header = CheckpointHeader {
        magic: CHECKPOINT_MAGIC,
        format_version: CHECKPOINT_FORMAT_VERSION,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        design_name: design.name.clone(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard()).map_err(serialization)?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, &output).map_err(io_err)?;
    tracing::debug!(path = %path.display(), bytes = output.len(), "wrote checkpoint");
    Ok(())
}

/// Splits raw checkpoint bytes into a validated header and the payload.
fn split(raw: &[u8], path: &Path) -> Result<(CheckpointHeader, usize), CheckpointError> {
    let not_a_checkpoint = || CheckpointError::NotACheckpoint {
        path: path.to_path_buf(),
    };
    let len_bytes: [u8; 4] = raw.get(..4).and_then(|b| b.try_into().ok()).ok_or_else(not_a_checkpoint)?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw.get(4..4 + header_len).ok_or_else(not_a_checkpoint)?;
    let (header, _): (CheckpointHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|_| not_a_checkpoint())?;

    if header.magic != CHECKPOINT_MAGIC {
        return Err(not_a_checkpoint());
    }
    if header.format_version != CHECKPOINT_FORMAT_VERSION {
        return Err(CheckpointError::VersionMismatch {
            path: path.to_path_buf(),
            expected: CHECKPOINT_FORMAT_VERSION,
            actual: header.format_version,
        });
    }
    Ok((header, 4 + header_len))
}

fn read_file(path: &Path) -> Result<Vec<u8>, CheckpointError> {
    std::fs::read(path).map_err(|e| CheckpointError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads and validates only the header of a checkpoint.
pub fn read_header(path: &Path) -> Result<CheckpointHeader, CheckpointError> {
    let raw = read_file(path)?;
    split(&raw, path).map(|(header, _)| header)
}

/// Loads a checkpoint, verifying its header and checksum.
pub fn load_checkpoint(path: &Path) -> Result<Design, CheckpointError> {
    let raw = read_file(path)?;
    let (header, offset) = split(&raw, path)?;
    let payload = &raw[offset..];

    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(CheckpointError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let mut decompressed = Vec::new();
    GzDecoder::new(payload)
        .read_to_end(&mut decompressed)
        .map_err(|e| CheckpointError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    let (mut design, _): (Design, usize) =
        bincode::serde::decode_from_slice(&decompressed, bincode::config::standard()).map_err(serialization)?;
    design.rebuild_indices();
    tracing::debug!(path = %path.display(), design = %design.name, "loaded checkpoint");
    Ok(design)
}

/// Modification time of `path`, or `None` if it does not exist or the
/// platform cannot report one.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::{CellType, Port, PortDirection, PortInst};
    use std::collections::BTreeMap;

    fn sample() -> Design {
        let mut logical = LogicalNetlist::new("wrapper");
        let fdre = logical
            .add_cell_type(CellType::primitive(
                "FDRE",
                vec![Port::new("D", PortDirection::Input, 1)],
            ))
            .unwrap();
        let top = logical.top();
        let cell = logical.cell_type_mut(top);
        cell.add_instance("ff", fdre).unwrap();
        cell.create_net("d").unwrap();
        cell.attach("d", PortInst::on("ff", "D")).unwrap();

        let mut physical = PhysicalDesign::new();
        let site = physical.add_site("SLICE_X0Y0");
        let mut map = BTreeMap::new();
        map.insert("D".to_string(), "D".to_string());
        physical.place_cell("ff", site, "AFF", map).unwrap();
        physical.add_net("d").unwrap();
        Design::new("sample", logical, physical)
    }

    #[test]
    fn save_then_load_restores_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/sample.dcp");
        save_checkpoint(&sample(), &path).unwrap();

        let loaded = load_checkpoint(&path).unwrap();
        assert_eq!(loaded.name, "sample");
        let top = loaded.logical.top();
        assert_eq!(
            loaded.logical.cell_type(top).net_of(&PortInst::on("ff", "D")),
            Some("d")
        );
        assert!(loaded.physical.cell_by_name("ff").is_some());
        assert!(loaded.physical_net_of("d").is_some());
    }

    #[test]
    fn header_is_readable_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.dcp");
        save_checkpoint(&sample(), &path).unwrap();
        let header = read_header(&path).unwrap();
        assert_eq!(header.magic, *b"TTHR");
        assert_eq!(header.design_name, "sample");
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.dcp");
        save_checkpoint(&sample(), &path).unwrap();
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, raw).unwrap();
        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn foreign_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendor.dcp");
        std::fs::write(&path, b"PK\x03\x04 this is a zip").unwrap();
        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::NotACheckpoint { .. })
        ));
        std::fs::write(&path, b"ab").unwrap();
        assert!(matches!(
            read_header(&path),
            Err(CheckpointError::NotACheckpoint { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_checkpoint(&dir.path().join("absent.dcp")).unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
        assert!(modified_time(&dir.path().join("absent.dcp")).is_none());
    }

    #[test]
    fn modified_time_of_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.dcp");
        save_checkpoint(&sample(), &path).unwrap();
        assert!(modified_time(&path).is_some());
    }
}
