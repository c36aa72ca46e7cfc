//! Error types for design editing, checkpoint IO, and routing.

use std::path::PathBuf;

/// Structural errors raised while editing the design model.
///
/// Lookups never produce these; they return `Option`. An error here means an
/// edit would break a model invariant (a duplicate name, a pin on two nets).
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// A cell type with this name already exists in the library.
    #[error("cell type '{0}' already exists")]
    DuplicateCellType(String),

    /// A port with this name already exists on the cell type.
    #[error("port '{port}' already exists on cell type '{cell}'")]
    DuplicatePort {
        /// Cell type name.
        cell: String,
        /// Port name.
        port: String,
    },

    /// An instance with this name already exists in the cell type.
    #[error("instance '{inst}' already exists in cell type '{cell}'")]
    DuplicateInstance {
        /// Cell type name.
        cell: String,
        /// Instance name.
        inst: String,
    },

    /// A net with this name already exists in the cell type.
    #[error("net '{net}' already exists in cell type '{cell}'")]
    DuplicateNet {
        /// Cell type name.
        cell: String,
        /// Net name.
        net: String,
    },

    /// The named net does not exist in the cell type.
    #[error("no net '{net}' in cell type '{cell}'")]
    NoSuchNet {
        /// Cell type name.
        cell: String,
        /// Net name.
        net: String,
    },

    /// The named instance does not exist in the cell type.
    #[error("no instance '{inst}' in cell type '{cell}'")]
    NoSuchInstance {
        /// Cell type name.
        cell: String,
        /// Instance name.
        inst: String,
    },

    /// The port bit does not exist on the cell type it refers to.
    #[error("no port bit '{port}' on cell type '{cell}'")]
    NoSuchPort {
        /// Cell type name.
        cell: String,
        /// Port bit name.
        port: String,
    },

    /// A placed cell with this hierarchical name already exists.
    #[error("cell '{0}' is already placed")]
    DuplicatePlacement(String),

    /// A physical net with this name already exists.
    #[error("physical net '{0}' already exists")]
    DuplicatePhysNet(String),

    /// A site pin with this name already exists on the site.
    #[error("site pin '{pin}' already exists on site '{site}'")]
    DuplicateSitePin {
        /// Site name.
        site: String,
        /// Site pin name.
        pin: String,
    },

    /// The site pin is already attached to a different physical net.
    #[error("site pin '{pin}' already belongs to physical net '{net}'")]
    PinOnOtherNet {
        /// `site/pin` name.
        pin: String,
        /// The net currently owning the pin.
        net: String,
    },
}

/// Errors raised while reading or writing a checkpoint file.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// An I/O error occurred on the checkpoint file.
    #[error("checkpoint I/O error at {path}: {source}")]
    Io {
        /// The checkpoint path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is too short or does not start with the checkpoint magic.
    #[error("{path} is not a tether checkpoint")]
    NotACheckpoint {
        /// The checkpoint path.
        path: PathBuf,
    },

    /// The checkpoint was written with an incompatible format version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The checkpoint path.
        path: PathBuf,
        /// The format version this build reads.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The checkpoint path.
        path: PathBuf,
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum computed from the payload.
        actual: String,
    },

    /// Encoding or decoding the header or payload failed.
    #[error("checkpoint serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

/// Errors raised by a [`GlobalRouter`](crate::router::GlobalRouter).
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// A queued pin is not attached to any physical net.
    #[error("site pin '{0}' is queued for routing but belongs to no net")]
    UnattachedPin(String),

    /// The router could not find a path for a pin.
    #[error("failed to route '{pin}' on net '{net}'")]
    Unroutable {
        /// `site/pin` name.
        pin: String,
        /// Physical net name.
        net: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duplicate_net() {
        let err = NetlistError::DuplicateNet {
            cell: "ila_core".into(),
            net: "rw_probe0[1]".into(),
        };
        assert_eq!(
            err.to_string(),
            "net 'rw_probe0[1]' already exists in cell type 'ila_core'"
        );
    }

    #[test]
    fn display_pin_on_other_net() {
        let err = NetlistError::PinOnOtherNet {
            pin: "SLICE_X1Y1/AX".into(),
            net: "top/rst".into(),
        };
        assert!(err.to_string().contains("already belongs to physical net 'top/rst'"));
    }

    #[test]
    fn display_checkpoint_errors() {
        let err = CheckpointError::NotACheckpoint {
            path: PathBuf::from("a.dcp"),
        };
        assert_eq!(err.to_string(), "a.dcp is not a tether checkpoint");
        let err = CheckpointError::VersionMismatch {
            path: PathBuf::from("a.dcp"),
            expected: 1,
            actual: 9,
        };
        assert_eq!(err.to_string(), "version mismatch in a.dcp: expected 1, got 9");
    }

    #[test]
    fn display_router_error() {
        let err = RouterError::UnattachedPin("SLICE_X0Y0/BX".into());
        assert!(err.to_string().contains("SLICE_X0Y0/BX"));
    }
}
