//! Parsing and validation of `tether.toml` configuration files.
//!
//! Every section is optional. A project without a `tether.toml` gets the
//! built-in defaults: the debug core at `top/u_ila_0` with probe bus port
//! `probe0`, a probe depth of 4096 samples, the `clk_100MHz` sample clock
//! and a `.iii` work directory.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
