//! Shared foundational types used across the Tether probe rewiring toolchain.
//!
//! This crate provides hierarchical path helpers, natural string ordering,
//! content hashing for checkpoint integrity, and the common internal error type.

#![warn(missing_docs)]

pub mod hash;
pub mod hier;
pub mod natural;
pub mod result;

pub use hash::ContentHash;
pub use hier::HIER_SEP;
pub use natural::natural_cmp;
pub use result::InternalError;
