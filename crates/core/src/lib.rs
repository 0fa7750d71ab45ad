//! surface-core
//!
//! Core library for tracking the managed entry points that native code calls
//! across a language boundary.
//!
//! The pipeline is: a [`metadata::MetadataSource`] is scanned by
//! [`scanner`] into symbol descriptors, which are indexed by
//! [`registry::SurfaceRegistry`], checked by [`verify::Verifier`], and
//! compared across builds with [`snapshot::diff`].
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends. Nothing in this crate prints or exits the process.

pub mod db;
pub mod manifest;
pub mod metadata;
pub mod model;
pub mod registry;
pub mod scanner;
pub mod services;
pub mod snapshot;
pub mod verify;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
