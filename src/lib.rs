//! Keyed object-graph archiver producing Apple keyed-archive plists.

/// Value model, class registry, graph encoder, and plist writers.
pub mod archive;
