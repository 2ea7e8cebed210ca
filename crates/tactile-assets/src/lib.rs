//! Art compiled into the binary.
//!
//! The table is generated by `build.rs`: every image is run-length encoded
//! with [`tactile_core::codec`] at build time and decoded on first use by the
//! engine's asset cache.

#![no_std]

use tactile_core::pixel_data::{AssetId, CompressedResource};

/// Ids of the compiled-in assets.
pub mod ids {
    include!(concat!(env!("OUT_DIR"), "/ids.rs"));
}

/// Every compiled-in asset, ordered by id.
pub static ASSETS: &[CompressedResource] = include!(concat!(env!("OUT_DIR"), "/table.rs"));

/// Look up a table entry by id.
pub fn find(id: AssetId) -> Option<&'static CompressedResource> {
    ASSETS.iter().find(|resource| resource.id == id)
}
