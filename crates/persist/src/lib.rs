//! Persistence for grids: single grid files and named grid stores.
//!
//! # Invariants
//! - Every grid file carries its schema version, element type and the
//!   SHA-256 of its payload; loading fails closed on any mismatch.
//! - A store's manifest lists the hash of every file it wrote.

mod file;
mod store;

pub use file::{
    GRID_SCHEMA_VERSION, StoreError, decode_grid, encode_grid, load_grid, save_grid,
};
pub use store::{GridStore, ManifestEntry, StoreManifest, StoreMeta};

pub fn crate_info() -> &'static str {
    "seagrid-persist v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("persist"));
    }
}
