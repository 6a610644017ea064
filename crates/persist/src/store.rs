//! File-backed store of named grids.
//!
//! Layout inside the store directory:
//! ```text
//! store.meta.json        - schema version and grid count
//! grids/
//!   <name>.grid.zst      - grid files, see `save_grid`
//! integrity/
//!   manifest.json        - SHA-256 of every grid file
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use seagrid_core::Grid;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::file::{GRID_SCHEMA_VERSION, StoreError, decode_grid, encode_grid, sha256_hex};

/// Metadata stored in store.meta.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub grid_schema_version: u32,
    pub grid_count: u32,
}

/// Hash record for one grid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub width: i32,
    pub height: i32,
}

/// Integrity manifest keyed by grid name (BTreeMap for stable file output).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

/// Directory of named grids with schema versioning and integrity checking.
#[derive(Debug)]
pub struct GridStore {
    root: PathBuf,
    meta: StoreMeta,
    manifest: StoreManifest,
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_owned()))
    }
}

impl GridStore {
    /// Open or create a grid store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("grids"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join("store.meta.json");
        let manifest_path = root.join("integrity").join("manifest.json");

        let (meta, manifest) = if meta_path.exists() {
            let meta: StoreMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.grid_schema_version != GRID_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: meta.grid_schema_version,
                    expected_version: GRID_SCHEMA_VERSION,
                });
            }
            let manifest: StoreManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                StoreManifest::default()
            };
            (meta, manifest)
        } else {
            let meta = StoreMeta {
                grid_schema_version: GRID_SCHEMA_VERSION,
                grid_count: 0,
            };
            let manifest = StoreManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            (meta, manifest)
        };

        tracing::debug!(root = %root.display(), grids = meta.grid_count, "grid store opened");
        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Write `grid` under `name`, replacing any grid of the same name.
    pub fn put<T: Serialize>(&mut self, name: &str, grid: &Grid<T>) -> Result<(), StoreError> {
        validate_name(name)?;
        let filename = format!("{name}.grid.zst");
        let compressed = encode_grid(grid)?;
        std::fs::write(self.root.join("grids").join(&filename), &compressed)?;

        let entry = ManifestEntry {
            filename,
            sha256: sha256_hex(&compressed),
            width: grid.width(),
            height: grid.height(),
        };
        if self.manifest.entries.insert(name.to_owned(), entry).is_none() {
            self.meta.grid_count += 1;
        }
        tracing::debug!(name, size = %grid.size(), "grid stored");

        self.save_meta()?;
        self.save_manifest()?;
        Ok(())
    }

    /// Read the grid stored under `name`, verifying its hash first.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Grid<T>, StoreError> {
        let entry = self
            .manifest
            .entries
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        let compressed = std::fs::read(self.root.join("grids").join(&entry.filename))?;
        let actual = sha256_hex(&compressed);
        if actual != entry.sha256 {
            return Err(StoreError::IntegrityMismatch {
                expected: entry.sha256.clone(),
                actual,
            });
        }
        decode_grid(&compressed)
    }

    /// Delete the grid stored under `name`.
    pub fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        let entry = self
            .manifest
            .entries
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        std::fs::remove_file(self.root.join("grids").join(&entry.filename))?;
        self.meta.grid_count -= 1;
        self.save_meta()?;
        self.save_manifest()?;
        Ok(())
    }

    /// Names of all stored grids, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.manifest.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.manifest.entries.contains_key(name)
    }

    /// Check every grid file against the manifest.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        for entry in self.manifest.entries.values() {
            let data = std::fs::read(self.root.join("grids").join(&entry.filename))?;
            let actual = sha256_hex(&data);
            if actual != entry.sha256 {
                return Err(StoreError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Get the path to the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the metadata.
    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join("store.meta.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), StoreError> {
        let path = self.root.join("integrity").join("manifest.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.manifest)?;
        Ok(())
    }
}
