//! Single grid file format.
//!
//! ```text
//! file    = zstd(CBOR(envelope))
//! envelope = { schema_version, element_type, sha256, payload }
//! payload  = CBOR(Grid<T>)
//! ```

use std::io::{Read, Write};
use std::path::Path;

use seagrid_core::Grid;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current grid file schema version.
pub const GRID_SCHEMA_VERSION: u32 = 1;

/// Errors from grid file and grid store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("element type mismatch: file holds {actual}, requested {expected}")]
    ElementTypeMismatch { expected: String, actual: String },
    #[error("grid not found: {0}")]
    NotFound(String),
    #[error("invalid grid name: {0:?}")]
    InvalidName(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct GridEnvelope {
    schema_version: u32,
    element_type: String,
    sha256: String,
    payload: Vec<u8>,
}

fn element_type<T>() -> String {
    std::any::type_name::<T>().to_owned()
}

/// Encode a grid into the compressed file representation.
pub fn encode_grid<T: Serialize>(grid: &Grid<T>) -> Result<Vec<u8>, StoreError> {
    let payload = cbor_serialize(grid)?;
    let envelope = GridEnvelope {
        schema_version: GRID_SCHEMA_VERSION,
        element_type: element_type::<T>(),
        sha256: sha256_hex(&payload),
        payload,
    };
    zstd_compress(&cbor_serialize(&envelope)?)
}

/// Decode a grid, checking schema version, element type and payload hash.
pub fn decode_grid<T: DeserializeOwned>(data: &[u8]) -> Result<Grid<T>, StoreError> {
    let envelope: GridEnvelope = cbor_deserialize(&zstd_decompress(data)?)?;
    if envelope.schema_version != GRID_SCHEMA_VERSION {
        return Err(StoreError::SchemaMismatch {
            file_version: envelope.schema_version,
            expected_version: GRID_SCHEMA_VERSION,
        });
    }
    let expected_type = element_type::<T>();
    if envelope.element_type != expected_type {
        return Err(StoreError::ElementTypeMismatch {
            expected: expected_type,
            actual: envelope.element_type,
        });
    }
    let actual = sha256_hex(&envelope.payload);
    if actual != envelope.sha256 {
        return Err(StoreError::IntegrityMismatch {
            expected: envelope.sha256,
            actual,
        });
    }
    cbor_deserialize(&envelope.payload)
}

/// Write a grid file.
pub fn save_grid<T: Serialize>(path: impl AsRef<Path>, grid: &Grid<T>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let bytes = encode_grid(grid)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), size = %grid.size(), bytes = bytes.len(), "grid saved");
    Ok(())
}

/// Read a grid file written by [`save_grid`].
pub fn load_grid<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Grid<T>, StoreError> {
    let path = path.as_ref();
    let grid = decode_grid(&std::fs::read(path)?)?;
    tracing::debug!(path = %path.display(), size = %grid.size(), "grid loaded");
    Ok(grid)
}

pub(crate) fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn cbor_deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
