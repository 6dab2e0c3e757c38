//! On-disk layout.
//!
//! An index saved at prefix `P` is two files:
//!
//! - `P.vectors`: header `b"LRAGVEC\0"`, `u32` format version, `u32` dim,
//!   `u64` count (all little-endian), then `count * dim` little-endian `f32`
//!   values in insertion order.
//! - `P.meta.json`: format version, dim, count, blake3 of the whole
//!   `P.vectors` file, and the ordered metadata records.
//!
//! Any disagreement between the two files is a `SchemaMismatch`.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use localrag_core::error::{Error, Result};

use crate::index::VectorIndex;

pub const FORMAT_VERSION: u32 = 1;
const MAGIC: [u8; 8] = *b"LRAGVEC\0";
const HEADER_LEN: usize = 8 + 4 + 4 + 8;
const F32_LEN: usize = std::mem::size_of::<f32>();

#[derive(Serialize, Deserialize)]
struct MetadataFile<R> {
    format_version: u32,
    embedding_dim: usize,
    count: usize,
    vectors_blake3: String,
    records: R,
}

pub fn vectors_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".vectors")
}

pub fn metadata_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".meta.json")
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = prefix.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

pub(crate) fn save<M: Serialize>(index: &VectorIndex<M>, prefix: &Path) -> Result<()> {
    let vectors_file = vectors_path(prefix);
    let meta_file = metadata_path(prefix);
    if let Some(parent) = vectors_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let blob = encode_vectors(index.dim(), index.len(), index.raw_vectors())?;
    let meta = MetadataFile {
        format_version: FORMAT_VERSION,
        embedding_dim: index.dim(),
        count: index.len(),
        vectors_blake3: blake3::hash(&blob).to_hex().to_string(),
        records: index.records(),
    };
    let meta_bytes = serde_json::to_vec(&meta)?;

    // Both bodies are on disk before either file is replaced.
    let staged_vectors = stage(&vectors_file, &blob)?;
    let staged_meta = stage(&meta_file, &meta_bytes)?;
    staged_vectors.persist(&vectors_file).map_err(|e| Error::Io(e.error))?;
    staged_meta.persist(&meta_file).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

pub(crate) fn load<M: DeserializeOwned>(prefix: &Path) -> Result<VectorIndex<M>> {
    let vectors_file = vectors_path(prefix);
    let meta_file = metadata_path(prefix);
    for p in [&vectors_file, &meta_file] {
        if !p.is_file() {
            return Err(Error::NotFound(p.clone()));
        }
    }

    let blob = fs::read(&vectors_file)?;
    let (dim, count, vectors) = decode_vectors(&blob)?;

    let reader = BufReader::new(File::open(&meta_file)?);
    let meta: MetadataFile<Vec<M>> = serde_json::from_reader(reader)
        .map_err(|e| Error::SchemaMismatch(format!("unreadable metadata {}: {e}", meta_file.display())))?;

    if meta.format_version != FORMAT_VERSION {
        return Err(Error::SchemaMismatch(format!(
            "metadata format version {} is not supported (expected {FORMAT_VERSION})",
            meta.format_version
        )));
    }
    if meta.embedding_dim != dim {
        return Err(Error::SchemaMismatch(format!(
            "vectors have dim {dim} but metadata declares {}",
            meta.embedding_dim
        )));
    }
    if meta.count != count || meta.records.len() != count {
        return Err(Error::SchemaMismatch(format!(
            "vectors hold {count} entries but metadata declares {} with {} records",
            meta.count,
            meta.records.len()
        )));
    }
    if meta.vectors_blake3 != blake3::hash(&blob).to_hex().as_str() {
        return Err(Error::SchemaMismatch("vectors checksum does not match metadata".to_string()));
    }

    Ok(VectorIndex::from_parts(dim, vectors, meta.records))
}

/// Writes `body` to a synced temp file next to `path`. Dropping the returned
/// file without persisting it removes it.
fn stage(path: &Path, body: &[u8]) -> Result<NamedTempFile> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        writer.write_all(body)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn encode_vectors(dim: usize, count: usize, data: &[f32]) -> Result<Vec<u8>> {
    let dim = u32::try_from(dim)
        .map_err(|_| Error::InvalidConfig(format!("embedding_dim {dim} does not fit the vectors header")))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + std::mem::size_of_val(data));
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&dim.to_le_bytes());
    bytes.extend_from_slice(&(count as u64).to_le_bytes());
    for &value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}

fn decode_vectors(blob: &[u8]) -> Result<(usize, usize, Vec<f32>)> {
    if blob.len() < HEADER_LEN {
        return Err(Error::SchemaMismatch(format!("vectors file too short: {} bytes", blob.len())));
    }
    let (header, body) = blob.split_at(HEADER_LEN);
    if header[..8] != MAGIC {
        return Err(Error::SchemaMismatch("vectors file has an unknown magic header".to_string()));
    }
    let version = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    if version != FORMAT_VERSION {
        return Err(Error::SchemaMismatch(format!(
            "vectors format version {version} is not supported (expected {FORMAT_VERSION})"
        )));
    }
    let dim = u32::from_le_bytes([header[12], header[13], header[14], header[15]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&header[16..24]);
    let count = usize::try_from(u64::from_le_bytes(count_bytes))
        .map_err(|_| Error::SchemaMismatch("vector count overflows usize".to_string()))?;
    if dim == 0 {
        return Err(Error::SchemaMismatch("vectors file declares dim 0".to_string()));
    }

    let expected = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(F32_LEN))
        .ok_or_else(|| Error::SchemaMismatch("vector payload size overflows".to_string()))?;
    if body.len() != expected {
        return Err(Error::SchemaMismatch(format!(
            "vector payload is {} bytes, header implies {expected}",
            body.len()
        )));
    }

    let mut out = Vec::with_capacity(count * dim);
    for chunk in body.chunks_exact(F32_LEN) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !value.is_finite() {
            return Err(Error::SchemaMismatch("vectors contain non-finite values".to_string()));
        }
        out.push(value);
    }
    Ok((dim, count, out))
}
