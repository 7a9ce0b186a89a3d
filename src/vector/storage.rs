//! Binary vector files for the persisted index and raw embeddings.
//!
//! # Storage Format
//!
//! Both artifacts share one layout, distinguished by their magic bytes:
//! - Header (16 bytes): magic, version, dimension, vector count (u32 LE each
//!   after the 4 magic bytes)
//! - Vectors: count x dimension contiguous f32 values in little-endian format
//! - Index files only: a 32-byte SHA-256 of the vector payload
//!
//! Files are read through a memory map and copied once into an owned buffer.
//! Writes go to a temporary file in the destination directory that is fsynced
//! before it replaces the old artifact, so a crash leaves the previous file
//! intact.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::MmapOptions;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Corruption, IndexError, IndexResult};
use crate::vector::types::VectorDimension;

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Size of the trailing payload checksum in index files.
const CHECKSUM_SIZE: usize = 32;

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Which of the two vector artifacts a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFileKind {
    /// The index structure, checksummed.
    Index,
    /// Raw normalized embeddings, row `i` matching `product_ids[i]`.
    Embeddings,
}

impl VectorFileKind {
    fn magic(self) -> &'static [u8; 4] {
        match self {
            Self::Index => b"LKIX",
            Self::Embeddings => b"LKEM",
        }
    }

    fn has_checksum(self) -> bool {
        matches!(self, Self::Index)
    }
}

/// Decoded contents of a vector file.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFile {
    pub dimension: VectorDimension,
    pub count: usize,
    pub data: Vec<f32>,
    /// Hex SHA-256 of the payload (computed on read for both kinds).
    pub checksum: String,
}

/// Hex SHA-256 of the little-endian encoding of `data`.
#[must_use]
pub fn payload_checksum(data: &[f32]) -> String {
    format!("{:x}", payload_digest(data))
}

fn payload_digest(data: &[f32]) -> sha2::digest::Output<Sha256> {
    let mut hasher = Sha256::new();
    for value in data {
        hasher.update(value.to_le_bytes());
    }
    hasher.finalize()
}

/// Streams vectors in the on-disk layout, returning the hex payload checksum.
pub fn write_vectors<W: Write + ?Sized>(
    writer: &mut W,
    kind: VectorFileKind,
    dimension: VectorDimension,
    data: &[f32],
) -> io::Result<String> {
    debug_assert_eq!(data.len() % dimension.get(), 0);
    let count = data.len() / dimension.get();

    let dimension_field = header_field("dimension", dimension.get())?;
    let count_field = header_field("vector count", count)?;

    writer.write_all(kind.magic())?;
    writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
    writer.write_all(&dimension_field.to_le_bytes())?;
    writer.write_all(&count_field.to_le_bytes())?;

    let mut hasher = Sha256::new();
    for value in data {
        let bytes = value.to_le_bytes();
        hasher.update(bytes);
        writer.write_all(&bytes)?;
    }

    let digest = hasher.finalize();
    if kind.has_checksum() {
        writer.write_all(&digest)?;
    }

    Ok(format!("{digest:x}"))
}

fn header_field(name: &str, value: usize) -> io::Result<u32> {
    u32::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} {value} does not fit the u32 header field"),
        )
    })
}

/// Parses the on-disk layout, naming the first check that fails.
pub fn decode(kind: VectorFileKind, bytes: &[u8]) -> Result<VectorFile, Corruption> {
    if bytes.len() < HEADER_SIZE {
        return Err(Corruption::MissingHeader {
            size: bytes.len() as u64,
        });
    }

    if &bytes[0..4] != kind.magic() {
        return Err(Corruption::BadMagic);
    }

    let version = read_u32(bytes, 4);
    if version != STORAGE_VERSION {
        return Err(Corruption::UnsupportedVersion {
            found: version,
            supported: STORAGE_VERSION,
        });
    }

    let raw_dimension = read_u32(bytes, 8);
    let raw_count = read_u32(bytes, 12);
    let dimension =
        VectorDimension::new(raw_dimension as usize).map_err(|_| Corruption::ZeroDimension)?;
    let count = raw_count as usize;

    let checksum_len = if kind.has_checksum() { CHECKSUM_SIZE } else { 0 };
    let payload_len = count
        .checked_mul(dimension.get())
        .and_then(|n| n.checked_mul(BYTES_PER_F32));
    let expected = payload_len.and_then(|n| n.checked_add(HEADER_SIZE + checksum_len));
    let (Some(payload_len), Some(expected)) = (payload_len, expected) else {
        return Err(Corruption::OversizedHeader {
            count: raw_count,
            dimension: raw_dimension,
        });
    };
    if bytes.len() != expected {
        return Err(Corruption::Truncated {
            expected: expected as u64,
            actual: bytes.len() as u64,
        });
    }

    let payload = &bytes[HEADER_SIZE..HEADER_SIZE + payload_len];
    let data: Vec<f32> = payload
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if let Some(position) = data.iter().position(|v| !v.is_finite()) {
        return Err(Corruption::NonFinite {
            slot: position / dimension.get(),
        });
    }

    let digest = payload_digest(&data);
    if kind.has_checksum() && bytes[HEADER_SIZE + payload_len..] != digest[..] {
        return Err(Corruption::ChecksumMismatch);
    }

    Ok(VectorFile {
        dimension,
        count,
        data,
        checksum: format!("{digest:x}"),
    })
}

/// Memory-maps and decodes a vector file.
///
/// I/O failures surface as `FileRead`; format problems as `CorruptIndex`.
pub fn read_vector_file(path: &Path, kind: VectorFileKind) -> IndexResult<VectorFile> {
    let read_err = |source| IndexError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let size = file.metadata().map_err(read_err)?.len();

    // Mapping an empty file fails on some platforms; it is corrupt either way.
    if size < HEADER_SIZE as u64 {
        return Err(IndexError::corrupt(path, Corruption::MissingHeader { size }));
    }

    let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(read_err)?;
    decode(kind, &mmap).map_err(|check| IndexError::corrupt(path, check))
}

/// A fully written temporary file waiting to replace its destination.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    /// Writes `bytes` next to `destination` and fsyncs them.
    pub fn write(destination: &Path, bytes: &[u8]) -> IndexResult<Self> {
        Self::write_with(destination, |writer| writer.write_all(bytes))
    }

    /// Streams a vector file next to `destination`, returning its checksum.
    pub fn write_vectors(
        destination: &Path,
        kind: VectorFileKind,
        dimension: VectorDimension,
        data: &[f32],
    ) -> IndexResult<(Self, String)> {
        let mut checksum = String::new();
        let staged = Self::write_with(destination, |writer| {
            checksum = write_vectors(writer, kind, dimension, data)?;
            Ok(())
        })?;
        Ok((staged, checksum))
    }

    fn write_with<F>(destination: &Path, fill: F) -> IndexResult<Self>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let write_err = |source| IndexError::FileWrite {
            path: destination.to_path_buf(),
            source,
        };

        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            fill(&mut writer).map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;

        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
        })
    }

    /// Atomically renames the staged file over its destination.
    pub fn commit(self) -> IndexResult<()> {
        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|e| IndexError::FileWrite {
                path: destination.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
