//! Versioned binary persistence for trained models.
//!
//! Layout of a model file:
//!
//! ```text
//! [magic u64 LE][version u16 LE][bincode payload][magic u64 LE]
//! ```
//!
//! The leading magic answers "is this one of our files at all" before
//! anything is decoded; the version gates decoding; the trailing copy of
//! the magic doubles as a truncation check, since a payload that decodes
//! but ends early will not line up with it. Validation failures surface
//! before any model value exists, so a bad file can never leave a
//! half-populated model behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::store::CounterStore;

/// Marker written before and after the payload ("spll_mdl" on disk).
pub(crate) const MODEL_MAGIC: u64 = 0x6c64_6d5f_6c6c_7073;

/// Bumped whenever the payload layout changes shape.
pub(crate) const MODEL_VERSION: u16 = 1;

/// Borrowed view of everything a model file persists.
///
/// Field order must match [`ModelPayload`] exactly: bincode encodes a
/// struct as its fields in order with no framing, and these two are the
/// write and read sides of the same byte stream.
#[derive(Serialize)]
pub(crate) struct ModelPayloadRef<'a> {
    pub k: f64,
    /// Vocabulary entries in id order.
    pub vocab: Vec<(&'a str, u32)>,
    pub total_words: u64,
    /// Alphabet characters, sorted.
    pub alphabet: &'a str,
    pub store: &'a CounterStore,
}

/// Owned counterpart of [`ModelPayloadRef`], produced by [`read_model`].
#[derive(Debug, Deserialize)]
pub(crate) struct ModelPayload {
    pub k: f64,
    pub vocab: Vec<(String, u32)>,
    pub total_words: u64,
    pub alphabet: String,
    pub store: CounterStore,
}

/// Write a payload with its envelope to `path`.
pub(crate) fn write_model<P: AsRef<Path>>(
    path: P,
    payload: &ModelPayloadRef<'_>,
) -> Result<(), ModelError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ModelError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    write_bytes(&mut writer, path, &MODEL_MAGIC.to_le_bytes())?;
    write_bytes(&mut writer, path, &MODEL_VERSION.to_le_bytes())?;
    bincode::serialize_into(&mut writer, payload)?;
    write_bytes(&mut writer, path, &MODEL_MAGIC.to_le_bytes())?;
    writer.flush().map_err(|e| ModelError::io(path, e))?;
    Ok(())
}

/// Read and validate a model file.
///
/// Checks run in envelope order: leading magic, version, payload decode,
/// trailing magic. The first failure wins. Decoding is capped at the
/// file's own length, so a corrupted length prefix inside the payload
/// fails like any other malformed byte instead of driving a giant
/// allocation.
pub(crate) fn read_model<P: AsRef<Path>>(path: P) -> Result<ModelPayload, ModelError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ModelError::io(path, e))?;
    let size = file.metadata().map_err(|e| ModelError::io(path, e))?.len();
    let mut reader = BufReader::new(file);

    // A file too short to hold the magic is not one of ours either.
    let mut magic = [0u8; 8];
    if reader.read_exact(&mut magic).is_err() || u64::from_le_bytes(magic) != MODEL_MAGIC {
        return Err(ModelError::InvalidMagic);
    }

    let mut version = [0u8; 2];
    if reader.read_exact(&mut version).is_err() {
        return Err(ModelError::TruncatedPayload);
    }
    let version = u16::from_le_bytes(version);
    if version != MODEL_VERSION {
        return Err(ModelError::UnsupportedVersion {
            found: version,
            expected: MODEL_VERSION,
        });
    }

    // Same wire format as the `serialize_into` write side, plus an
    // allocation budget: nothing in the payload may claim more bytes
    // than the file actually holds.
    let payload: ModelPayload = bincode::options()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(size)
        .deserialize_from(&mut reader)?;

    let mut trailing = [0u8; 8];
    if reader.read_exact(&mut trailing).is_err() || u64::from_le_bytes(trailing) != MODEL_MAGIC {
        return Err(ModelError::TruncatedPayload);
    }

    Ok(payload)
}

fn write_bytes<W: Write>(writer: &mut W, path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    writer.write_all(bytes).map_err(|e| ModelError::io(path, e))
}
