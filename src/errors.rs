//! Error types for the object storage engine.
//!
//! A single enumeration covers hash parsing, canonical object decoding,
//! loose-store I/O, pack index validation, and delta reconstruction. Every
//! parse boundary returns one of these variants; malformed input is never
//! silently truncated or corrected.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the object database.
pub enum GitError {
    /// Hash string with the wrong length or non-hex characters.
    #[error("The `{0}` is not a valid hash value.")]
    MalformedHash(String),

    /// Canonical object header or declared-length mismatch on decode.
    #[error("Not a valid git object: {0}")]
    InvalidObject(String),

    /// Invalid or unsupported object type name.
    #[error("The `{0}` is not a valid git object type.")]
    InvalidObjectType(String),

    /// Invalid tree entry (mode/name/hash).
    #[error("The `{0}` is not a valid git tree item.")]
    InvalidTreeItem(String),

    /// Malformed commit object.
    #[error("Not a valid git commit object: {0}")]
    InvalidCommitObject(String),

    /// Invalid author/committer signature line.
    #[error("The `{0}` is not a valid git commit signature.")]
    InvalidSignature(String),

    /// Hash absent from loose storage and every registered pack.
    #[error("Object `{0}` not found")]
    NotFound(String),

    /// Pack index magic or version mismatch.
    #[error("Unsupported pack index: {0}")]
    UnsupportedVersion(String),

    /// Structural damage in a pack index file.
    #[error("Corrupt pack index: {0}")]
    CorruptIndex(String),

    /// Out-of-range base offset/length or an over-deep delta chain.
    #[error("Delta resolution failed: {0}")]
    DeltaResolution(String),

    /// Pack record kind this engine deliberately does not reconstruct.
    #[error("Unsupported pack feature: {0}")]
    Unsupported(String),

    /// Corrupt or truncated zlib stream.
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error from the underlying reader or writer.
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}
