//! Loose object storage: one zlib-compressed file per object under
//! `<root>/<first-2-hex>/<remaining-38-hex>`.
//!
//! Files are written once and never modified; writing an object that already
//! exists is a no-op, which is what content addressing buys. New files land
//! via a temp file in the final directory plus an atomic rename, so a
//! concurrent reader never observes a half-written object.

use std::{fs, io::Write, path::PathBuf};

use tempfile::NamedTempFile;

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::{
        object::{ObjectContents, encode_canonical, parse_canonical, types::ObjectType},
        zlib,
    },
};

/// A loose object directory rooted at some `objects/` path.
pub struct LooseStore {
    root: PathBuf,
}

impl LooseStore {
    pub fn new(root: impl Into<PathBuf>) -> LooseStore {
        LooseStore { root: root.into() }
    }

    /// On-disk path for `hash`: two-hex-digit fan-out directory, then the
    /// remaining 38 digits as the file name.
    pub fn path(&self, hash: &ObjectHash) -> PathBuf {
        let (prefix, rest) = hash.to_path_pair();
        self.root.join(prefix).join(rest)
    }

    pub fn contains(&self, hash: &ObjectHash) -> bool {
        self.path(hash).is_file()
    }

    /// Read and decode the object stored under `hash`.
    ///
    /// The whole file is one zlib stream over the canonical serialization;
    /// any header or length defect surfaces as an error rather than a
    /// truncated object.
    pub fn read(&self, hash: &ObjectHash) -> Result<ObjectContents, GitError> {
        let raw = match fs::read(self.path(hash)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(GitError::NotFound(hash.to_string()));
            }
            Err(err) => return Err(GitError::IOError(err)),
        };
        let decoded = zlib::decompress_all(&raw)?;
        let (kind, payload) = parse_canonical(&decoded)?;
        Ok(ObjectContents::new(kind, payload.to_vec()))
    }

    /// Store `payload` as an object of `kind`, returning its hash.
    ///
    /// If the object already exists the file is left untouched; identical
    /// content always maps to the identical address, so there is nothing to
    /// update.
    pub fn write(&self, kind: ObjectType, payload: &[u8]) -> Result<ObjectHash, GitError> {
        let hash = ObjectHash::from_type_and_data(kind, payload);
        let path = self.path(&hash);
        if path.is_file() {
            tracing::debug!(%hash, "object already stored");
            return Ok(hash);
        }

        let dir = path.parent().ok_or_else(|| {
            GitError::IOError(std::io::Error::other("object path has no parent directory"))
        })?;
        fs::create_dir_all(dir)?;

        let compressed = zlib::compress(&encode_canonical(kind, payload))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&compressed)?;
        tmp.persist(&path).map_err(|e| GitError::IOError(e.error))?;

        // loose objects are immutable once written
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms)?;

        tracing::debug!(%hash, ?kind, size = payload.len(), "stored loose object");
        Ok(hash)
    }
}
