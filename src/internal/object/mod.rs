//! Object model: the canonical serialization rules plus strongly typed
//! views over blob, tree, and commit payloads.
//!
//! The canonical serialization of an object is
//!
//! ```text
//! "<kind> <payload-length>\0" + payload
//! ```
//!
//! and the SHA-1 of exactly that byte sequence (header included) is the
//! object's address. [`encode_canonical`] and [`parse_canonical`] implement
//! the two directions; parsing is strict and length-checked, so a payload
//! shorter or longer than its declared length is rejected rather than
//! truncated or zero-padded.

pub mod blob;
pub mod commit;
pub mod signature;
pub mod tree;
pub mod types;

use std::fmt::Display;

use memchr::memchr;

use crate::{errors::GitError, hash::ObjectHash, internal::object::types::ObjectType};

/// **The Object Trait**
/// Common interface for the typed object views (blob, tree, commit).
pub trait ObjectTrait: Send + Sync + Display {
    /// Creates a typed object from a decoded payload (no canonical header).
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError>
    where
        Self: Sized;

    /// Returns the kind of the object.
    fn get_type(&self) -> ObjectType;

    fn get_size(&self) -> usize;

    /// Serializes the object back to its payload bytes.
    fn to_data(&self) -> Result<Vec<u8>, GitError>;

    /// Computes the object hash from serialized data.
    fn object_hash(&self) -> Result<ObjectHash, GitError> {
        let data = self.to_data()?;
        Ok(ObjectHash::from_type_and_data(self.get_type(), &data))
    }
}

/// A resolved object: its kind and decoded payload bytes.
///
/// This is the value every lookup surface returns; the payload carries no
/// canonical header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectContents {
    pub kind: ObjectType,
    pub data: Vec<u8>,
}

impl ObjectContents {
    pub fn new(kind: ObjectType, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// The content address of these bytes.
    pub fn hash(&self) -> ObjectHash {
        ObjectHash::from_type_and_data(self.kind, &self.data)
    }
}

/// Builds the canonical serialization `"<kind> <len>\0" + payload`.
pub fn encode_canonical(kind: ObjectType, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    out.extend_from_slice(kind.to_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b'\0');
    out.extend_from_slice(payload);
    out
}

/// Splits a canonical serialization back into kind and payload.
///
/// The header ends at the first NUL byte and must contain exactly one space
/// separating the kind name from a decimal payload length. The declared
/// length must equal the number of bytes following the NUL.
pub fn parse_canonical(raw: &[u8]) -> Result<(ObjectType, &[u8]), GitError> {
    let nul = memchr(b'\0', raw).ok_or_else(|| {
        GitError::InvalidObject("missing NUL terminator in object header".to_string())
    })?;
    let header = &raw[..nul];
    let space = memchr(b' ', header).ok_or_else(|| {
        GitError::InvalidObject("missing space between kind and length".to_string())
    })?;

    let kind = ObjectType::from_bytes(&header[..space])?;

    let len_part = &header[space + 1..];
    let len_str = std::str::from_utf8(len_part)
        .map_err(|_| GitError::InvalidObject("length is not valid ASCII".to_string()))?;
    let declared: usize = len_str.parse().map_err(|_| {
        GitError::InvalidObject(format!("`{len_str}` is not a decimal payload length"))
    })?;

    let payload = &raw[nul + 1..];
    if payload.len() != declared {
        return Err(GitError::InvalidObject(format!(
            "declared length {declared} but payload has {} bytes",
            payload.len()
        )));
    }
    Ok((kind, payload))
}

#[cfg(test)]
mod tests {
    use crate::internal::object::{
        ObjectContents, encode_canonical, parse_canonical, types::ObjectType,
    };

    #[test]
    fn test_encode_parse_round_trip() {
        let payload = b"hello world";
        let raw = encode_canonical(ObjectType::Blob, payload);
        assert_eq!(&raw[..12], b"blob 11\0hell");
        let (kind, parsed) = parse_canonical(&raw).unwrap();
        assert_eq!(kind, ObjectType::Blob);
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_parse_rejects_missing_nul() {
        assert!(parse_canonical(b"blob 4 abcd").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_space() {
        assert!(parse_canonical(b"blob4\0abcd").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_kind() {
        assert!(parse_canonical(b"tag 4\0abcd").is_err());
    }

    #[test]
    fn test_parse_rejects_non_decimal_length() {
        assert!(parse_canonical(b"blob four\0abcd").is_err());
        // a second space lands inside the length field and fails the parse
        assert!(parse_canonical(b"blob 4 \0abcd").is_err());
    }

    /// Truncated and over-long payloads are rejected, never truncated or
    /// zero-padded to fit.
    #[test]
    fn test_parse_rejects_length_mismatch() {
        assert!(parse_canonical(b"blob 5\0abcd").is_err());
        assert!(parse_canonical(b"blob 3\0abcd").is_err());
    }

    #[test]
    fn test_contents_hash_matches_git() {
        let contents = ObjectContents::new(ObjectType::Blob, b"hello\n".to_vec());
        assert_eq!(
            contents.hash().to_string(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    /// Same payload under a different kind hashes to a different address.
    #[test]
    fn test_kind_is_part_of_identity() {
        let blob = ObjectContents::new(ObjectType::Blob, vec![]);
        let tree = ObjectContents::new(ObjectType::Tree, vec![]);
        assert_ne!(blob.hash(), tree.hash());
        // the empty tree is another well-known git constant
        assert_eq!(
            tree.hash().to_string(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }
}
