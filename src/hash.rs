//! SHA-1 content identifiers for git objects.
//!
//! Every object is addressed by the SHA-1 digest of its canonical
//! serialization (`"<kind> <len>\0" + payload`, header included). The
//! [`ObjectHash`] struct wraps the raw 20-byte digest and provides the hex
//! string view plus the 2/38 path split used by the loose on-disk layout.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::{errors::GitError, internal::object::types::ObjectType};

/// Size of a raw SHA-1 digest in bytes.
pub const HASH_SIZE: usize = 20;

/// Length of the canonical lowercase hex form.
pub const HASH_HEX_LEN: usize = 40;

/// A 20-byte object identifier.
///
/// Two hashes are equal iff their raw bytes are equal; ordering is raw-byte
/// ordering, which is what the sorted pack index tables rely on. Immutable
/// once constructed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ObjectHash(pub [u8; HASH_SIZE]);

impl Display for ObjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ObjectHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for ObjectHash {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_HEX_LEN {
            return Err(GitError::MalformedHash(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| GitError::MalformedHash(s.to_string()))?;
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(&bytes);
        Ok(ObjectHash(h))
    }
}

impl ObjectHash {
    /// Digest of an arbitrary byte sequence.
    pub fn new(data: &[u8]) -> ObjectHash {
        let digest = Sha1::digest(data);
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(&digest);
        ObjectHash(h)
    }

    /// The object identity: digest of `"<kind> <len>\0" + payload`.
    pub fn from_type_and_data(object_type: ObjectType, data: &[u8]) -> ObjectHash {
        let mut hasher = Sha1::new();
        hasher.update(object_type.to_bytes());
        hasher.update(b" ");
        hasher.update(data.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(data);
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(&hasher.finalize());
        ObjectHash(h)
    }

    /// Create an `ObjectHash` from a raw byte slice, which must be exactly
    /// 20 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<ObjectHash, GitError> {
        if bytes.len() != HASH_SIZE {
            return Err(GitError::MalformedHash(hex::encode(bytes)));
        }
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(bytes);
        Ok(ObjectHash(h))
    }

    /// Export the hash to a byte vector.
    pub fn to_data(self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// The loose-layout split: first two hex characters name the fan-out
    /// directory, the remaining 38 name the file.
    pub fn to_path_pair(&self) -> (String, String) {
        let hex = hex::encode(self.0);
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::{hash::ObjectHash, internal::object::types::ObjectType};

    #[test]
    fn test_sha1_new() {
        let data = "Hello, world!".as_bytes();
        let hash = ObjectHash::new(data);
        assert_eq!(hash.to_string(), "943a702d06f34599aee1f8da8ef9f7296031d699");
    }

    /// `git hash-object` of the empty blob is a fixed, well-known value.
    #[test]
    fn test_empty_blob_hash() {
        let hash = ObjectHash::from_type_and_data(ObjectType::Blob, b"");
        assert_eq!(hash.to_string(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    /// `echo hello | git hash-object --stdin`
    #[test]
    fn test_blob_hash_matches_git() {
        let hash = ObjectHash::from_type_and_data(ObjectType::Blob, b"hello\n");
        assert_eq!(hash.to_string(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn test_from_bytes() {
        let raw = [
            0x8a, 0xb6, 0x86, 0xea, 0xfe, 0xb1, 0xf4, 0x47, 0x02, 0x73, 0x8c, 0x8b, 0x0f, 0x24,
            0xf2, 0x56, 0x7c, 0x36, 0xda, 0x6d,
        ];
        let hash = ObjectHash::from_bytes(&raw).unwrap();
        assert_eq!(hash.to_string(), "8ab686eafeb1f44702738c8b0f24f2567c36da6d");
        assert_eq!(hash.to_data(), raw.to_vec());
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(ObjectHash::from_bytes(&[0u8; 19]).is_err());
        assert!(ObjectHash::from_bytes(&[0u8; 21]).is_err());
    }

    #[test]
    fn test_from_str_round_trip() {
        let s = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";
        let hash = ObjectHash::from_str(s).unwrap();
        assert_eq!(hash.to_string(), s);
    }

    #[test]
    fn test_from_str_rejects_bad_input() {
        // wrong length
        assert!(ObjectHash::from_str("8ab686").is_err());
        // non-hex characters, right length
        assert!(ObjectHash::from_str("zzb686eafeb1f44702738c8b0f24f2567c36da6d").is_err());
    }

    #[test]
    fn test_path_pair_split() {
        let hash = ObjectHash::from_str("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        let (dir, file) = hash.to_path_pair();
        assert_eq!(dir, "ce");
        assert_eq!(file, "013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn test_ordering_is_raw_byte_ordering() {
        let a = ObjectHash([0u8; 20]);
        let mut raw = [0u8; 20];
        raw[0] = 1;
        let b = ObjectHash(raw);
        assert!(a < b);
    }
}
