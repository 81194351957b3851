//! Object kind enumeration used across the loose and pack layers.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::errors::GitError;

const BLOB_OBJECT_TYPE: &[u8] = b"blob";
const TREE_OBJECT_TYPE: &[u8] = b"tree";
const COMMIT_OBJECT_TYPE: &[u8] = b"commit";

/// The three storable object kinds.
///
/// * `Blob`: opaque file contents.
/// * `Tree`: a directory listing, pointing at blobs and subtrees.
/// * `Commit`: a snapshot record pointing at one tree and any parent commits.
///
/// The kind is part of the object identity: it appears in the canonical
/// header that gets hashed, so the same payload stored as a blob and as a
/// tree yields two different addresses.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ObjectType::Blob => write!(f, "blob"),
            ObjectType::Tree => write!(f, "tree"),
            ObjectType::Commit => write!(f, "commit"),
        }
    }
}

impl ObjectType {
    /// The ASCII name written into the canonical header.
    pub fn to_bytes(&self) -> &'static [u8] {
        match self {
            ObjectType::Blob => BLOB_OBJECT_TYPE,
            ObjectType::Tree => TREE_OBJECT_TYPE,
            ObjectType::Commit => COMMIT_OBJECT_TYPE,
        }
    }

    /// Parses a kind name as it appears in a canonical header.
    pub fn from_bytes(s: &[u8]) -> Result<ObjectType, GitError> {
        match s {
            BLOB_OBJECT_TYPE => Ok(ObjectType::Blob),
            TREE_OBJECT_TYPE => Ok(ObjectType::Tree),
            COMMIT_OBJECT_TYPE => Ok(ObjectType::Commit),
            _ => Err(GitError::InvalidObjectType(
                String::from_utf8_lossy(s).to_string(),
            )),
        }
    }

    /// Parses a string representation of an object kind.
    pub fn from_string(s: &str) -> Result<ObjectType, GitError> {
        Self::from_bytes(s.as_bytes())
    }
}
