//! The Tree object: a directory listing. The payload is a back-to-back
//! concatenation of entries with no separators beyond what each entry
//! carries:
//!
//! ```text
//! <mode> <name>\0<20 raw hash bytes>
//! ```
//!
//! Entries are not newline-separated and there is no delimiter between the
//! name's NUL and the raw hash, so parsing tracks exact byte offsets.

use std::fmt::Display;

use memchr::memchr;
use serde::{Deserialize, Serialize};

use crate::{
    errors::GitError,
    hash::{HASH_SIZE, ObjectHash},
    internal::object::{ObjectTrait, types::ObjectType},
};

/// File mode of a tree entry, as the ASCII octal-ish string stored on disk.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TreeItemMode {
    Blob,
    BlobExecutable,
    Tree,
    Link,
}

impl Display for TreeItemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.to_bytes()))
    }
}

impl TreeItemMode {
    pub fn to_bytes(self) -> &'static [u8] {
        match self {
            TreeItemMode::Blob => b"100644",
            TreeItemMode::BlobExecutable => b"100755",
            TreeItemMode::Tree => b"40000",
            TreeItemMode::Link => b"120000",
        }
    }

    pub fn from_bytes(mode: &[u8]) -> Result<TreeItemMode, GitError> {
        match mode {
            b"100644" => Ok(TreeItemMode::Blob),
            b"100755" => Ok(TreeItemMode::BlobExecutable),
            b"40000" => Ok(TreeItemMode::Tree),
            b"120000" => Ok(TreeItemMode::Link),
            _ => Err(GitError::InvalidTreeItem(
                String::from_utf8_lossy(mode).to_string(),
            )),
        }
    }
}

/// One entry of a tree: mode, name, and the hash it points at.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct TreeItem {
    pub mode: TreeItemMode,
    pub id: ObjectHash,
    pub name: String,
}

impl Display for TreeItem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} {}", self.mode, self.id, self.name)
    }
}

impl TreeItem {
    pub fn new(mode: TreeItemMode, id: ObjectHash, name: String) -> TreeItem {
        TreeItem { mode, id, name }
    }

    /// Serializes as `<mode> <name>\0<raw hash>`.
    pub fn to_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + HASH_SIZE + 8);
        out.extend_from_slice(self.mode.to_bytes());
        out.push(b' ');
        out.extend_from_slice(self.name.as_bytes());
        out.push(b'\0');
        out.extend_from_slice(self.id.as_ref());
        out
    }
}

/// A directory listing plus its content address.
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub id: ObjectHash,
    pub tree_items: Vec<TreeItem>,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for item in self.tree_items.iter() {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}

impl Tree {
    /// Builds a tree from entries, sorting by name and computing the id
    /// from the serialized payload.
    pub fn from_tree_items(mut tree_items: Vec<TreeItem>) -> Tree {
        tree_items.sort_by(|a, b| a.name.cmp(&b.name));
        let mut tree = Tree {
            id: ObjectHash::default(),
            tree_items,
        };
        let data = tree.payload();
        tree.id = ObjectHash::from_type_and_data(ObjectType::Tree, &data);
        tree
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for item in self.tree_items.iter() {
            out.extend_from_slice(&item.to_data());
        }
        out
    }
}

impl ObjectTrait for Tree {
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError> {
        let mut tree_items = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let rest = &data[pos..];
            let space = memchr(b' ', rest)
                .ok_or_else(|| GitError::InvalidTreeItem("entry missing mode".to_string()))?;
            let mode = TreeItemMode::from_bytes(&rest[..space])?;

            let after_mode = &rest[space + 1..];
            let nul = memchr(b'\0', after_mode)
                .ok_or_else(|| GitError::InvalidTreeItem("entry missing name".to_string()))?;
            let name = std::str::from_utf8(&after_mode[..nul])
                .map_err(|_| GitError::InvalidTreeItem("entry name is not UTF-8".to_string()))?
                .to_string();

            let hash_start = space + 1 + nul + 1;
            if rest.len() < hash_start + HASH_SIZE {
                return Err(GitError::InvalidTreeItem(format!(
                    "entry `{name}` truncated before its hash"
                )));
            }
            let id = ObjectHash::from_bytes(&rest[hash_start..hash_start + HASH_SIZE])?;

            tree_items.push(TreeItem::new(mode, id, name));
            pos += hash_start + HASH_SIZE;
        }
        Ok(Tree {
            id: hash,
            tree_items,
        })
    }

    fn get_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn get_size(&self) -> usize {
        self.payload().len()
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        Ok(self.payload())
    }
}
