//! The Commit object: a snapshot record. The payload is text: a `tree`
//! line, zero or more `parent` lines, `author` and `committer` signature
//! lines, a blank line, and the free-form message.

use std::fmt::Display;
use std::str::FromStr;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::object::{ObjectTrait, signature::Signature, types::ObjectType},
};

/// A parsed commit payload plus its content address.
///
/// `parent_commit_ids` keeps on-disk order; merge commits simply carry more
/// than one parent line. The message is everything after the first blank
/// line, byte-for-byte.
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: ObjectHash,
    pub tree_id: ObjectHash,
    pub parent_commit_ids: Vec<ObjectHash>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "tree {}", self.tree_id)?;
        for parent in self.parent_commit_ids.iter() {
            writeln!(f, "parent {parent}")?;
        }
        writeln!(f, "{}", self.author)?;
        writeln!(f, "{}", self.committer)?;
        writeln!(f)?;
        write!(f, "{}", self.message)
    }
}

impl Commit {
    pub fn new(
        author: Signature,
        committer: Signature,
        tree_id: ObjectHash,
        parent_commit_ids: Vec<ObjectHash>,
        message: &str,
    ) -> Result<Commit, GitError> {
        let mut commit = Commit {
            id: ObjectHash::default(),
            tree_id,
            parent_commit_ids,
            author,
            committer,
            message: message.to_string(),
        };
        commit.id = ObjectHash::from_type_and_data(ObjectType::Commit, &commit.to_data()?);
        Ok(commit)
    }
}

impl ObjectTrait for Commit {
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError> {
        let header_end = data.find(b"\n\n").ok_or_else(|| {
            GitError::InvalidCommitObject("missing blank line before message".to_string())
        })?;
        let message = data[header_end + 2..]
            .to_str()
            .map_err(|_| GitError::InvalidCommitObject("message is not UTF-8".to_string()))?
            .to_string();

        let mut tree_id = None;
        let mut parent_commit_ids = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in data[..header_end].lines() {
            let Some(space) = line.find_byte(b' ') else {
                continue;
            };
            let value = &line[space + 1..];
            match &line[..space] {
                b"tree" => {
                    let hex = value.to_str().map_err(|_| {
                        GitError::InvalidCommitObject("tree line is not UTF-8".to_string())
                    })?;
                    tree_id = Some(ObjectHash::from_str(hex)?);
                }
                b"parent" => {
                    let hex = value.to_str().map_err(|_| {
                        GitError::InvalidCommitObject("parent line is not UTF-8".to_string())
                    })?;
                    parent_commit_ids.push(ObjectHash::from_str(hex)?);
                }
                b"author" => author = Some(Signature::from_data(line.to_vec())?),
                b"committer" => committer = Some(Signature::from_data(line.to_vec())?),
                // other headers (gpgsig, encoding, ...) are skipped
                _ => {}
            }
        }

        Ok(Commit {
            id: hash,
            tree_id: tree_id.ok_or_else(|| {
                GitError::InvalidCommitObject("missing tree line".to_string())
            })?,
            parent_commit_ids,
            author: author.ok_or_else(|| {
                GitError::InvalidCommitObject("missing author line".to_string())
            })?,
            committer: committer.ok_or_else(|| {
                GitError::InvalidCommitObject("missing committer line".to_string())
            })?,
            message,
        })
    }

    fn get_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn get_size(&self) -> usize {
        self.to_string().len()
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        Ok(self.to_string().into_bytes())
    }
}
