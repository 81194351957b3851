//! The Blob object: opaque file contents addressed by hash. A blob stores
//! no name, mode, or timestamp; all of that lives in the trees that point
//! at it.

use std::fmt::Display;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::object::{ObjectTrait, types::ObjectType},
};

/// Opaque payload bytes plus their content address.
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    pub id: ObjectHash,
    pub data: Vec<u8>,
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.data.as_bstr())
    }
}

impl Blob {
    /// Creates a blob from raw content, computing its address.
    pub fn from_content_bytes(data: Vec<u8>) -> Blob {
        let id = ObjectHash::from_type_and_data(ObjectType::Blob, &data);
        Blob { id, data }
    }
}

impl ObjectTrait for Blob {
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError> {
        Ok(Blob {
            id: hash,
            data: data.to_vec(),
        })
    }

    fn get_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn get_size(&self) -> usize {
        self.data.len()
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        Ok(self.data.clone())
    }
}
