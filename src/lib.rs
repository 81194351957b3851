//! git-odb is a content-addressable object database compatible with git's
//! on-disk formats: canonical object encoding and SHA-1 addressing, the
//! loose object directory layout, v2 pack indexes, and pack files with
//! OFS_DELTA reconstruction.
//!
//! [`ObjectStorage`] is the top-level entry point; it resolves a hash
//! through the loose store first and then through any registered packs.

pub mod errors;
pub mod hash;
pub mod internal;
pub mod utils;

pub use errors::GitError;
pub use hash::ObjectHash;
pub use internal::object::{ObjectContents, ObjectTrait, types::ObjectType};
pub use internal::pack::{Pack, PackSource, idx::PackIndex};
pub use internal::storage::{ObjectStorage, loose::LooseStore};
