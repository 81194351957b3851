//! Reader for v2 pack index (`.idx`) files, which map object hashes to byte
//! offsets inside a companion pack, faithfully following the
//! [pack-format spec](https://git-scm.com/docs/pack-format).
//!
//! Layout, all integers big-endian:
//!
//! 1. 8-byte header: magic `\xFF 't' 'O' 'c'` + version (must be 2).
//! 2. 256-entry fan-out table of cumulative counts; entry `N` is the number
//!    of objects whose hash starts with a byte `<= N`.
//! 3. `T` sorted 20-byte hashes (`T` = last fan-out entry).
//! 4. `T` CRC32 values over the raw packed record bytes.
//! 5. `T` 4-byte pack offsets, positionally aligned with the hash table.
//!    Offsets with the MSB set index the 64-bit extension table, which this
//!    reader does not support.
//! 6. 40-byte trailer: pack checksum + index checksum.
//!
//! Indexes are read-only, externally produced artifacts; there is no write
//! path.

use byteorder::{BigEndian, ByteOrder};
use sha1::{Digest, Sha1};

use crate::{
    errors::GitError,
    hash::{HASH_SIZE, ObjectHash},
};

/// The 4-byte index signature, `\377tOc` — an unreasonable fanout[0] value,
/// which is how v1 and v2 files are told apart.
pub const IDX_MAGIC: [u8; 4] = [0xFF, 0x74, 0x4F, 0x63];

const SUPPORTED_VERSION: u32 = 2;
const HEADER_SIZE: usize = 8;
const FANOUT_LEN: usize = 256;
const FANOUT_SIZE: usize = FANOUT_LEN * 4;
const TRAILER_SIZE: usize = HASH_SIZE * 2;

/// A fully parsed v2 pack index.
pub struct PackIndex {
    fanout: [u32; FANOUT_LEN],
    hashes: Vec<ObjectHash>,
    crc32: Vec<u32>,
    offsets: Vec<u32>,
    pack_checksum: ObjectHash,
}

impl PackIndex {
    /// Parses a complete index file held in memory, validating structure
    /// eagerly: magic/version, fan-out monotonicity, hash ordering, exact
    /// byte length, 31-bit offsets, and the trailing index checksum.
    pub fn from_bytes(buf: &[u8]) -> Result<PackIndex, GitError> {
        if buf.len() < HEADER_SIZE + FANOUT_SIZE + TRAILER_SIZE {
            return Err(GitError::CorruptIndex(format!(
                "file is {} bytes, too short for a v2 index",
                buf.len()
            )));
        }
        if buf[..4] != IDX_MAGIC {
            return Err(GitError::UnsupportedVersion(
                "bad magic, not a v2 index file".to_string(),
            ));
        }
        let version = BigEndian::read_u32(&buf[4..8]);
        if version != SUPPORTED_VERSION {
            return Err(GitError::UnsupportedVersion(format!(
                "index version {version}, only v2 is supported"
            )));
        }

        let mut fanout = [0u32; FANOUT_LEN];
        let mut prev = 0u32;
        for (i, item) in fanout.iter_mut().enumerate() {
            let count = BigEndian::read_u32(&buf[HEADER_SIZE + i * 4..HEADER_SIZE + i * 4 + 4]);
            if count < prev {
                return Err(GitError::CorruptIndex(format!(
                    "fan-out table decreases at byte {i:#04x}"
                )));
            }
            *item = count;
            prev = count;
        }
        let total = prev as usize;

        let expected_len =
            HEADER_SIZE + FANOUT_SIZE + total * (HASH_SIZE + 4 + 4) + TRAILER_SIZE;
        if buf.len() != expected_len {
            return Err(GitError::CorruptIndex(format!(
                "file is {} bytes, layout for {total} objects needs {expected_len}",
                buf.len()
            )));
        }

        let names_start = HEADER_SIZE + FANOUT_SIZE;
        let mut hashes = Vec::with_capacity(total);
        for i in 0..total {
            let raw = &buf[names_start + i * HASH_SIZE..names_start + (i + 1) * HASH_SIZE];
            let hash = ObjectHash::from_bytes(raw)?;
            if let Some(last) = hashes.last()
                && *last >= hash
            {
                return Err(GitError::CorruptIndex(format!(
                    "hash table not sorted ascending at entry {i}"
                )));
            }
            hashes.push(hash);
        }

        // Every hash must sit in the fan-out bucket its first byte selects.
        for (i, hash) in hashes.iter().enumerate() {
            let bucket = hash.0[0] as usize;
            let start = if bucket == 0 {
                0
            } else {
                fanout[bucket - 1] as usize
            };
            let end = fanout[bucket] as usize;
            if i < start || i >= end {
                return Err(GitError::CorruptIndex(format!(
                    "hash {hash} outside its fan-out bucket {bucket:#04x}"
                )));
            }
        }

        let crc_start = names_start + total * HASH_SIZE;
        let mut crc32 = Vec::with_capacity(total);
        for i in 0..total {
            crc32.push(BigEndian::read_u32(
                &buf[crc_start + i * 4..crc_start + i * 4 + 4],
            ));
        }

        let offsets_start = crc_start + total * 4;
        let mut offsets = Vec::with_capacity(total);
        for i in 0..total {
            let raw = BigEndian::read_u32(&buf[offsets_start + i * 4..offsets_start + i * 4 + 4]);
            if raw & 0x8000_0000 != 0 {
                return Err(GitError::CorruptIndex(
                    "64-bit offset extension table is not supported".to_string(),
                ));
            }
            offsets.push(raw);
        }

        let trailer_start = offsets_start + total * 4;
        let pack_checksum = ObjectHash::from_bytes(&buf[trailer_start..trailer_start + HASH_SIZE])?;
        let index_checksum =
            ObjectHash::from_bytes(&buf[trailer_start + HASH_SIZE..trailer_start + TRAILER_SIZE])?;

        let actual = Sha1::digest(&buf[..trailer_start + HASH_SIZE]);
        if actual.as_slice() != index_checksum.as_ref() {
            return Err(GitError::CorruptIndex(
                "index checksum mismatch".to_string(),
            ));
        }

        Ok(PackIndex {
            fanout,
            hashes,
            crc32,
            offsets,
            pack_checksum,
        })
    }

    /// Number of objects the companion pack holds.
    pub fn object_count(&self) -> usize {
        self.hashes.len()
    }

    /// Checksum of the companion pack file, from the trailer.
    pub fn pack_checksum(&self) -> &ObjectHash {
        &self.pack_checksum
    }

    /// Position of `hash` in the sorted table: fan-out bucket first, then
    /// binary search within it.
    fn position(&self, hash: &ObjectHash) -> Option<usize> {
        let bucket = hash.0[0] as usize;
        let start = if bucket == 0 {
            0
        } else {
            self.fanout[bucket - 1] as usize
        };
        let end = self.fanout[bucket] as usize;
        self.hashes[start..end]
            .binary_search(hash)
            .ok()
            .map(|i| start + i)
    }

    /// Byte offset of `hash` inside the companion pack file.
    pub fn get_offset(&self, hash: &ObjectHash) -> Option<u32> {
        self.position(hash).map(|i| self.offsets[i])
    }

    /// CRC32 of the raw packed record for `hash`.
    pub fn crc32(&self, hash: &ObjectHash) -> Option<u32> {
        self.position(hash).map(|i| self.crc32[i])
    }

    /// The `i`-th hash of the sorted table, for iteration in tests and
    /// verification passes.
    pub fn nth_hash(&self, i: usize) -> Option<&ObjectHash> {
        self.hashes.get(i)
    }
}
