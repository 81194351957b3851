//! Decoder for delta instruction streams: rebuilds a target object from a
//! fully reconstructed base buffer plus the inflated instruction bytes of a
//! delta record.
//!
//! The stream starts with two varints (declared base size and result size),
//! then a sequence of instructions:
//!
//! - msb clear: the low 7 bits give a literal length, the bytes follow
//!   inline;
//! - msb set: copy from the base; bits 0-3 select up to four offset bytes
//!   and bits 4-6 up to three length bytes, assembled low byte first, with
//!   a zero length meaning `0x10000`.

use std::io::{ErrorKind, Read};

use crate::{errors::GitError, utils::read_bytes};

const VAR_INT_ENCODING_BITS: u8 = 7;
const VAR_INT_CONTINUE_FLAG: u8 = 1 << VAR_INT_ENCODING_BITS;

const COPY_INSTRUCTION_FLAG: u8 = 1 << 7; // msb set => copy from base, otherwise inline data
const COPY_OFFSET_BYTES: u8 = 4;
const COPY_SIZE_BYTES: u8 = 3;
const COPY_ZERO_SIZE: usize = 0x10000;

/// Read one varint byte, returning (7-bit value, has_more flag).
fn read_var_int_byte<R: Read>(stream: &mut R) -> std::io::Result<(u8, bool)> {
    let [byte] = read_bytes(stream)?;
    let value = byte & !VAR_INT_CONTINUE_FLAG;
    let more_bytes = byte & VAR_INT_CONTINUE_FLAG != 0;
    Ok((value, more_bytes))
}

/// Read a size varint (little-endian 7-bit chunks, msb as continue flag).
/// An encoding whose bits run past the width of `usize` is corrupt.
pub fn read_size_encoding<R: Read>(stream: &mut R) -> Result<usize, GitError> {
    let mut value = 0;
    let mut length = 0u32;
    loop {
        let (byte_value, more_bytes) = read_var_int_byte(stream)?;
        value |= (byte_value as usize) << length;
        if !more_bytes {
            return Ok(value);
        }
        length += VAR_INT_ENCODING_BITS as u32;
        if length >= usize::BITS {
            return Err(GitError::DeltaResolution(
                "size varint is too long".to_string(),
            ));
        }
    }
}

/// Read the OFS_DELTA base-offset integer. Unlike the size varint this is
/// big-endian-first, and each continuation byte adds `1 << 7` before the new
/// bits are shifted in, so multi-byte encodings have no redundant forms.
/// An accumulated value that would wrap `u64` is corrupt.
pub fn read_offset_encoding<R: Read>(stream: &mut R) -> Result<u64, GitError> {
    let [byte] = read_bytes(stream)?;
    let mut value = (byte & !VAR_INT_CONTINUE_FLAG) as u64;
    let mut more = byte & VAR_INT_CONTINUE_FLAG != 0;
    while more {
        let [byte] = read_bytes(stream)?;
        if value > (u64::MAX >> VAR_INT_ENCODING_BITS) - 1 {
            return Err(GitError::DeltaResolution(
                "base offset varint overflows".to_string(),
            ));
        }
        value = ((value + 1) << VAR_INT_ENCODING_BITS) | (byte & !VAR_INT_CONTINUE_FLAG) as u64;
        more = byte & VAR_INT_CONTINUE_FLAG != 0;
    }
    Ok(value)
}

/// Read a partial integer according to presence bits (copy instructions):
/// for each bit set in `present_bytes`, consume one byte and accumulate into
/// the value, shifting per byte index.
fn read_partial_int<R: Read>(
    stream: &mut R,
    bytes: u8,
    present_bytes: &mut u8,
) -> std::io::Result<usize> {
    let mut value: usize = 0;
    for byte_index in 0..bytes {
        if *present_bytes & 1 != 0 {
            let [byte] = read_bytes(stream)?;
            value |= (byte as usize) << (byte_index * 8);
        }
        *present_bytes >>= 1;
    }
    Ok(value)
}

/// Apply a delta instruction stream to `base`, returning the reconstructed
/// target bytes.
///
/// The declared base size must match the actual base length, and the output
/// must come out at exactly the declared result size; any out-of-range copy
/// or truncated instruction fails instead of producing partial data.
pub fn apply_delta(mut stream: &mut impl Read, base: &[u8]) -> Result<Vec<u8>, GitError> {
    let base_size = read_size_encoding(&mut stream)?;
    if base.len() != base_size {
        return Err(GitError::DeltaResolution(format!(
            "declared base size {base_size} but base object has {} bytes",
            base.len()
        )));
    }

    let result_size = read_size_encoding(&mut stream)?;
    let mut buffer = Vec::with_capacity(result_size);

    loop {
        // An exhausted stream means the target object is complete.
        let instruction = match read_bytes(stream) {
            Ok([instruction]) => instruction,
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(GitError::IOError(err)),
        };

        if instruction & COPY_INSTRUCTION_FLAG == 0 {
            // Appending 0 bytes doesn't make sense, so the format disallows it.
            if instruction == 0 {
                return Err(GitError::DeltaResolution(
                    "invalid zero-length literal instruction".to_string(),
                ));
            }
            let mut data = vec![0; instruction as usize];
            stream.read_exact(&mut data).map_err(|_| {
                GitError::DeltaResolution("literal instruction truncated".to_string())
            })?;
            buffer.extend_from_slice(&data);
        } else {
            let mut nonzero_bytes = instruction;
            let offset = read_partial_int(&mut stream, COPY_OFFSET_BYTES, &mut nonzero_bytes)?;
            let mut size = read_partial_int(&mut stream, COPY_SIZE_BYTES, &mut nonzero_bytes)?;
            if size == 0 {
                // Copying 0 bytes doesn't make sense, so a different size is assumed.
                size = COPY_ZERO_SIZE;
            }
            tracing::trace!(offset, size, "copy-from-base instruction");
            let end = offset.checked_add(size).ok_or_else(|| {
                GitError::DeltaResolution("copy range overflows".to_string())
            })?;
            let base_data = base.get(offset..end).ok_or_else(|| {
                GitError::DeltaResolution(format!(
                    "copy range {offset}..{end} outside base of {} bytes",
                    base.len()
                ))
            })?;
            buffer.extend_from_slice(base_data);
        }
    }

    if buffer.len() != result_size {
        return Err(GitError::DeltaResolution(format!(
            "reconstructed {} bytes but stream declared {result_size}",
            buffer.len()
        )));
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{apply_delta, read_offset_encoding, read_size_encoding};
    use crate::{errors::GitError, internal::pack::tests::encode_size};

    fn delta_header(base_len: usize, result_len: usize) -> Vec<u8> {
        let mut out = encode_size(base_len);
        out.extend_from_slice(&encode_size(result_len));
        out
    }

    /// Two-byte encoding of 300.
    #[test]
    fn test_read_size_encoding() {
        let mut cursor = Cursor::new(vec![0b1010_1100, 0b0000_0010]);
        assert_eq!(read_size_encoding(&mut cursor).unwrap(), 300);
    }

    #[test]
    fn test_read_offset_encoding() {
        // single byte
        let mut cursor = Cursor::new(vec![0x48]);
        assert_eq!(read_offset_encoding(&mut cursor).unwrap(), 0x48);
        // 200 encodes as 0x80 0x48 under the +1 correction rule
        let mut cursor = Cursor::new(vec![0x80, 0x48]);
        assert_eq!(read_offset_encoding(&mut cursor).unwrap(), 200);
    }

    /// A size varint may spell out at most the width of `usize`; endless
    /// continuation bytes are corruption, not a shift panic.
    #[test]
    fn test_overlong_size_varint_fails() {
        let mut cursor = Cursor::new(vec![0xFF; 16]);
        let err = read_size_encoding(&mut cursor).unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }

    /// Same for the base-offset encoding: the accumulator must never wrap
    /// `u64` into a bogus but in-range offset.
    #[test]
    fn test_overlong_offset_varint_fails() {
        let mut cursor = Cursor::new(vec![0xFF; 16]);
        let err = read_offset_encoding(&mut cursor).unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }

    /// The overflow guard surfaces through `apply_delta` when the leading
    /// base-size varint is over-long.
    #[test]
    fn test_apply_delta_rejects_overlong_base_size() {
        let delta = vec![0xFF; 16];
        let err = apply_delta(&mut Cursor::new(delta), b"base").unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }

    #[test]
    fn test_literal_and_copy_round_trip() {
        let base = b"hello world";
        // copy "hello " (offset 0, size 6) then insert "rust"
        let mut delta = delta_header(base.len(), 10);
        delta.extend_from_slice(&[0b1001_0001, 0x00, 0x06]); // copy: offset byte 0, size byte 6
        delta.push(4);
        delta.extend_from_slice(b"rust");

        let out = apply_delta(&mut Cursor::new(delta), base).unwrap();
        assert_eq!(out, b"hello rust");
    }

    /// A copy instruction with no size bytes copies 0x10000 bytes.
    #[test]
    fn test_zero_size_copy_means_64k() {
        let base = vec![7u8; 0x10000 + 10];
        let mut delta = delta_header(base.len(), 0x10000);
        delta.push(0b1000_0000); // copy, no offset bytes, no size bytes
        let out = apply_delta(&mut Cursor::new(delta), &base).unwrap();
        assert_eq!(out.len(), 0x10000);
    }

    #[test]
    fn test_base_size_mismatch_fails() {
        let delta = delta_header(5, 1);
        let err = apply_delta(&mut Cursor::new(delta), b"not five").unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }

    #[test]
    fn test_copy_out_of_range_fails() {
        let base = b"tiny";
        let mut delta = delta_header(base.len(), 8);
        delta.extend_from_slice(&[0b1001_0001, 0x02, 0x08]); // offset 2, size 8 > base end
        let err = apply_delta(&mut Cursor::new(delta), base).unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }

    #[test]
    fn test_zero_length_literal_fails() {
        let base = b"base";
        let mut delta = delta_header(base.len(), 1);
        delta.push(0);
        let err = apply_delta(&mut Cursor::new(delta), base).unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }

    #[test]
    fn test_result_size_mismatch_fails() {
        let base = b"base";
        let mut delta = delta_header(base.len(), 9); // declares 9, produces 4
        delta.push(4);
        delta.extend_from_slice(b"data");
        let err = apply_delta(&mut Cursor::new(delta), base).unwrap_err();
        assert!(matches!(err, GitError::DeltaResolution(_)));
    }
}
