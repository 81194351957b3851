//! zlib helpers for the two places DEFLATE shows up on disk: whole loose
//! object files, and per-record streams inside pack files.
//!
//! Pack records do not store their compressed length, so [`inflate_exact`]
//! reads from a `BufRead` and consumes exactly the bytes the decompressor
//! needs; wrapping the input in a [`crate::utils::CountingReader`] then
//! tells the caller where the record ends.

use std::io::{BufRead, Read, Write};

use flate2::{
    Compression, Decompress, FlushDecompress, Status, read::ZlibDecoder, write::ZlibEncoder,
};

use crate::errors::GitError;

/// Compress a full buffer into a zlib stream.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, GitError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a full zlib stream held in memory (the loose object case).
pub fn decompress_all(data: &[u8]) -> Result<Vec<u8>, GitError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| GitError::Compression(format!("corrupt deflate stream: {e}")))?;
    Ok(out)
}

/// Inflate one zlib stream from `rd`, expecting exactly `expected`
/// decompressed bytes.
///
/// Consumes input only as far as the decompressor signals end-of-stream; the
/// reader is left positioned on whatever follows the stream. A stream that
/// ends early or carries extra payload is an error, never a short or
/// oversized result.
pub fn inflate_exact(rd: &mut impl BufRead, expected: usize) -> Result<Vec<u8>, GitError> {
    let mut state = Decompress::new(true);
    let mut out: Vec<u8> = Vec::with_capacity(expected);

    loop {
        let (consumed, produced, ret, eof);
        {
            let input = rd.fill_buf()?;
            eof = input.is_empty();
            let before_in = state.total_in();
            let before_out = state.total_out();
            let flush = if eof {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };
            ret = state.decompress_vec(input, &mut out, flush);
            consumed = (state.total_in() - before_in) as usize;
            produced = (state.total_out() - before_out) as usize;
        }
        rd.consume(consumed);

        match ret {
            Ok(Status::StreamEnd) => break,
            Ok(Status::Ok | Status::BufError) => {
                if out.len() > expected {
                    return Err(GitError::InvalidObject(format!(
                        "inflated size exceeds declared size {expected}"
                    )));
                }
                if eof && consumed == 0 && produced == 0 {
                    return Err(GitError::Compression(
                        "deflate stream ended unexpectedly".to_string(),
                    ));
                }
                // Capacity full but the stream has not ended yet: grow by one
                // byte so an oversized stream becomes observable instead of
                // stalling the decompressor.
                if out.len() == out.capacity() {
                    out.reserve(1);
                }
            }
            Err(_) => {
                return Err(GitError::Compression("corrupt deflate stream".to_string()));
            }
        }
    }

    if out.len() != expected {
        return Err(GitError::InvalidObject(format!(
            "inflated {} bytes but header declared {expected}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use super::{compress, decompress_all, inflate_exact};
    use crate::errors::GitError;

    #[test]
    fn test_compress_decompress_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = compress(data).unwrap();
        assert_eq!(decompress_all(&compressed).unwrap(), data);
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let err = decompress_all(b"not a zlib stream").unwrap_err();
        assert!(matches!(err, GitError::Compression(_)));
    }

    #[test]
    fn test_inflate_exact_leaves_trailing_bytes() {
        let body = b"hello pack record";
        let mut stream = compress(body).unwrap();
        stream.extend_from_slice(b"NEXT RECORD");

        let mut reader = BufReader::new(stream.as_slice());
        let out = inflate_exact(&mut reader, body.len()).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn test_inflate_exact_rejects_short_declaration() {
        let body = b"hello pack record";
        let stream = compress(body).unwrap();
        let mut reader = BufReader::new(stream.as_slice());
        let err = inflate_exact(&mut reader, body.len() - 1).unwrap_err();
        assert!(matches!(err, GitError::InvalidObject(_)));
    }

    #[test]
    fn test_inflate_exact_rejects_long_declaration() {
        let body = b"hello pack record";
        let stream = compress(body).unwrap();
        let mut reader = BufReader::new(stream.as_slice());
        let err = inflate_exact(&mut reader, body.len() + 1).unwrap_err();
        assert!(matches!(err, GitError::InvalidObject(_)));
    }

    #[test]
    fn test_inflate_exact_rejects_truncated_stream() {
        let body = b"hello pack record";
        let mut stream = compress(body).unwrap();
        stream.truncate(stream.len() / 2);
        let mut reader = BufReader::new(stream.as_slice());
        assert!(inflate_exact(&mut reader, body.len()).is_err());
    }
}
