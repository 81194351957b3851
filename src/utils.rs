//! Shared I/O utilities: fixed-size reads and a byte-counting reader used to
//! measure exactly how much of a pack record the decompressor consumed.

use std::{
    io,
    io::{BufRead, Read},
};

/// Read exactly `N` bytes from the stream into a fixed array.
#[inline]
pub fn read_bytes<R: Read, const N: usize>(stream: &mut R) -> io::Result<[u8; N]> {
    let mut bytes = [0; N];
    stream.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// A lightweight wrapper that counts bytes consumed from the underlying
/// reader. Pack records carry no compressed length, so the only way to learn
/// a record's on-disk extent is to count what the inflater actually used.
pub struct CountingReader<R> {
    pub inner: R,
    pub bytes_read: u64,
}

impl<R> CountingReader<R> {
    /// Creates a new `CountingReader` wrapping the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CountingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.bytes_read += amt as u64;
        self.inner.consume(amt);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Read};

    use super::{CountingReader, read_bytes};

    #[test]
    fn test_read_bytes() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]);
        let bytes: [u8; 3] = read_bytes(&mut cursor).unwrap();
        assert_eq!(bytes, [1, 2, 3]);
    }

    #[test]
    fn test_counting_reader_counts_reads() {
        let data = vec![0u8; 10];
        let mut reader = CountingReader::new(BufReader::new(Cursor::new(data)));
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.bytes_read, 4);
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.bytes_read, 8);
    }
}
