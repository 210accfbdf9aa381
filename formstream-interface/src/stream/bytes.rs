use std::io::{Cursor, SeekFrom};

use super::{resolve_seek, Resource, Stream};
use crate::{Error, Result};

/// An in-memory byte stream.
#[derive(Debug, Clone)]
pub struct BytesStream {
    data: Option<Vec<u8>>,
    pos: usize,
}

/// Creates a literal stream from bytes or a string.
pub fn create(content: impl Into<Vec<u8>>) -> BytesStream {
    BytesStream::new(content)
}

impl BytesStream {
    /// Creates a stream positioned at the start of `content`.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(content.into()),
            pos: 0,
        }
    }

    /// Returns the whole buffer regardless of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }
}

impl From<&'static str> for BytesStream {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BytesStream {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Vec<u8>> for BytesStream {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl Stream for BytesStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let data = self.data.as_deref().ok_or(Error::Detached)?;
        let remaining = data.get(self.pos..).unwrap_or_default();
        let len = remaining.len().min(buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        self.pos += len;
        Ok(len)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let data = self.data.as_mut().ok_or(Error::Detached)?;
        let end = self.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let data = self.data.as_deref().ok_or(Error::Detached)?;
        let len = data.len() as u64;
        let target = resolve_seek(pos, self.pos as u64, Some(len))?;
        if target > len {
            return Err(Error::SeekOutOfBounds(target));
        }
        self.pos = target as usize;
        Ok(target)
    }

    fn tell(&self) -> Result<u64> {
        match self.data {
            Some(_) => Ok(self.pos as u64),
            None => Err(Error::Detached),
        }
    }

    fn eof(&self) -> bool {
        self.data.as_ref().map_or(true, |data| self.pos >= data.len())
    }

    fn size(&self) -> Option<u64> {
        self.data.as_ref().map(|data| data.len() as u64)
    }

    fn is_readable(&self) -> bool {
        self.data.is_some()
    }

    fn is_writable(&self) -> bool {
        self.data.is_some()
    }

    fn is_seekable(&self) -> bool {
        self.data.is_some()
    }

    fn close(&mut self) {
        self.data = None;
        self.pos = 0;
    }

    fn detach(&mut self) -> Option<Resource> {
        self.pos = 0;
        let data = self.data.take()?;
        Some(Box::new(Cursor::new(data)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;

    #[test]
    fn test_read_until_eof() {
        let mut stream = create("hello");
        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert!(!stream.eof());
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
        assert!(stream.eof());
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.tell().unwrap(), 5);
    }

    #[test]
    fn test_write_overwrites_and_extends() {
        let mut stream = create("abcd");
        stream.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(stream.write(b"XYZ").unwrap(), 3);
        assert_eq!(stream.as_bytes(), b"abXYZ");
        assert_eq!(stream.size(), Some(5));
    }

    #[test]
    fn test_seek_bounds() {
        let mut stream = create("abcd");
        assert_eq!(stream.seek(SeekFrom::End(-1)).unwrap(), 3);
        assert_eq!(stream.seek(SeekFrom::Current(-3)).unwrap(), 0);
        assert!(matches!(
            stream.seek(SeekFrom::Start(5)),
            Err(Error::SeekOutOfBounds(5))
        ));
        assert!(stream.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn test_empty_stream_is_eof() {
        let stream = create("");
        assert!(stream.eof());
        assert_eq!(stream.size(), Some(0));
    }

    #[test]
    fn test_detach_hands_back_bytes() {
        let mut stream = create("data");
        let mut resource = stream.detach().unwrap();
        let mut out = String::new();
        resource.read_to_string(&mut out).unwrap();
        assert_eq!(out, "data");
        assert!(!stream.is_readable());
        assert!(stream.eof());
        assert_eq!(stream.size(), None);
        assert!(matches!(stream.read(&mut [0u8; 4]), Err(Error::Detached)));
        assert!(stream.detach().is_none());
    }

    #[test]
    fn test_close_releases_buffer() {
        let mut stream = create("data");
        stream.close();
        assert!(matches!(stream.tell(), Err(Error::Detached)));
        assert!(!stream.is_seekable());
    }
}
