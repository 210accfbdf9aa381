//! The generic stream interface.
//!
//! Every piece of a multipart body, from a literal boundary line to a file on disk, is
//! exposed through [`Stream`]. The trait mirrors the usual POSIX-like stream surface: a
//! single cursor moved by [`Stream::read`] and [`Stream::seek`], an optional known size,
//! and explicit release through [`Stream::close`] and [`Stream::detach`].

use std::io::{self, Read, Seek, SeekFrom};

use crate::Result;

mod bytes;
#[cfg(feature = "fs")]
mod file;
mod metadata;
mod reader;

pub use bytes::{create, BytesStream};
#[cfg(feature = "fs")]
#[cfg_attr(docsrs, doc(cfg(feature = "fs")))]
pub use file::FileStream;
pub use metadata::{Metadata, MetadataValue};
pub use reader::ReaderStream;

/// Trait for std readers that can back a stream resource.
pub trait BodyStream: Read + Seek + Send + 'static {}

impl<S: Read + Seek + Send + 'static + ?Sized> BodyStream for S {}

/// The raw resource handed back by [`Stream::detach`].
pub type Resource = Box<dyn BodyStream>;

/// Type alias for boxed streams.
pub type BoxedStream = Box<dyn Stream>;

/// A readable, optionally writable and seekable byte stream.
pub trait Stream: Send {
    /// Reads up to `buf.len()` bytes, returning `0` at the end of the stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes `buf` at the current position.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Moves the cursor and returns the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Returns the current cursor position.
    fn tell(&self) -> Result<u64>;

    /// Returns `true` once the stream has no more bytes to read.
    fn eof(&self) -> bool;

    /// Returns the total size in bytes, or `None` when it cannot be determined.
    fn size(&self) -> Option<u64>;

    /// Whether [`Stream::read`] is supported.
    fn is_readable(&self) -> bool;

    /// Whether [`Stream::write`] is supported.
    fn is_writable(&self) -> bool;

    /// Whether [`Stream::seek`] is supported.
    fn is_seekable(&self) -> bool;

    /// Releases the underlying resource. The stream is unusable afterwards.
    fn close(&mut self);

    /// Separates the underlying resource from the stream and hands it back, if the stream
    /// owns one. The stream is unusable afterwards.
    fn detach(&mut self) -> Option<Resource>;

    /// Looks up stream metadata. Streams without a metadata capability return `None`.
    ///
    /// With `key` set to `None` every known entry is returned as [`Metadata::All`].
    fn metadata(&self, key: Option<&str>) -> Option<Metadata> {
        let _ = key;
        None
    }

    /// Reads from the current position until the end of the stream, or until `max_len`
    /// bytes have been collected.
    fn contents(&mut self, max_len: Option<usize>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        copy_chunks(self, max_len, |chunk| {
            buffer.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok(buffer)
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }

    fn tell(&self) -> Result<u64> {
        (**self).tell()
    }

    fn eof(&self) -> bool {
        (**self).eof()
    }

    fn size(&self) -> Option<u64> {
        (**self).size()
    }

    fn is_readable(&self) -> bool {
        (**self).is_readable()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn detach(&mut self) -> Option<Resource> {
        (**self).detach()
    }

    fn metadata(&self, key: Option<&str>) -> Option<Metadata> {
        (**self).metadata(key)
    }

    fn contents(&mut self, max_len: Option<usize>) -> Result<Vec<u8>> {
        (**self).contents(max_len)
    }
}

const CHUNK_SIZE: usize = 8192;

/// Reads `stream` chunk by chunk into `sink` until the stream is drained or `max_len` bytes
/// have been read.
pub fn copy_chunks(
    stream: &mut (impl Stream + ?Sized),
    max_len: Option<usize>,
    mut sink: impl FnMut(&[u8]) -> Result<()>,
) -> Result<()> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total = 0usize;
    loop {
        let want = match max_len {
            Some(max) if total >= max => break,
            Some(max) => (max - total).min(CHUNK_SIZE),
            None => CHUNK_SIZE,
        };
        let read = stream.read(&mut chunk[..want])?;
        if read == 0 {
            break;
        }
        sink(&chunk[..read])?;
        total += read;
    }
    Ok(())
}

/// Resolves a [`SeekFrom`] against the current position and an optional size.
///
/// Fails when the target would be negative, overflow, or is relative to an unknown end.
pub fn resolve_seek(pos: SeekFrom, current: u64, size: Option<u64>) -> Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => current.checked_add_signed(delta),
        SeekFrom::End(delta) => {
            let size = size.ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "cannot seek relative to the end of a stream of unknown size",
                )
            })?;
            size.checked_add_signed(delta)
        }
    };
    target.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid seek to a negative or overflowing position",
        )
        .into()
    })
}
