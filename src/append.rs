//! A stream that reads a sequence of streams one after another.

use std::io::SeekFrom;

use formstream_interface::{stream::resolve_seek, BoxedStream, Resource, Stream};
use tracing::{trace, warn};

use crate::{Error, Result};

const SKIP_CHUNK: usize = 8192;

/// Concatenates several streams into one addressable stream.
///
/// Segments are read in the order they were added. The stream is seekable only while every
/// segment is seekable, and its size is only known while every segment size is known.
pub struct AppendStream {
    streams: Vec<BoxedStream>,
    current: usize,
    pos: u64,
    seekable: bool,
    detached: bool,
}

impl AppendStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self {
            streams: Vec::new(),
            current: 0,
            pos: 0,
            seekable: true,
            detached: false,
        }
    }

    /// Creates a stream out of `streams`, in iteration order.
    pub fn from_streams(streams: impl IntoIterator<Item = BoxedStream>) -> Result<Self> {
        let mut stream = Self::new();
        for s in streams {
            stream.add_stream(s)?;
        }
        Ok(stream)
    }

    /// Appends a segment. Every segment must be readable.
    pub fn add_stream(&mut self, stream: BoxedStream) -> Result<()> {
        if self.detached {
            return Err(Error::Detached);
        }
        if !stream.is_readable() {
            return Err(Error::InvalidInput("each stream must be readable".into()));
        }
        if !stream.is_seekable() {
            self.seekable = false;
        }
        self.streams.push(stream);
        Ok(())
    }

    /// Number of segments currently held.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Returns `true` when no segment has been added.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    fn rewind(&mut self) -> Result<()> {
        self.current = 0;
        self.pos = 0;
        for stream in &mut self.streams {
            stream.seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }

    fn seek_to(&mut self, target: u64) -> Result<()> {
        self.rewind()?;
        self.skip(target)?;
        if self.pos != target {
            return Err(Error::SeekOutOfBounds(target));
        }
        Ok(())
    }

    fn skip(&mut self, mut remaining: u64) -> Result<()> {
        let mut scratch = [0u8; SKIP_CHUNK];
        while remaining > 0 {
            let want = remaining.min(SKIP_CHUNK as u64) as usize;
            let read = self.read(&mut scratch[..want])?;
            if read == 0 {
                break;
            }
            remaining -= read as u64;
        }
        Ok(())
    }
}

impl Default for AppendStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for AppendStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.detached {
            return Err(Error::Detached);
        }
        let mut filled = 0;
        while filled < buf.len() {
            let Some(stream) = self.streams.get_mut(self.current) else {
                break;
            };
            let read = match stream.read(&mut buf[filled..]) {
                Ok(read) => read,
                // Deliver what was already copied; the next call reports the error.
                Err(_) if filled > 0 => break,
                Err(e) => return Err(e),
            };
            if read == 0 {
                if self.current + 1 >= self.streams.len() {
                    break;
                }
                self.current += 1;
                trace!(segment = self.current, pos = self.pos, "advancing to next segment");
                continue;
            }
            filled += read;
            self.pos += read as u64;
        }
        Ok(filled)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::WriteRejected)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        if self.detached {
            return Err(Error::Detached);
        }
        if !self.seekable {
            return Err(Error::NotSeekable);
        }
        let size = self.size();
        let target = resolve_seek(pos, self.pos, size)?;
        if size.is_some_and(|size| target > size) {
            return Err(Error::SeekOutOfBounds(target));
        }
        let previous = self.pos;
        if let Err(e) = self.seek_to(target) {
            if let Err(restore) = self.seek_to(previous) {
                warn!(cause = %restore, pos = previous, "failed to restore position after seek");
            }
            return Err(e);
        }
        Ok(self.pos)
    }

    fn tell(&self) -> Result<u64> {
        if self.detached {
            return Err(Error::Detached);
        }
        Ok(self.pos)
    }

    fn eof(&self) -> bool {
        match self.streams.last() {
            None => true,
            Some(last) => self.current + 1 >= self.streams.len() && last.eof(),
        }
    }

    fn size(&self) -> Option<u64> {
        if self.detached {
            return None;
        }
        self.streams.iter().map(|s| s.size()).sum()
    }

    fn is_readable(&self) -> bool {
        !self.detached
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        self.seekable && !self.detached
    }

    fn close(&mut self) {
        self.pos = 0;
        self.current = 0;
        for stream in &mut self.streams {
            stream.close();
        }
        self.streams.clear();
    }

    fn detach(&mut self) -> Option<Resource> {
        self.close();
        self.detached = true;
        None
    }
}

impl Drop for AppendStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AppendStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppendStream")
            .field("segments", &self.streams.len())
            .field("current", &self.current)
            .field("pos", &self.pos)
            .field("seekable", &self.seekable)
            .field("detached", &self.detached)
            .finish()
    }
}
