use std::io::{self, Read, SeekFrom};

use super::{resolve_seek, BodyStream, Resource, Stream};
use crate::{Error, Result};

enum Source {
    Seekable(Resource),
    Sequential(Box<dyn Read + Send>),
}

/// A [`Stream`] over a std reader, with an optionally known size.
pub struct ReaderStream {
    source: Option<Source>,
    size: Option<u64>,
    pos: u64,
    drained: bool,
}

impl ReaderStream {
    /// Wraps a seekable reader. `size` is the total length when known.
    pub fn new(reader: impl BodyStream, size: Option<u64>) -> Self {
        Self::from_source(Source::Seekable(Box::new(reader)), size)
    }

    /// Wraps a forward-only reader such as a pipe or socket.
    pub fn sequential(reader: impl Read + Send + 'static, size: Option<u64>) -> Self {
        Self::from_source(Source::Sequential(Box::new(reader)), size)
    }

    fn from_source(source: Source, size: Option<u64>) -> Self {
        Self {
            source: Some(source),
            size,
            pos: 0,
            drained: false,
        }
    }
}

impl Stream for ReaderStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = match self.source.as_mut().ok_or(Error::Detached)? {
            Source::Seekable(reader) => Read::read(reader, buf)?,
            Source::Sequential(reader) => Read::read(reader, buf)?,
        };
        if read == 0 && !buf.is_empty() {
            self.drained = true;
        }
        self.pos += read as u64;
        Ok(read)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::WriteRejected)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let reader = match self.source.as_mut().ok_or(Error::Detached)? {
            Source::Seekable(reader) => reader,
            Source::Sequential(_) => return Err(Error::NotSeekable),
        };
        let target = resolve_seek(pos, self.pos, self.size)?;
        self.pos = io::Seek::seek(reader, SeekFrom::Start(target))?;
        self.drained = false;
        Ok(self.pos)
    }

    fn tell(&self) -> Result<u64> {
        match self.source {
            Some(_) => Ok(self.pos),
            None => Err(Error::Detached),
        }
    }

    fn eof(&self) -> bool {
        self.source.is_none() || self.drained || self.size.is_some_and(|size| self.pos >= size)
    }

    fn size(&self) -> Option<u64> {
        self.source.as_ref().and(self.size)
    }

    fn is_readable(&self) -> bool {
        self.source.is_some()
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        matches!(self.source, Some(Source::Seekable(_)))
    }

    fn close(&mut self) {
        self.source = None;
        self.pos = 0;
    }

    fn detach(&mut self) -> Option<Resource> {
        self.pos = 0;
        match self.source.take()? {
            Source::Seekable(reader) => Some(reader),
            Source::Sequential(_) => None,
        }
    }
}

impl std::fmt::Debug for ReaderStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderStream")
            .field("seekable", &self.is_seekable())
            .field("size", &self.size)
            .field("pos", &self.pos)
            .finish()
    }
}
