use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use super::{Metadata, MetadataValue, Resource, Stream};
use crate::{Error, Result};

/// A [`Stream`] backed by a file on disk.
#[derive(Debug)]
pub struct FileStream {
    file: Option<File>,
    path: PathBuf,
    writable: bool,
    eof: bool,
}

impl FileStream {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::with_file(file, path, false))
    }

    /// Creates or truncates `path` and opens it for reading and writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::with_file(file, path, true))
    }

    fn with_file(file: File, path: &Path, writable: bool) -> Self {
        Self {
            file: Some(file),
            path: path.to_owned(),
            writable,
            eof: false,
        }
    }

    /// The path this stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(Error::Detached)
    }
}

impl Stream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = self.file()?.read(buf)?;
        if read == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(read)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.writable {
            return Err(Error::WriteRejected);
        }
        Ok(self.file()?.write(buf)?)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let pos = self.file()?.seek(pos)?;
        self.eof = false;
        Ok(pos)
    }

    fn tell(&self) -> Result<u64> {
        let mut file = self.file.as_ref().ok_or(Error::Detached)?;
        Ok(file.stream_position()?)
    }

    fn eof(&self) -> bool {
        if self.eof {
            return true;
        }
        match (self.tell(), self.size()) {
            (Ok(pos), Some(size)) => pos >= size,
            _ => self.file.is_none(),
        }
    }

    fn size(&self) -> Option<u64> {
        let file = self.file.as_ref()?;
        file.metadata().ok().map(|m| m.len())
    }

    fn is_readable(&self) -> bool {
        self.file.is_some()
    }

    fn is_writable(&self) -> bool {
        self.writable && self.file.is_some()
    }

    fn is_seekable(&self) -> bool {
        self.file.is_some()
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn detach(&mut self) -> Option<Resource> {
        let file = self.file.take()?;
        Some(Box::new(file))
    }

    fn metadata(&self, key: Option<&str>) -> Option<Metadata> {
        self.file.as_ref()?;
        let mode = if self.writable { "w+b" } else { "rb" };
        let entries = BTreeMap::from([
            (
                "uri",
                MetadataValue::Str(self.path.to_string_lossy().into_owned().into()),
            ),
            ("mode", MetadataValue::Str(mode.into())),
            ("seekable", MetadataValue::Bool(true)),
            ("wrapper_type", MetadataValue::Str("plainfile".into())),
        ]);
        Metadata::lookup(entries, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("formstream-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_read_file_and_metadata() {
        let path = temp_path("read.txt");
        std::fs::write(&path, b"file body").unwrap();

        let mut stream = FileStream::open(&path).unwrap();
        assert_eq!(stream.size(), Some(9));
        assert!(!stream.is_writable());
        assert!(matches!(stream.write(b"x"), Err(Error::WriteRejected)));
        assert_eq!(stream.contents(None).unwrap(), b"file body");
        assert!(stream.eof());
        assert_eq!(
            stream.metadata(Some("uri")).unwrap().as_str(),
            Some(path.to_string_lossy().as_ref())
        );
        assert_eq!(
            stream.metadata(Some("mode")),
            Some(Metadata::Value(MetadataValue::Str("rb".into())))
        );
        assert!(stream.metadata(Some("nope")).is_none());

        stream.close();
        assert!(stream.metadata(None).is_none());
        assert!(matches!(stream.tell(), Err(Error::Detached)));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_create_and_write() {
        let path = temp_path("write.txt");
        let mut stream = FileStream::create(&path).unwrap();
        assert!(stream.is_writable());
        stream.write(b"written").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(stream.contents(Some(4)).unwrap(), b"writ");
        assert_eq!(stream.tell().unwrap(), 4);
        assert!(stream.detach().is_some());
        assert!(!stream.is_readable());
        std::fs::remove_file(&path).unwrap();
    }
}
