//! Streaming `multipart/form-data` bodies.
//!
//! A [`MultipartBody`] lays out every field and file of a form as a sequence of segments in
//! an [`AppendStream`]: literal boundary and header text around the caller's file content
//! streams, which are read lazily and never copied. The body itself is a [`Stream`], so it
//! can be measured, read, rewound and released like any other stream.

use std::{
    borrow::Cow,
    io::{self, SeekFrom},
};

use formstream_interface::{create, FormFile, Metadata, Resource, Stream};
use tracing::{debug, error};

use crate::{utils, AppendStream, Error, Result};

mod boundary;

use boundary::generate_multipart_boundary;

/// A read-only stream producing a `multipart/form-data` body.
///
/// The segment layout is fixed at construction: every field in the given order, then for
/// each file its header block, its content and a line break, and finally the closing
/// boundary.
///
/// Neither field values nor file headers are checked against the boundary. Callers that
/// supply their own boundary must make sure it does not occur in the content.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    stream: AppendStream,
}

impl MultipartBody {
    /// Encodes `fields` and `files` into a new body.
    ///
    /// A boundary is generated when `boundary` is `None` or empty. Fails with
    /// [`Error::InvalidInput`] before anything is built if a file's content stream is not
    /// readable.
    pub fn new<K, V>(
        fields: impl IntoIterator<Item = (K, V)>,
        files: impl IntoIterator<Item = Box<dyn FormFile>>,
        boundary: Option<&str>,
    ) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let files: Vec<_> = files.into_iter().collect();
        if let Some(index) = files.iter().position(|f| !f.content().is_readable()) {
            return Err(Error::InvalidInput(
                format!("file #{index} does not expose a readable content stream").into(),
            ));
        }

        let boundary = match boundary {
            Some(b) if !b.is_empty() => b.to_owned(),
            _ => generate_multipart_boundary(),
        };

        let mut stream = AppendStream::new();
        let mut field_count = 0;
        for (name, value) in fields {
            let part = field_string(&boundary, name.as_ref(), value.as_ref());
            stream.add_stream(Box::new(create(part)))?;
            field_count += 1;
        }

        let file_count = files.len();
        for file in files {
            stream.add_stream(Box::new(create(file_headers(&boundary, file.headers()))))?;
            stream.add_stream(file.into_content())?;
            stream.add_stream(Box::new(create("\r\n")))?;
        }

        stream.add_stream(Box::new(create(format!("--{boundary}--"))))?;

        debug!(
            boundary = %boundary,
            fields = field_count,
            files = file_count,
            segments = stream.len(),
            "assembled multipart body"
        );
        Ok(Self { boundary, stream })
    }

    /// The boundary separating the parts of this body.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The value for a `Content-Type` header announcing this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Reads the whole body from the start.
    ///
    /// Errors are logged and result in an empty buffer instead of being returned.
    pub fn dump(&mut self) -> Vec<u8> {
        let result = self
            .stream
            .seek(SeekFrom::Start(0))
            .and_then(|_| utils::copy_to_bytes(&mut self.stream, None));
        match result {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(cause = %e, "failed to dump multipart body");
                Vec::new()
            }
        }
    }

    /// Same as [`MultipartBody::dump`], decoded as UTF-8 with invalid sequences replaced.
    pub fn dump_string(&mut self) -> String {
        String::from_utf8_lossy(&self.dump()).into_owned()
    }

    /// Releases every segment, including the file content streams.
    ///
    /// The body stays usable as a value but refuses reads and seeks afterwards.
    pub fn detach(&mut self) -> &mut Self {
        self.stream.detach();
        self
    }
}

impl Stream for MultipartBody {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::WriteRejected)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.stream.seek(pos)
    }

    fn tell(&self) -> Result<u64> {
        self.stream.tell()
    }

    fn eof(&self) -> bool {
        self.stream.eof()
    }

    fn size(&self) -> Option<u64> {
        self.stream.size()
    }

    fn is_readable(&self) -> bool {
        self.stream.is_readable()
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        self.stream.is_seekable()
    }

    fn close(&mut self) {
        self.stream.close()
    }

    fn detach(&mut self) -> Option<Resource> {
        MultipartBody::detach(self);
        None
    }

    fn metadata(&self, key: Option<&str>) -> Option<Metadata> {
        self.stream.metadata(key)
    }

    fn contents(&mut self, max_len: Option<usize>) -> Result<Vec<u8>> {
        utils::copy_to_bytes(&mut self.stream, max_len)
    }
}

impl io::Read for MultipartBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.stream.read(buf)?)
    }
}

impl io::Seek for MultipartBody {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.stream.seek(pos)?)
    }
}

mod trait_assert {
    trait _AssertMarker: Send {}
    impl _AssertMarker for super::MultipartBody {}
}

fn field_string(boundary: &str, name: &str, value: &str) -> String {
    format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

fn file_headers(boundary: &str, headers: &[(Cow<'static, str>, Cow<'static, str>)]) -> String {
    let lines: String = headers
        .iter()
        .map(|(key, value)| format!("{key}: {value}\r\n"))
        .collect();
    const PADDING: &[char] = &[' ', '\t', '\r', '\n', '\0', '\x0b'];
    let lines = lines.trim_matches(PADDING);
    format!("--{boundary}\r\n{lines}\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use std::{
        io::Cursor,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    };

    use formstream_interface::{BytesStream, ReaderStream};

    use super::*;
    use crate::PostFile;

    const NO_FIELDS: [(&str, &str); 0] = [];

    fn no_files() -> Vec<Box<dyn FormFile>> {
        vec![]
    }

    fn boxed(file: PostFile) -> Box<dyn FormFile> {
        Box::new(file)
    }

    fn text_file(name: &str, filename: &str, content: &'static str) -> Box<dyn FormFile> {
        boxed(PostFile::new(
            name.to_owned(),
            create(content),
            Some(filename.to_owned().into()),
            vec![],
        ))
    }

    #[test]
    fn test_single_field() {
        let mut body = MultipartBody::new([("name", "bob")], no_files(), Some("X")).unwrap();
        assert_eq!(
            body.dump_string(),
            "--X\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nbob\r\n--X--"
        );
    }

    #[test]
    fn test_single_file() {
        let file = PostFile::new(
            "f",
            create("hi"),
            None,
            vec![
                (
                    "Content-Disposition".into(),
                    "form-data; name=\"f\"; filename=\"a.txt\"".into(),
                ),
                ("Content-Type".into(), "text/plain".into()),
            ],
        );
        let mut body = MultipartBody::new(NO_FIELDS, [boxed(file)], Some("X")).unwrap();
        assert_eq!(
            body.dump_string(),
            "--X\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\n\
             Content-Type: text/plain\r\n\r\nhi\r\n--X--"
        );
    }

    #[test]
    fn test_fields_then_files_in_order() {
        let mut body = MultipartBody::new(
            [("a", "1"), ("b", "2"), ("a", "3")],
            [
                text_file("f1", "one.txt", "first"),
                text_file("f2", "two.bin", "second"),
            ],
            Some("B"),
        )
        .unwrap();
        let dumped = body.dump_string();
        let expected = concat!(
            "--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n",
            "--B\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\n2\r\n",
            "--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n3\r\n",
            "--B\r\nContent-Disposition: form-data; name=\"f1\"; filename=\"one.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\nfirst\r\n",
            "--B\r\nContent-Disposition: form-data; name=\"f2\"; filename=\"two.bin\"\r\n",
            "Content-Type: application/octet-stream\r\n\r\nsecond\r\n",
            "--B--",
        );
        assert_eq!(dumped, expected);
        assert_eq!(body.size(), Some(expected.len() as u64));
    }

    #[test]
    fn test_empty_body() {
        let mut body = MultipartBody::new(NO_FIELDS, no_files(), Some("X")).unwrap();
        assert_eq!(body.size(), Some(5));
        assert_eq!(body.dump_string(), "--X--");
        assert!(!body.is_writable());
        assert!(matches!(body.write(b"x"), Err(Error::WriteRejected)));
    }

    #[test]
    fn test_values_are_not_escaped() {
        let mut body =
            MultipartBody::new([("", ""), ("q\"", "a\r\nb")], no_files(), Some("X")).unwrap();
        assert_eq!(
            body.dump_string(),
            "--X\r\nContent-Disposition: form-data; name=\"\"\r\n\r\n\r\n\
             --X\r\nContent-Disposition: form-data; name=\"q\"\"\r\n\r\na\r\nb\r\n--X--"
        );
    }

    #[test]
    fn test_file_header_block_is_trimmed() {
        assert_eq!(file_headers("X", &[]), "--X\r\n\r\n\r\n");
        assert_eq!(
            file_headers("X", &[("Content-Type".into(), "text/plain \r\n".into())]),
            "--X\r\nContent-Type: text/plain\r\n\r\n"
        );
    }

    #[test]
    fn test_generated_boundary() {
        let a = MultipartBody::new(NO_FIELDS, no_files(), None).unwrap();
        let b = MultipartBody::new(NO_FIELDS, no_files(), Some("")).unwrap();
        assert!(!a.boundary().is_empty());
        assert!(!b.boundary().is_empty());
        assert_ne!(a.boundary(), b.boundary());
        assert_eq!(
            a.content_type(),
            format!("multipart/form-data; boundary={}", a.boundary())
        );
    }

    #[test]
    fn test_unreadable_file_is_rejected_up_front() {
        let mut content = create("gone");
        content.close();
        let result = MultipartBody::new(
            [("name", "bob")],
            [
                text_file("ok", "ok.txt", "fine"),
                boxed(PostFile::new("bad", content, None, vec![])),
            ],
            Some("X"),
        );
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("#1")));
    }

    #[test]
    fn test_unknown_file_size_makes_size_unknown() {
        let file = PostFile::new(
            "f",
            ReaderStream::new(Cursor::new(b"data".to_vec()), None),
            Some("f.txt".into()),
            vec![],
        );
        let mut body = MultipartBody::new(NO_FIELDS, [boxed(file)], Some("X")).unwrap();
        assert_eq!(body.size(), None);
        assert!(body.dump_string().contains("\r\n\r\ndata\r\n--X--"));
    }

    #[test]
    fn test_read_is_repeatable_after_rewind() {
        let mut body = MultipartBody::new(
            [("k", "v")],
            [text_file("f", "f.txt", "content")],
            Some("X"),
        )
        .unwrap();
        let first = body.contents(None).unwrap();
        assert!(body.eof());
        assert_eq!(body.seek(SeekFrom::Start(0)).unwrap(), 0);
        let second = body.contents(None).unwrap();
        assert_eq!(first, second);
        assert_eq!(body.dump(), first);
    }

    #[test]
    fn test_contents_does_not_rewind() {
        let mut body = MultipartBody::new([("k", "v")], no_files(), Some("X")).unwrap();
        assert_eq!(body.contents(Some(3)).unwrap(), b"--X");
        assert_eq!(body.tell().unwrap(), 3);
        let rest = body.contents(None).unwrap();
        assert!(rest.starts_with(b"\r\nContent-Disposition"));
        assert!(rest.ends_with(b"--X--"));
    }

    #[test]
    fn test_dump_swallows_errors() {
        let file = PostFile::new(
            "f",
            ReaderStream::sequential(&b"pipe"[..], None),
            Some("f.txt".into()),
            vec![],
        );
        let mut body = MultipartBody::new(NO_FIELDS, [boxed(file)], Some("X")).unwrap();
        assert!(!body.is_seekable());
        assert!(matches!(
            body.seek(SeekFrom::Start(0)),
            Err(Error::NotSeekable)
        ));
        assert_eq!(body.dump(), b"");
        assert_eq!(body.dump_string(), "");

        body.detach();
        assert!(matches!(body.read(&mut [0u8; 4]), Err(Error::Detached)));
        assert_eq!(body.dump(), b"");
    }

    #[test]
    fn test_metadata_is_absent() {
        let body = MultipartBody::new([("k", "v")], no_files(), Some("X")).unwrap();
        assert!(body.metadata(None).is_none());
        assert!(body.metadata(Some("uri")).is_none());
    }

    struct TrackedStream {
        inner: BytesStream,
        released: Arc<AtomicBool>,
    }

    impl Stream for TrackedStream {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.inner.read(buf)
        }
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.inner.write(buf)
        }
        fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
            self.inner.seek(pos)
        }
        fn tell(&self) -> Result<u64> {
            self.inner.tell()
        }
        fn eof(&self) -> bool {
            self.inner.eof()
        }
        fn size(&self) -> Option<u64> {
            self.inner.size()
        }
        fn is_readable(&self) -> bool {
            self.inner.is_readable()
        }
        fn is_writable(&self) -> bool {
            self.inner.is_writable()
        }
        fn is_seekable(&self) -> bool {
            self.inner.is_seekable()
        }
        fn close(&mut self) {
            self.released.store(true, Ordering::SeqCst);
            self.inner.close()
        }
        fn detach(&mut self) -> Option<Resource> {
            self.inner.detach()
        }
    }

    fn tracked_body(released: &Arc<AtomicBool>) -> MultipartBody {
        let content = TrackedStream {
            inner: create("tracked"),
            released: Arc::clone(released),
        };
        let file = PostFile::new("f", content, Some("t.txt".into()), vec![]);
        MultipartBody::new(NO_FIELDS, [boxed(file)], Some("X")).unwrap()
    }

    #[test]
    fn test_release_reaches_file_streams() {
        let released = Arc::new(AtomicBool::new(false));
        let mut body = tracked_body(&released);
        body.close();
        assert!(released.load(Ordering::SeqCst));

        let released = Arc::new(AtomicBool::new(false));
        let mut body = tracked_body(&released);
        let same: *const MultipartBody = body.detach();
        assert!(std::ptr::eq(same, &body));
        assert!(released.load(Ordering::SeqCst));
        assert!(!body.is_readable());
        assert!(Stream::detach(&mut body).is_none());

        let released = Arc::new(AtomicBool::new(false));
        drop(tracked_body(&released));
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_std_io_adapters() {
        let mut body = MultipartBody::new([("k", "v")], no_files(), Some("X")).unwrap();
        let mut out = Vec::new();
        io::Read::read_to_end(&mut body, &mut out).unwrap();
        assert_eq!(
            out,
            b"--X\r\nContent-Disposition: form-data; name=\"k\"\r\n\r\nv\r\n--X--"
        );
        let pos = io::Seek::seek(&mut body, SeekFrom::End(-5)).unwrap();
        assert_eq!(pos, out.len() as u64 - 5);
        let mut tail = String::new();
        io::Read::read_to_string(&mut body, &mut tail).unwrap();
        assert_eq!(tail, "--X--");
    }

    struct InterruptOnce {
        data: &'static [u8],
        interrupted: bool,
    }

    impl io::Read for InterruptOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            io::Read::read(&mut self.data, buf)
        }
    }

    #[test]
    fn test_read_to_end_survives_interrupted_segment() {
        let content = ReaderStream::sequential(
            InterruptOnce {
                data: b"payload",
                interrupted: false,
            },
            Some(7),
        );
        let file = PostFile::new("f", content, Some("a.bin".into()), vec![]);
        let mut body = MultipartBody::new(NO_FIELDS, [boxed(file)], Some("X")).unwrap();

        let mut out = Vec::new();
        io::Read::read_to_end(&mut body, &mut out).unwrap();
        assert_eq!(
            out,
            b"--X\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.bin\"\r\n\
              Content-Type: application/octet-stream\r\n\r\npayload\r\n--X--"
        );
    }
}
