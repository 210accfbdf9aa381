use std::{borrow::Cow, path::Path};

use formstream_interface::{file::find_header, BoxedStream, FormFile, Headers, Stream};

use crate::MultipartBody;

/// A file attached to a multipart form.
///
/// Unless provided explicitly, `Content-Disposition` and `Content-Type` headers are derived
/// from the field name and the file name.
pub struct PostFile {
    name: Cow<'static, str>,
    filename: Cow<'static, str>,
    headers: Headers,
    content: BoxedStream,
}

impl PostFile {
    /// Creates an attachment for the form field `name`.
    ///
    /// When `filename` is `None`, the `uri` metadata of `content` is used if it refers to a
    /// plain path, and the field name otherwise.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        content: impl Stream + 'static,
        filename: Option<Cow<'static, str>>,
        headers: Headers,
    ) -> Self {
        let name = name.into();
        let filename = filename
            .filter(|f| !f.is_empty())
            .or_else(|| filename_from_uri(&content))
            .unwrap_or_else(|| name.clone());
        let mut file = Self {
            name,
            filename,
            headers,
            content: Box::new(content),
        };
        file.prepare_default_headers();
        file
    }

    /// Opens the file at `path` as the content of form field `name`.
    #[cfg(feature = "fs")]
    #[cfg_attr(docsrs, doc(cfg(feature = "fs")))]
    pub fn open(
        name: impl Into<Cow<'static, str>>,
        path: impl AsRef<Path>,
    ) -> crate::Result<Self> {
        let content = formstream_interface::FileStream::open(path)?;
        Ok(Self::new(name, content, None, Headers::new()))
    }

    /// Attaches a whole multipart body as a single part of another form.
    pub fn nested(name: impl Into<Cow<'static, str>>, body: MultipartBody) -> Self {
        let name = name.into();
        let headers = vec![
            (
                "Content-Disposition".into(),
                format!("form-data; name=\"{name}\"").into(),
            ),
            ("Content-Type".into(), body.content_type().into()),
        ];
        Self::new(name, body, None, headers)
    }

    /// Sets a header, replacing any existing header with the same case-insensitive name.
    pub fn with_header(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// The form field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name announced to the receiver.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn prepare_default_headers(&mut self) {
        if find_header(&self.headers, "Content-Disposition").is_none() {
            let disposition = format!(
                "form-data; name=\"{}\"; filename=\"{}\"",
                self.name,
                basename(&self.filename)
            );
            self.headers.push(("Content-Disposition".into(), disposition.into()));
        }
        if find_header(&self.headers, "Content-Type").is_none() {
            let content_type = mime_guess::from_path(&*self.filename)
                .first()
                .unwrap_or(mime::TEXT_PLAIN);
            self.headers.push(("Content-Type".into(), content_type.to_string().into()));
        }
    }
}

impl FormFile for PostFile {
    fn headers(&self) -> &[(Cow<'static, str>, Cow<'static, str>)] {
        &self.headers
    }

    fn content(&self) -> &dyn Stream {
        &*self.content
    }

    fn into_content(self: Box<Self>) -> BoxedStream {
        self.content
    }
}

impl std::fmt::Debug for PostFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostFile")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("headers", &self.headers)
            .field("size", &self.content.size())
            .finish()
    }
}

fn filename_from_uri(content: &impl Stream) -> Option<Cow<'static, str>> {
    let uri = content.metadata(Some("uri"))?;
    let uri = uri.as_str()?;
    if uri.is_empty() || uri.contains("://") {
        return None;
    }
    Some(uri.to_owned().into())
}

fn basename(filename: &str) -> Cow<'_, str> {
    let base = Path::new(filename)
        .file_name()
        .map(|f| f.to_string_lossy())
        .unwrap_or(Cow::Borrowed(filename));
    const STRIPPED_CHARS: &[char] = &['"', '\\'];
    if base.contains(STRIPPED_CHARS) {
        base.replace(STRIPPED_CHARS, "_").into()
    } else {
        base
    }
}
