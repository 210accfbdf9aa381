//! The file attachment capability consumed by multipart encoders.

use std::borrow::Cow;

use crate::stream::{BoxedStream, Stream};

/// An ordered list of header name/value pairs.
pub type Headers = Vec<(Cow<'static, str>, Cow<'static, str>)>;

/// A file that can be attached to a multipart body.
///
/// The encoder emits [`FormFile::headers`] verbatim, in order, ahead of the content and
/// then takes ownership of the content stream through [`FormFile::into_content`].
pub trait FormFile: Send {
    /// Headers describing the part, such as `Content-Disposition` and `Content-Type`.
    fn headers(&self) -> &[(Cow<'static, str>, Cow<'static, str>)];

    /// The content stream, for inspection before the file is consumed.
    fn content(&self) -> &dyn Stream;

    /// Consumes the attachment, yielding its content stream.
    fn into_content(self: Box<Self>) -> BoxedStream;
}

/// Looks up a header value by case-insensitive name.
pub fn find_header<'a>(
    headers: &'a [(Cow<'static, str>, Cow<'static, str>)],
    name: &str,
) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_ref())
}
