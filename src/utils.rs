//! Helpers for draining and copying streams.

use formstream_interface::{stream::copy_chunks, Stream};

use crate::Result;

/// Reads `stream` from its current position into a buffer.
///
/// Stops at the end of the stream, or once `max_len` bytes have been collected.
pub fn copy_to_bytes(
    stream: &mut (impl Stream + ?Sized),
    max_len: Option<usize>,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    copy_chunks(stream, max_len, |chunk| {
        buffer.extend_from_slice(chunk);
        Ok(())
    })?;
    Ok(buffer)
}

/// Like [`copy_to_bytes`], decoding the result as UTF-8 and replacing invalid sequences.
pub fn copy_to_string(
    stream: &mut (impl Stream + ?Sized),
    max_len: Option<usize>,
) -> Result<String> {
    let bytes = copy_to_bytes(stream, max_len)?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

/// Copies `src` into `dst` until `src` is drained or `max_len` bytes were copied.
///
/// Returns the number of bytes copied.
pub fn copy_to_stream(
    src: &mut (impl Stream + ?Sized),
    dst: &mut (impl Stream + ?Sized),
    max_len: Option<usize>,
) -> Result<u64> {
    let mut copied = 0u64;
    copy_chunks(src, max_len, |mut chunk| {
        while !chunk.is_empty() {
            let written = dst.write(chunk)?;
            if written == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }
            chunk = &chunk[written..];
            copied += written as u64;
        }
        Ok(())
    })?;
    Ok(copied)
}
