//! Streaming `multipart/form-data` bodies built out of composable streams.
//!
//! ## Overview
//!
//! formstream encodes form fields and file attachments into a single readable, seekable
//! stream without buffering the files in memory. A body is assembled once from its fields
//! and files; after that it behaves like any other [`Stream`]: it reports its total size when
//! every part has a known size, reads sequentially across part boundaries, can be rewound,
//! and releases every file handle it owns when closed, detached or dropped.
//!
//! ## The `formstream` crate
//!
//! The `formstream` crate provides the composite [`AppendStream`], the [`PostFile`]
//! attachment and the [`MultipartBody`] encoder. The stream interface itself, along with the
//! bundled literal, reader and file streams, lives in [`formstream-interface`] and is
//! re-exported here.
//!
//! ## Usage
//!
//! ```no_run
//! use formstream::{MultipartBody, PostFile, Stream};
//!
//! let avatar = PostFile::open("avatar", "me.png")?;
//! let mut body = MultipartBody::new(
//!     [("user", "bob"), ("lang", "en")],
//!     [Box::new(avatar) as Box<dyn formstream::FormFile>],
//!     None,
//! )?;
//! println!("Content-Type: {}", body.content_type());
//! println!("Content-Length: {:?}", body.size());
//! let encoded = body.contents(None)?;
//! # Ok::<_, formstream::Error>(())
//! ```
//!
//! Bodies also implement [`std::io::Read`] and [`std::io::Seek`], so they can be handed to
//! anything that consumes std readers.
//!
//! ## Features
//!
//! - `fs`: Enable file-backed streams and [`PostFile::open`] (enabled by default)
//!
//! [`formstream-interface`]: https://docs.rs/formstream-interface

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(missing_docs)]

mod append;
pub mod multipart;
mod post_file;
pub mod utils;

pub use append::AppendStream;
#[cfg(feature = "fs")]
#[cfg_attr(docsrs, doc(cfg(feature = "fs")))]
pub use formstream_interface::FileStream;
pub use formstream_interface::{
    create, BodyStream, BoxedStream, BytesStream, Error, FormFile, Headers, Metadata,
    MetadataValue, ReaderStream, Resource, Result, Stream,
};
pub use multipart::MultipartBody;
pub use post_file::PostFile;
