//! Interface definitions for formstream.
//!
//! This crate provides the stream abstraction that multipart bodies are composed of, along
//! with the file attachment capability the encoder consumes. It defines the core types and
//! traits shared by the `formstream` facade and by any custom stream or attachment
//! implementation.
//!
//! ## Streams
//!
//! Everything readable implements [`Stream`]. Three implementations ship with this crate:
//!
//! - [`BytesStream`], an in-memory literal, usually made through [`create`]
//! - [`ReaderStream`], an adapter over any [`std::io::Read`]
//! - [`FileStream`], a file on disk (requires the `fs` feature)
//!
//! ## Features
//!
//! - `fs`: Enable [`FileStream`] (enabled by default)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

mod error;
pub mod file;
pub mod stream;

pub use error::{Error, Result};
pub use file::{FormFile, Headers};
#[cfg(feature = "fs")]
#[cfg_attr(docsrs, doc(cfg(feature = "fs")))]
pub use stream::FileStream;
pub use stream::{
    create, BodyStream, BoxedStream, BytesStream, Metadata, MetadataValue, ReaderStream,
    Resource, Stream,
};
