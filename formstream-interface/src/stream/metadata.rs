use std::{borrow::Cow, collections::BTreeMap};

/// A single metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    /// A flag such as `seekable`.
    Bool(bool),
    /// A textual entry such as `uri` or `mode`.
    Str(Cow<'static, str>),
}

/// The result of a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    /// The value stored under the requested key.
    Value(MetadataValue),
    /// Every entry the stream knows about.
    All(BTreeMap<&'static str, MetadataValue>),
}

impl Metadata {
    /// Builds the lookup result for `key` out of the full entry map.
    pub fn lookup(
        mut entries: BTreeMap<&'static str, MetadataValue>,
        key: Option<&str>,
    ) -> Option<Self> {
        match key {
            None => Some(Self::All(entries)),
            Some(key) => entries.remove(key).map(Self::Value),
        }
    }

    /// Returns the textual value, if this is a single string entry.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(MetadataValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}
