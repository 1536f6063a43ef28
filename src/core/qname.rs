//! Qualified names
//!
//! Element and attribute names as seen by the validator. DTD matching uses
//! the raw name; the namespace URI is only consulted by wildcard leaves.

use memchr::memchr;
use std::fmt;

/// A qualified name: raw form plus its prefix/local split
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QName {
    /// Name exactly as written (`prefix:local` or `local`)
    pub raw: String,
    /// Namespace prefix (before colon), if any
    pub prefix: Option<String>,
    /// Local name (after colon, if prefixed)
    pub local: String,
    /// Bound namespace URI, when the caller performs namespace binding
    pub uri: Option<String>,
}

impl QName {
    /// Build a QName from its raw form, splitting at the first colon
    pub fn new(raw: &str) -> Self {
        let (prefix, local) = split_name(raw);
        QName {
            raw: raw.to_string(),
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            uri: None,
        }
    }

    /// Build an unsplit QName: local part equals the raw name
    pub fn unprefixed(raw: &str) -> Self {
        QName {
            raw: raw.to_string(),
            prefix: None,
            local: raw.to_string(),
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for QName {
    fn from(raw: &str) -> Self {
        QName::new(raw)
    }
}

/// Split a name into prefix and local name at the colon
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    if let Some(colon_pos) = memchr(b':', name.as_bytes()) {
        (Some(&name[..colon_pos]), &name[colon_pos + 1..])
    } else {
        (None, name)
    }
}
