use std::borrow::Borrow;
use std::fmt;

/// A canonical tag identifier.
///
/// Canonical names are upper-case. Tags are produced by the schema when a
/// key resolves; keys that do not resolve are carried as pass-through tags
/// built from the upper-cased key itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: &str) -> Self {
        Self(fold_key(name))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Case folding applied to every key before lookup.
pub(crate) fn fold_key(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}
