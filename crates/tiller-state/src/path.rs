//! Access paths into a controlled state tree.
//!
//! A path is an ordered sequence of field names leading from the root of the
//! state tree to a node. Paths have two textual encodings: dot-separated
//! (`model.head.activation`) for lookups, and slash-separated
//! (`model/head/activation`) for route URLs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A path into a controlled state tree.
///
/// Paths address named fields only: the controlled shape is a tree of
/// composites (named field collections) and leaves, so every segment is a
/// field name. Sequences are leaf values and are never indexed into.
///
/// # Examples
///
/// ```
/// use tiller_state::Path;
///
/// let path = Path::root().key("model").key("head").key("activation");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "model.head.activation");
/// assert_eq!(path.route_path(), "model/head/activation");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<String>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from a vector of segments.
    #[inline]
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a dot-separated path string.
    ///
    /// Empty segments are ignored, so `""` parses to the root path and
    /// `"a..b"` parses the same as `"a.b"`.
    pub fn parse(path: &str) -> Self {
        let mut result = Path::root();
        for segment in path.split('.') {
            if !segment.is_empty() {
                result.push(segment);
            }
        }
        result
    }

    /// Append a field-name segment and return self (builder pattern).
    #[inline]
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.0.push(name.into());
        self
    }

    /// Push a field-name segment onto the path (mutating).
    #[inline]
    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    /// Pop the last segment from the path.
    #[inline]
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Get the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of segments in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the last segment.
    #[inline]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Get the parent path (path without the last segment).
    #[inline]
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get the path consisting of the first `len` segments.
    #[inline]
    pub fn prefix(&self, len: usize) -> Path {
        Path(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Check if this path is a prefix of another path.
    ///
    /// A path is a prefix of itself.
    #[inline]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Render the slash-separated route form (`model/head/activation`).
    ///
    /// The root path renders as the empty string.
    pub fn route_path(&self) -> String {
        self.0.join("/")
    }

    /// Iterate over the segments.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "$")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Construct a [`Path`] from a sequence of field names.
///
/// # Examples
///
/// ```
/// use tiller_state::path;
///
/// let p = path!("checkpoints", "save_dir");
/// assert_eq!(p.to_string(), "checkpoints.save_dir");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($seg);
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_construction() {
        let path = Path::root().key("model").key("head");
        assert_eq!(path.len(), 2);
        assert_eq!(path.segments(), &["model".to_string(), "head".to_string()]);
    }

    #[test]
    fn test_path_display() {
        let path = path!("model", "head", "activation");
        assert_eq!(path.to_string(), "model.head.activation");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn test_path_parse() {
        let path = Path::parse("checkpoints.save_dir");
        assert_eq!(path, path!("checkpoints", "save_dir"));
        assert!(Path::parse("").is_empty());
        assert_eq!(Path::parse("a..b"), path!("a", "b"));
    }

    #[test]
    fn test_route_path() {
        assert_eq!(path!("model", "head").route_path(), "model/head");
        assert_eq!(Path::root().route_path(), "");
    }

    #[test]
    fn test_parent_and_prefix() {
        let path = path!("a", "b", "c");
        assert_eq!(path.parent().unwrap(), path!("a", "b"));
        assert_eq!(path.prefix(1), path!("a"));
        assert_eq!(path.prefix(10), path);
        assert!(Path::root().parent().is_none());
    }

    #[test]
    fn test_is_prefix_of() {
        let parent = path!("model");
        let child = path!("model", "head");
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
        assert!(parent.is_prefix_of(&parent));
    }

    #[test]
    fn test_path_serde() {
        let path = path!("model", "head");
        let json = serde_json::to_string(&path).unwrap();
        let parsed: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(path, parsed);
    }
}
