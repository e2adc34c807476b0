use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Location of a value inside a tree: the member keys leading to it, array
/// indices in decimal form. The root is the empty path.
///
/// Paths are immutable. `child` builds a new path and leaves the parent
/// untouched, so sibling branches of a traversal never share state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Arc<[String]>,
}

impl Path {
    pub fn root() -> Self {
        Self {
            segments: Arc::from(Vec::new()),
        }
    }

    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(key.into());
        Self {
            segments: segments.into(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Dot-joined rendering used for rule matching, "" for the root
    pub fn joined(&self) -> String {
        self.segments.join(".")
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect::<Vec<_>>().into(),
        }
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.segments.iter())
    }
}
