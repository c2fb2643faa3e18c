use std::fmt;

/// A segment of a dot-path.
///
/// Paths are split on `.`; the segment kind only records how the segment
/// *looks*. Whether `3` is a list index or a mapping key depends on the
/// container it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key
    ///
    /// # Examples
    /// - `name` → `Field("name")`
    /// - `user.email` → `[Field("user"), Field("email")]`
    Field(String),

    /// Non-negative integer segment
    ///
    /// # Examples
    /// - `items.0` → `[Field("items"), Index(0)]`
    Index(usize),

    /// The literal `-` segment
    ///
    /// Addresses one past the last element when adding, and the last
    /// element everywhere else.
    End,
}

impl PathSegment {
    fn parse(segment: &str) -> Self {
        if segment == "-" {
            return PathSegment::End;
        }
        if !segment.is_empty()
            && segment.bytes().all(|b| b.is_ascii_digit())
            && let Ok(index) = segment.parse::<usize>()
        {
            return PathSegment::Index(index);
        }
        PathSegment::Field(segment.to_string())
    }

    /// The segment as a mapping key.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Field(name) => name.clone(),
            PathSegment::Index(n) => n.to_string(),
            PathSegment::End => "-".to_string(),
        }
    }

    /// True for segments that address list slots (`Index` and `End`).
    pub fn is_positional(&self) -> bool {
        matches!(self, PathSegment::Index(_) | PathSegment::End)
    }

    /// Resolve the segment to an existing position in a list of `len`
    /// elements. `End` resolves to the last element.
    pub fn position(&self, len: usize) -> Option<usize> {
        match self {
            PathSegment::Index(n) if *n < len => Some(*n),
            PathSegment::End if len > 0 => Some(len - 1),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{name}"),
            PathSegment::Index(n) => write!(f, "{n}"),
            PathSegment::End => write!(f, "-"),
        }
    }
}

/// A parsed dot-path.
///
/// The empty string is the root path with no segments.
///
/// # Examples
///
/// ```
/// use catalog_core::path::{Path, PathSegment};
///
/// let path = Path::parse("geocode.1.value");
/// assert_eq!(
///     path.segments(),
///     &[
///         PathSegment::Field("geocode".into()),
///         PathSegment::Index(1),
///         PathSegment::Field("value".into()),
///     ]
/// );
///
/// assert_eq!(Path::from_pointer("/list/-").to_string(), "list.-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Path::root();
        }
        Path {
            segments: path.split('.').map(PathSegment::parse).collect(),
        }
    }

    /// Translate a `/`-delimited pointer (`/a/b/0`) into a path.
    ///
    /// The leading `/` is stripped and `~1` / `~0` escapes are decoded.
    pub fn from_pointer(pointer: &str) -> Self {
        let trimmed = pointer.strip_prefix('/').unwrap_or(pointer);
        if trimmed.is_empty() {
            return Path::root();
        }
        Path {
            segments: trimmed
                .split('/')
                .map(|s| PathSegment::parse(&s.replace("~1", "/").replace("~0", "~")))
                .collect(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
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

    pub fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Split into the parent path and the last segment.
    ///
    /// Returns `None` for the root path.
    pub fn split_leaf(&self) -> Option<(Path, &PathSegment)> {
        let (leaf, parent) = self.segments.split_last()?;
        Some((
            Path {
                segments: parent.to_vec(),
            },
            leaf,
        ))
    }

    /// A copy of this path with the leaf replaced.
    pub fn with_leaf(&self, leaf: PathSegment) -> Path {
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => *last = leaf,
            None => segments.push(leaf),
        }
        Path { segments }
    }

    /// The first `len` segments.
    pub fn head(&self, len: usize) -> Path {
        Path {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    pub fn join(&self, segment: PathSegment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Path::parse(path)
    }
}

/// Prefix every selector of a filter with `prefix.`.
pub fn prefixed(prefix: Option<&str>, path: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}.{path}"),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_end_segments() {
        let path = Path::parse("list.-");
        assert_eq!(path.leaf(), Some(&PathSegment::End));

        let path = Path::parse("a.10.b");
        assert_eq!(path.segments()[1], PathSegment::Index(10));
    }

    #[test]
    fn split_leaf_of_single_segment_is_root_parent() {
        let path = Path::parse("name");
        let (parent, leaf) = path.split_leaf().unwrap();
        assert!(parent.is_root());
        assert_eq!(leaf, &PathSegment::Field("name".into()));
        assert!(Path::root().split_leaf().is_none());
    }

    #[test]
    fn pointer_translation() {
        assert_eq!(Path::from_pointer("/a/b/0").to_string(), "a.b.0");
        assert_eq!(Path::from_pointer("/a~1b/c~0d").segments()[0], PathSegment::Field("a/b".into()));
        assert!(Path::from_pointer("/").is_root());
        assert!(Path::from_pointer("").is_root());
    }

    #[test]
    fn end_resolves_to_last_position() {
        assert_eq!(PathSegment::End.position(3), Some(2));
        assert_eq!(PathSegment::End.position(0), None);
        assert_eq!(PathSegment::Index(3).position(3), None);
    }

    #[test]
    fn prefix_is_applied_with_a_dot() {
        assert_eq!(prefixed(Some("Doc"), "a.b"), "Doc.a.b");
        assert_eq!(prefixed(None, "a.b"), "a.b");
        assert_eq!(prefixed(Some(""), "a"), "a");
    }
}
