//! [`Keymap`] — the optional map from key-paths to source [`Location`]s that
//! the loader populates when a caller asks for it.
//!
//! A key-path addresses a node by *value* (a sequence of
//! [`KeyPathSegment`]s), never by a reference into the tree, so the keymap
//! can be handed around and cloned independently of the `Value` it describes
//! — see the crate-level docs on why key-paths replace parent pointers here.

use std::collections::HashMap;

use crate::value::{KeyPath, KeyPathSegment};

/// The source position of one node: its value token, and — for mapping
/// entries — its key token.
///
/// `raw_key` records the key text exactly as it appeared in the source,
/// before any caller-supplied normalization ran. It is `None` for sequence
/// entries, the root, and inline-only documents with no mapping entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// 0-based line number of the value token.
    pub line: usize,
    /// 0-based column of the value token.
    pub column: usize,
    /// 0-based line number of the key token, for mapping entries.
    pub key_line: Option<usize>,
    /// 0-based column of the key token, for mapping entries.
    pub key_column: Option<usize>,
    /// The key exactly as written in the source, before normalization.
    pub raw_key: Option<String>,
}

/// A mapping from key-paths to [`Location`]s, covering every node reachable
/// from the root (including interior nodes) for one parse.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    entries: HashMap<KeyPath, Location>,
}

impl Keymap {
    pub fn new() -> Self {
        Keymap { entries: HashMap::new() }
    }

    pub(crate) fn insert(&mut self, path: KeyPath, location: Location) {
        self.entries.insert(path, location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a key-path to its recorded [`Location`].
    pub fn location(&self, path: &[KeyPathSegment]) -> Option<&Location> {
        self.entries.get(path)
    }

    /// Resolve a key-path to the inclusive `(first, last)` source line range
    /// spanned by that node: the lowest key/value line recorded for the
    /// node or any of its descendants, through the highest.
    pub fn line_range(&self, path: &[KeyPathSegment]) -> Option<(usize, usize)> {
        let root = self.entries.get(path)?;
        let mut first = root.key_line.unwrap_or(root.line).min(root.line);
        let mut last = first.max(root.line);
        for (candidate, loc) in &self.entries {
            if candidate.len() < path.len() || &candidate[..path.len()] != path {
                continue;
            }
            let lo = loc.key_line.unwrap_or(loc.line).min(loc.line);
            let hi = loc.line.max(loc.key_line.unwrap_or(loc.line));
            first = first.min(lo);
            last = last.max(hi);
        }
        Some((first, last))
    }

    /// Map a key-path built from normalized/deduplicated keys back to the
    /// raw keys recorded in the source. Sequence indices pass through
    /// unchanged; a segment with no recorded `raw_key` (or no entry at all)
    /// is carried over as-is.
    pub fn raw_path(&self, path: &[KeyPathSegment]) -> KeyPath {
        let mut out = Vec::with_capacity(path.len());
        for i in 0..path.len() {
            let prefix = &path[..=i];
            match &path[i] {
                KeyPathSegment::Index(n) => out.push(KeyPathSegment::Index(*n)),
                KeyPathSegment::Key(k) => {
                    let raw = self
                        .entries
                        .get(prefix)
                        .and_then(|loc| loc.raw_key.clone())
                        .unwrap_or_else(|| k.clone());
                    out.push(KeyPathSegment::Key(raw));
                }
            }
        }
        out
    }

    /// Iterate over every `(key-path, Location)` pair recorded for this parse.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyPath, &Location)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize, column: usize) -> Location {
        Location { line, column, key_line: None, key_column: None, raw_key: None }
    }

    #[test]
    fn location_round_trips_through_insert() {
        let mut km = Keymap::new();
        let path = vec![KeyPathSegment::Key("a".to_string()), KeyPathSegment::Index(1)];
        km.insert(path.clone(), loc(3, 4));
        assert_eq!(km.location(&path), Some(&loc(3, 4)));
        assert_eq!(km.location(&[KeyPathSegment::Key("b".to_string())]), None);
    }

    #[test]
    fn raw_path_recovers_original_key_text() {
        let mut km = Keymap::new();
        let path = vec![KeyPathSegment::Key("name".to_string())];
        km.insert(
            path.clone(),
            Location {
                line: 0,
                column: 6,
                key_line: Some(0),
                key_column: Some(0),
                raw_key: Some("Name".to_string()),
            },
        );
        assert_eq!(km.raw_path(&path), vec![KeyPathSegment::Key("Name".to_string())]);
    }

    #[test]
    fn raw_path_passes_through_unknown_segments() {
        let km = Keymap::new();
        let path = vec![KeyPathSegment::Key("x".to_string()), KeyPathSegment::Index(2)];
        assert_eq!(km.raw_path(&path), path);
    }

    #[test]
    fn line_range_covers_descendants() {
        let mut km = Keymap::new();
        km.insert(vec![], loc(0, 0));
        km.insert(vec![KeyPathSegment::Key("a".into())], loc(0, 3));
        km.insert(vec![KeyPathSegment::Key("a".into()), KeyPathSegment::Index(0)], loc(1, 4));
        km.insert(vec![KeyPathSegment::Key("a".into()), KeyPathSegment::Index(1)], loc(2, 4));
        assert_eq!(km.line_range(&[KeyPathSegment::Key("a".into())]), Some((0, 2)));
    }
}
